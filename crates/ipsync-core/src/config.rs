//! Configuration for an ipsync run.
//!
//! All configuration comes from environment-style key/value inputs. Loading
//! goes through an injectable lookup function so tests never have to mutate
//! the process environment.

use crate::error::{Error, Result};

/// Required: bearer credential for the zone API.
pub const ENV_API_TOKEN: &str = "CF_API_TOKEN";
/// Required: target DNS zone id.
pub const ENV_ZONE_ID: &str = "CF_ZONE_ID";
/// Required: default record name for all three slots.
pub const ENV_HOSTNAME: &str = "HOSTNAME";
/// Optional: record name override for the internal IPv4 slot.
pub const ENV_INTERNAL_DOMAIN: &str = "INTERNAL_DOMAIN";
/// Optional: record name override for the external IPv4 slot.
pub const ENV_EXTERNAL_DOMAIN: &str = "EXTERNAL_DOMAIN";
/// Optional: record name override for the external IPv6 slot.
pub const ENV_IPV6_DOMAIN: &str = "IPV6_DOMAIN";
/// Optional: proxy records through the provider's edge (default false).
pub const ENV_PROXIED: &str = "CF_PROXIED";
/// Optional: log intended mutations instead of issuing them (default false).
pub const ENV_DRY_RUN: &str = "DRY_RUN";

/// Run configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer credential for the zone API
    pub api_token: String,
    /// Target DNS zone id
    pub zone_id: String,
    /// Default record name for all three slots
    pub hostname: String,
    /// Record name override for the internal IPv4 slot
    pub internal_domain: Option<String>,
    /// Record name override for the external IPv4 slot
    pub external_domain: Option<String>,
    /// Record name override for the external IPv6 slot
    pub ipv6_domain: Option<String>,
    /// Whether records are proxied through the provider's edge
    pub proxied: bool,
    /// Whether mutations are logged instead of issued
    pub dry_run: bool,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value lookup.
    ///
    /// Empty values count as unset, so `FOO=` behaves like an absent `FOO`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                Error::config(format!("required environment variable {key} is not set"))
            })
        };

        Ok(Self {
            api_token: required(ENV_API_TOKEN)?,
            zone_id: required(ENV_ZONE_ID)?,
            hostname: required(ENV_HOSTNAME)?,
            internal_domain: get(ENV_INTERNAL_DOMAIN),
            external_domain: get(ENV_EXTERNAL_DOMAIN),
            ipv6_domain: get(ENV_IPV6_DOMAIN),
            proxied: parse_flag(get(ENV_PROXIED)),
            dry_run: parse_flag(get(ENV_DRY_RUN)),
        })
    }

    /// Validate the configuration
    ///
    /// Checks that the token is not an obvious placeholder and that every
    /// slot's record name has a valid DNS shape.
    pub fn validate(&self) -> Result<()> {
        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
            || token_lower == "token"
        {
            return Err(Error::config(format!(
                "{ENV_API_TOKEN} appears to be a placeholder; \
                use an actual API token from your DNS provider"
            )));
        }

        for name in [
            self.internal_record_name(),
            self.external_record_name(),
            self.ipv6_record_name(),
        ] {
            validate_record_name(name)?;
        }

        Ok(())
    }

    /// Record name for the internal IPv4 slot.
    pub fn internal_record_name(&self) -> &str {
        self.internal_domain.as_deref().unwrap_or(&self.hostname)
    }

    /// Record name for the external IPv4 slot.
    pub fn external_record_name(&self) -> &str {
        self.external_domain.as_deref().unwrap_or(&self.hostname)
    }

    /// Record name for the external IPv6 slot.
    pub fn ipv6_record_name(&self) -> &str {
        self.ipv6_domain.as_deref().unwrap_or(&self.hostname)
    }
}

fn parse_flag(value: Option<String>) -> bool {
    value.is_some_and(|v| v.to_lowercase() == "true")
}

/// Validate that a string is a valid DNS record name.
///
/// Basic domain name validation per RFC 1035: length limits, label charset,
/// and hyphen placement. Not comprehensive, but catches common mistakes
/// before they turn into confusing provider errors.
fn validate_record_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::config("record name cannot be empty"));
    }

    if name.len() > 253 {
        return Err(Error::config(format!(
            "record name too long: {} chars (max 253): {}",
            name.len(),
            name
        )));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!(
                "record name has an empty label: '{name}'"
            )));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "record name label too long: {} chars (max 63): '{label}'",
                label.len()
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::config(format!(
                "record name label contains invalid characters: '{label}' \
                (valid: ASCII alphanumeric and hyphen)"
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "record name label cannot start or end with a hyphen: '{label}'"
            )));
        }
    }

    Ok(())
}
