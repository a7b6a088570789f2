// # Cloudflare Zone Client
//
// `ZoneClient` implementation over the Cloudflare API v4.
//
// - One zone per client, fixed at construction
// - Bearer-token authorization; the token never appears in logs or Debug
//   output
// - HTTP timeout on every request (30 seconds)
// - Success is read from the response payload's `success` flag, not merely
//   the HTTP status
// - Every operation fails closed: transport and provider errors are logged
//   and reported as `false`/`None`
// - ❌ NO retry logic (a scheduler re-invoking the run provides eventual
//   retry)
// - ❌ NO caching (record ids are looked up fresh every run)
// - Dry-run mode performs lookups normally but only logs intended mutations
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Client construction fails fast on an empty token
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};

use ipsync_core::record::{RecordKind, RemoteRecord};
use ipsync_core::traits::ZoneClient;
use ipsync_core::{Error, Result};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// HTTP timeout for API requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TTL for managed records; kept short since dynamic addresses change often.
const RECORD_TTL: u32 = 120;

/// Body shape of a record-listing response.
///
/// `result` is null (not an empty array) on provider-side failures.
#[derive(Debug, Deserialize)]
struct ListResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    #[serde(default)]
    result: Option<Vec<RemoteRecord>>,
}

/// Body shape of a create/update/delete response.
#[derive(Debug, Deserialize)]
struct MutationResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// Cloudflare zone client
///
/// # Dry-Run Mode
///
/// When constructed via [`CloudflareZone::dry_run`], the client performs all
/// GET requests (record lookups) but logs intended mutations instead of
/// issuing them, reporting them as successful. This allows safe testing
/// against a live zone without changing it.
pub struct CloudflareZone {
    /// ⚠️ NEVER log this value
    api_token: String,
    zone_id: String,
    base_url: String,
    client: reqwest::Client,
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareZone")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareZone {
    /// Create a client for one zone.
    ///
    /// # Parameters
    ///
    /// - `api_token`: API token with Zone:DNS:Edit permissions
    /// - `zone_id`: id of the zone every operation targets
    pub fn new(api_token: impl Into<String>, zone_id: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_token, zone_id, CLOUDFLARE_API_BASE)
    }

    /// Create a client against an alternate API base URL.
    ///
    /// Used by tests to point the client at a mock server.
    pub fn with_base_url(
        api_token: impl Into<String>,
        zone_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let zone_id = zone_id.into();
        if zone_id.is_empty() {
            return Err(Error::config("Cloudflare zone id cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_token,
            zone_id,
            base_url: base_url.into(),
            client,
            dry_run: false,
        })
    }

    /// Switch the client into dry-run mode.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, self.zone_id)
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.base_url, self.zone_id, id)
    }

    fn record_body(
        name: &str,
        kind: RecordKind,
        content: IpAddr,
        proxied: bool,
    ) -> serde_json::Value {
        serde_json::json!({
            "type": kind.as_str(),
            "name": name,
            "content": content.to_string(),
            "ttl": RECORD_TTL,
            "proxied": proxied,
        })
    }

    async fn try_find(&self, name: &str, kind: RecordKind) -> Result<Option<RemoteRecord>> {
        let response = self
            .client
            .get(self.records_url())
            .query(&[("name", name), ("type", kind.as_str())])
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::http(format!("record lookup request failed: {e}")))?;

        let body: ListResponse = parse_body(response, "record lookup").await?;

        if !body.success {
            return Err(provider_error("record lookup", &body.errors));
        }

        Ok(body.result.unwrap_or_default().into_iter().next())
    }

    async fn try_mutate(&self, request: reqwest::RequestBuilder, what: &str) -> Result<()> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::http(format!("{what} request failed: {e}")))?;

        let body: MutationResponse = parse_body(response, what).await?;

        if !body.success {
            return Err(provider_error(what, &body.errors));
        }

        Ok(())
    }
}

/// Read and decode a response body; transport faults and undecodable bodies
/// are both errors, whatever the HTTP status said.
async fn parse_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<T> {
    let text = response
        .text()
        .await
        .map_err(|e| Error::http(format!("failed to read {what} response: {e}")))?;

    Ok(serde_json::from_str(&text)?)
}

fn provider_error(what: &str, errors: &[serde_json::Value]) -> Error {
    Error::provider(
        "cloudflare",
        format!(
            "{what} failed: {}",
            serde_json::to_string(errors).unwrap_or_default()
        ),
    )
}

#[async_trait]
impl ZoneClient for CloudflareZone {
    async fn find_record_id(&self, name: &str, kind: RecordKind) -> Option<String> {
        match self.try_find(name, kind).await {
            Ok(Some(record)) => {
                debug!("found record id {} for {} ({})", record.id, name, kind);
                Some(record.id)
            }
            Ok(None) => {
                debug!("no {} record found for {}", kind, name);
                None
            }
            Err(e) => {
                // A failed lookup is deliberately indistinguishable from "no
                // record": callers treat both as nothing to update.
                error!("record lookup for {} ({}) failed: {}", name, kind, e);
                None
            }
        }
    }

    async fn create_record(
        &self,
        name: &str,
        kind: RecordKind,
        content: IpAddr,
        proxied: bool,
    ) -> bool {
        if self.dry_run {
            info!("[dry-run] would create {} record for {} -> {}", kind, name, content);
            return true;
        }

        let body = Self::record_body(name, kind, content, proxied);
        let request = self.client.post(self.records_url()).json(&body);

        match self.try_mutate(request, "record create").await {
            Ok(()) => {
                info!("created {} record for {} -> {}", kind, name, content);
                true
            }
            Err(e) => {
                error!("failed to create {} record for {}: {}", kind, name, e);
                false
            }
        }
    }

    async fn update_record(
        &self,
        id: &str,
        name: &str,
        kind: RecordKind,
        content: IpAddr,
        proxied: bool,
    ) -> bool {
        if self.dry_run {
            info!("[dry-run] would update {} record for {} -> {}", kind, name, content);
            return true;
        }

        let body = Self::record_body(name, kind, content, proxied);
        let request = self.client.put(self.record_url(id)).json(&body);

        match self.try_mutate(request, "record update").await {
            Ok(()) => {
                info!("updated {} record for {} -> {}", kind, name, content);
                true
            }
            Err(e) => {
                error!("failed to update {} record for {}: {}", kind, name, e);
                false
            }
        }
    }

    async fn delete_record(&self, id: &str, name: &str, kind: RecordKind) -> bool {
        if self.dry_run {
            info!("[dry-run] would delete {} record for {}", kind, name);
            return true;
        }

        let request = self.client.delete(self.record_url(id));

        match self.try_mutate(request, "record delete").await {
            Ok(()) => {
                info!("deleted {} record for {}", kind, name);
                true
            }
            Err(e) => {
                error!("failed to delete {} record for {}: {}", kind, name, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    use ipsync_core::traits::Action;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "kLbs8PGjkhGWgXKDvCP1GTTHNTxiW8JJ3VdrNFeA";
    const ZONE: &str = "023e105f4ecef8ad9ca31a8372d0c353";

    fn client(server: &MockServer) -> CloudflareZone {
        CloudflareZone::with_base_url(TOKEN, ZONE, server.uri()).unwrap()
    }

    fn addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(203, 0, 113, 1))
    }

    fn list_body(records: serde_json::Value) -> serde_json::Value {
        serde_json::json!({ "success": true, "errors": [], "result": records })
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(CloudflareZone::new("", ZONE).is_err());
    }

    #[test]
    fn empty_zone_id_is_rejected() {
        assert!(CloudflareZone::new(TOKEN, "").is_err());
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let zone = CloudflareZone::new(TOKEN, ZONE).unwrap();

        let debug = format!("{:?}", zone);
        assert!(!debug.contains(TOKEN));
        assert!(debug.contains("CloudflareZone"));
        assert!(debug.contains(ZONE));
    }

    #[tokio::test]
    async fn find_record_id_returns_the_first_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/zones/{ZONE}/dns_records")))
            .and(query_param("name", "example.com"))
            .and(query_param("type", "A"))
            .and(header("Authorization", format!("Bearer {TOKEN}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(serde_json::json!([
                {"id": "372e67954025e0ba6aaa6d586b9e0b59", "type": "A", "name": "example.com", "content": "203.0.113.1"},
                {"id": "372e67954025e0ba6aaa6d586b9e0b60", "type": "A", "name": "example.com", "content": "203.0.113.2"}
            ]))))
            .mount(&server)
            .await;

        let zone = client(&server);
        let id = zone.find_record_id("example.com", RecordKind::A).await;

        assert_eq!(id.as_deref(), Some("372e67954025e0ba6aaa6d586b9e0b59"));
    }

    #[tokio::test]
    async fn find_record_id_is_absent_when_nothing_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/zones/{ZONE}/dns_records")))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(serde_json::json!([]))))
            .mount(&server)
            .await;

        let zone = client(&server);
        assert_eq!(zone.find_record_id("example.com", RecordKind::A).await, None);
    }

    #[tokio::test]
    async fn find_record_id_is_absent_when_the_provider_reports_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/zones/{ZONE}/dns_records")))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "success": false,
                "errors": [{"code": 10001, "message": "Unable to authenticate request"}],
                "result": null
            })))
            .mount(&server)
            .await;

        let zone = client(&server);
        assert_eq!(zone.find_record_id("example.com", RecordKind::A).await, None);
    }

    #[tokio::test]
    async fn find_record_id_is_absent_when_the_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/zones/{ZONE}/dns_records")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let zone = client(&server);
        assert_eq!(zone.find_record_id("example.com", RecordKind::A).await, None);
    }

    #[tokio::test]
    async fn create_record_sends_the_short_dynamic_ttl() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/zones/{ZONE}/dns_records")))
            .and(header("Authorization", format!("Bearer {TOKEN}")))
            .and(body_partial_json(serde_json::json!({
                "type": "A",
                "name": "example.com",
                "content": "203.0.113.1",
                "ttl": 120,
                "proxied": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "errors": [],
                "result": {"id": "372e67954025e0ba6aaa6d586b9e0b59"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zone = client(&server);
        assert!(zone.create_record("example.com", RecordKind::A, addr(), false).await);
    }

    #[tokio::test]
    async fn create_record_fails_closed_on_a_provider_error() {
        let server = MockServer::start().await;
        // HTTP 200 with success:false must still count as failure.
        Mock::given(method("POST"))
            .and(path(format!("/zones/{ZONE}/dns_records")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "errors": [{"code": 81058, "message": "record already exists"}],
                "result": null
            })))
            .mount(&server)
            .await;

        let zone = client(&server);
        assert!(!zone.create_record("example.com", RecordKind::A, addr(), false).await);
    }

    #[tokio::test]
    async fn update_record_targets_the_record_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(format!(
                "/zones/{ZONE}/dns_records/372e67954025e0ba6aaa6d586b9e0b59"
            )))
            .and(body_partial_json(serde_json::json!({
                "type": "AAAA",
                "name": "example.com",
                "content": "2001:db8::1",
                "ttl": 120
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "errors": [], "result": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zone = client(&server);
        let updated = zone
            .update_record(
                "372e67954025e0ba6aaa6d586b9e0b59",
                "example.com",
                RecordKind::Aaaa,
                "2001:db8::1".parse().unwrap(),
                false,
            )
            .await;

        assert!(updated);
    }

    #[tokio::test]
    async fn delete_record_targets_the_record_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!(
                "/zones/{ZONE}/dns_records/372e67954025e0ba6aaa6d586b9e0b59"
            )))
            .and(header("Authorization", format!("Bearer {TOKEN}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "errors": [], "result": {"id": "372e67954025e0ba6aaa6d586b9e0b59"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zone = client(&server);
        let deleted = zone
            .delete_record("372e67954025e0ba6aaa6d586b9e0b59", "example.com", RecordKind::A)
            .await;

        assert!(deleted);
    }

    #[tokio::test]
    async fn delete_record_fails_closed_on_transport_errors() {
        // Point at a server that is not there.
        let zone = CloudflareZone::with_base_url(TOKEN, ZONE, "http://127.0.0.1:9").unwrap();

        assert!(!zone.delete_record("rec-1", "example.com", RecordKind::A).await);
    }

    #[tokio::test]
    async fn upsert_updates_an_existing_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/zones/{ZONE}/dns_records")))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(serde_json::json!([
                {"id": "372e67954025e0ba6aaa6d586b9e0b59", "type": "A", "name": "example.com", "content": "203.0.113.9"}
            ]))))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!(
                "/zones/{ZONE}/dns_records/372e67954025e0ba6aaa6d586b9e0b59"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "errors": [], "result": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zone = client(&server);
        let action = zone
            .upsert_record("example.com", RecordKind::A, addr(), false)
            .await;

        assert_eq!(action, Action::Updated);
    }

    #[tokio::test]
    async fn upsert_creates_when_the_zone_has_no_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/zones/{ZONE}/dns_records")))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(serde_json::json!([]))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/zones/{ZONE}/dns_records")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "errors": [], "result": {"id": "372e67954025e0ba6aaa6d586b9e0b59"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zone = client(&server);
        let action = zone
            .upsert_record("example.com", RecordKind::A, addr(), false)
            .await;

        assert_eq!(action, Action::Created);
    }

    #[tokio::test]
    async fn delete_if_exists_is_trivial_success_without_a_record() {
        let server = MockServer::start().await;
        // Only the lookup is mounted; a stray DELETE would 404 and fail.
        Mock::given(method("GET"))
            .and(path(format!("/zones/{ZONE}/dns_records")))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(serde_json::json!([]))))
            .mount(&server)
            .await;

        let zone = client(&server);
        let action = zone
            .delete_record_if_exists("example.com", RecordKind::A)
            .await;

        assert_eq!(action, Action::AlreadyAbsent);
    }

    #[tokio::test]
    async fn dry_run_looks_up_but_never_mutates() {
        let server = MockServer::start().await;
        // Only the lookup is mounted; an issued PUT would fail the upsert.
        Mock::given(method("GET"))
            .and(path(format!("/zones/{ZONE}/dns_records")))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(serde_json::json!([
                {"id": "372e67954025e0ba6aaa6d586b9e0b59", "type": "A", "name": "example.com", "content": "203.0.113.9"}
            ]))))
            .expect(1)
            .mount(&server)
            .await;

        let zone = client(&server).dry_run();
        let action = zone
            .upsert_record("example.com", RecordKind::A, addr(), false)
            .await;

        assert_eq!(action, Action::Updated);
    }
}
