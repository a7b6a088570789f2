// # ipsync - Dynamic DNS updater
//
// This binary is a THIN integration layer only:
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Wiring the detector and zone client into the core engine
// 4. Mapping the run summary to a process exit code
//
// All reconciliation logic lives in ipsync-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `CF_API_TOKEN`: Cloudflare API token (required)
// - `CF_ZONE_ID`: target zone id (required)
// - `HOSTNAME`: default record name for all three slots (required)
// - `INTERNAL_DOMAIN`: record name for the internal IPv4 slot
// - `EXTERNAL_DOMAIN`: record name for the external IPv4 slot
// - `IPV6_DOMAIN`: record name for the external IPv6 slot
// - `CF_PROXIED`: proxy records through the provider edge (default false)
// - `DRY_RUN`: log intended mutations instead of issuing them (default false)
// - `LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Exit codes
//
// - 0: every attempted record reconciled
// - 1: some records reconciled but not all, or a configuration error
// - 2: no record reconciled
//
// ## Example
//
// ```bash
// export CF_API_TOKEN=your_zone_dns_edit_token
// export CF_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export HOSTNAME=host.example.com
// export INTERNAL_DOMAIN=internal.example.com
//
// ipsync
// ```
//
// One invocation performs exactly one run. Schedule it externally (cron,
// systemd timer) for continuous operation; the re-invocation is also what
// provides eventual retry for failed slots.

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use ipsync_core::Config;
use ipsync_core::engine::{RunSummary, run_once};
use ipsync_ip_system::SystemDetector;
use ipsync_provider_cloudflare::CloudflareZone;

/// Exit codes for the different run outcomes
#[derive(Debug, Clone, Copy)]
enum SyncExitCode {
    /// Every attempted record reconciled
    Success,
    /// Some records reconciled, but not all
    PartialFailure,
    /// Configuration prevented the run from starting
    ConfigError,
    /// No record reconciled
    TotalFailure,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(match code {
            SyncExitCode::Success => 0,
            SyncExitCode::PartialFailure | SyncExitCode::ConfigError => 1,
            SyncExitCode::TotalFailure => 2,
        })
    }
}

impl From<RunSummary> for SyncExitCode {
    fn from(summary: RunSummary) -> Self {
        if summary.all_succeeded() {
            SyncExitCode::Success
        } else if summary.none_succeeded() {
            SyncExitCode::TotalFailure
        } else {
            SyncExitCode::PartialFailure
        }
    }
}

fn main() -> ExitCode {
    // Configuration is resolved and validated before anything touches the
    // network.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return SyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("configuration validation error: {e}");
        return SyncExitCode::ConfigError.into();
    }

    if let Err(e) = init_tracing() {
        eprintln!("failed to initialize tracing: {e}");
        return SyncExitCode::ConfigError.into();
    }

    // The run is strictly sequential; a current-thread runtime is enough.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {}", e);
            return SyncExitCode::TotalFailure.into();
        }
    };

    match runtime.block_on(run(config)) {
        Ok(code) => code.into(),
        Err(e) => {
            error!("run failed: {:#}", e);
            SyncExitCode::TotalFailure.into()
        }
    }
}

fn init_tracing() -> Result<()> {
    let level = match env::var("LOG_LEVEL").unwrap_or_default().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}

async fn run(config: Config) -> Result<SyncExitCode> {
    info!("starting dynamic DNS update");

    let detector = SystemDetector::new();

    let mut zone = CloudflareZone::new(config.api_token.as_str(), config.zone_id.as_str())
        .context("failed to construct Cloudflare client")?;
    if config.dry_run {
        warn!("dry-run mode: no records will be modified");
        zone = zone.dry_run();
    }

    let summary = run_once(&config, &detector, &zone).await;

    if summary.all_succeeded() {
        info!("all updates successful ({})", summary);
    } else if summary.none_succeeded() {
        error!("all updates failed ({})", summary);
    } else {
        warn!("some updates failed ({})", summary);
    }

    Ok(SyncExitCode::from(summary))
}
