//! Tracing initialization.
//!
//! Log output goes to stdout through a `tracing-subscriber` fmt layer. Verbosity is controlled
//! with the standard `RUST_LOG` environment variable and defaults to `info`, e.g.
//!
//! ```bash
//! RUST_LOG=itam=debug,tower_http=debug
//! # Only the authentication and authorization audit trail
//! RUST_LOG=warn,itam::audit=info
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber.
///
/// Fails if a global subscriber has already been set.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
