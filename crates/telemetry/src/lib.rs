#![forbid(unsafe_code)]

//! Tracing setup shared by Hive binaries.

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Initializes the global `tracing` subscriber.
///
/// Structured JSON to stderr by default; `pretty = true` switches to the
/// human format for interactive runs. The filter comes from `RUST_LOG`,
/// defaulting to `info`.
pub fn init_tracing(pretty: bool) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if pretty {
        let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
        tracing::subscriber::set_global_default(
            Registry::default().with(filter).with(fmt_layer),
        )?;
    } else {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true);
        tracing::subscriber::set_global_default(
            Registry::default().with(filter).with(fmt_layer),
        )?;
    }
    Ok(())
}
