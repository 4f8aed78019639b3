use color_eyre::eyre::Result;
use tracing_error::ErrorLayer;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "FOLLOW_EXEC_LOGLEVEL";

pub fn initialize_logging() -> Result<()> {
  let filter = std::env::var("RUST_LOG")
    .or_else(|_| std::env::var(LOG_ENV))
    .unwrap_or_else(|_| "error".into());
  // stdout is reserved for the lines the debugger verifies, so diagnostics
  // go to stderr.
  let fmt_layer = tracing_subscriber::fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_ansi(false)
    .with_filter(tracing_subscriber::filter::EnvFilter::try_new(filter)?);
  tracing_subscriber::registry()
    .with(fmt_layer)
    .with(ErrorLayer::default())
    .try_init()?;
  Ok(())
}
