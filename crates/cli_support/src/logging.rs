use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Install the global fmt subscriber (`RUST_LOG` overrides the `info` default).
///
/// Later calls are no-ops so tests and binaries can both call it.
pub fn init_tracing() {
    if INITIALISED.set(()).is_err() {
        return;
    }
    let ansi = std::io::stdout().is_terminal();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(ansi);
    let _ = Registry::default().with(filter).with(fmt_layer).try_init();
}
