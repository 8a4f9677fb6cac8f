//! `tracing` subscriber setup for binaries embedding the bridge.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a global subscriber. `RUST_LOG` wins over the default `info`
/// filter. Calling it twice is harmless.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
