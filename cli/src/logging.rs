//! Diagnostic logging setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects debug output for
/// this crate (every remote command is logged).
pub fn init(verbose: bool) {
    let default = if verbose {
        "basebox_provisioner=debug,warn"
    } else {
        "basebox_provisioner=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Already initialised (e.g. by a test harness) is fine.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}
