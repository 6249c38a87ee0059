//! Diagnostics go through `tracing`; hosts that don't install their own
//! subscriber can call [`init`].

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Installs a stderr fmt subscriber filtered by `EFL_NATIVE_LOG`.
///
/// Returns false if a global subscriber was already set (by this function or
/// by the host), which is not an error.
pub fn init() -> bool {
    let filter = tracing_subscriber::EnvFilter::try_new(&crate::config::config().log_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
