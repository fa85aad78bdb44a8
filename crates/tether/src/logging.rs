//! Tracing setup for binaries built on Tether.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a global fmt subscriber filtered by `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already set, which is
/// harmless (tests and embedding applications often install their own).
pub fn init() -> bool {
    init_with(DEFAULT_FILTER)
}

/// Like [`init`], with an explicit fallback filter such as
/// `"tether_session=debug,info"`.
pub fn init_with(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_reports_existing_subscriber() {
        let _first = init();
        assert!(!init(), "second install must not replace the first");
    }
}
