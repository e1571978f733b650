//! Shared helpers for the integration tests in `tests/`.

/// Install a fmt subscriber honoring `RUST_LOG`; safe to call from every
/// test, only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
