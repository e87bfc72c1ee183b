/// Initializes structured logging for the application.
///
/// Verbosity is controlled through the `RUST_LOG` environment variable:
/// - `RUST_LOG=info` - info and above
/// - `RUST_LOG=debug` - debug and above
/// - `RUST_LOG=fueldrive=debug` - debug for this crate only
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
