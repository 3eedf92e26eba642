use tracing_subscriber::EnvFilter;

/// Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
/// overrides the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=warn",
            env!("CARGO_PKG_NAME").replace('-', "_")
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
