use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber. Call once at startup.
/// RUST_LOG overrides the default directive.
pub fn init_logging(default_directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .init();
}
