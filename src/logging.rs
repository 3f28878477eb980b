/// Initializes tracing for general application use.
/// Configures the default log level via the RUST_LOG environment variable
/// (e.g., RUST_LOG=mlisp=trace,info).
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
