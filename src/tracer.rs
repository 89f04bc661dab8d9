use tracing_subscriber::EnvFilter;

/// initializes the global tracing subscriber, logging to stdout.
///
/// the `RUST_LOG` env var overrides the default level, which is `debug`
/// in development and `info` otherwise
pub fn init(service_name: &str, is_development: bool) {
    let default_directive = if is_development { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    println!("[TRACER] initialized for {service_name}");
}
