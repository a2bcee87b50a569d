use tracing::Level;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Logs go to stderr, stdout is reserved for generated code.
///
/// `RUST_LOG` directives are honored on top of the configured level.
pub fn init_tracer(max_level: Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(max_level).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .pretty()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
