use tracing_subscriber::EnvFilter;

/// Initializes the fmt subscriber on stderr.
///
/// `RUST_LOG` overrides `default_level`. The TUI passes `warn` so routine
/// events do not scribble over the alternate screen.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
