use tracing_subscriber::EnvFilter;

/// Installs the process-wide logger
///
/// Library code logs through the `log` facade; the fmt subscriber picks
/// those records up and writes them to stderr so stdout stays clean for
/// command output.
///
/// The filter comes from `RIFF_LOG`, then `RUST_LOG`. Without either, the
/// level is Debug in development builds and Info in production builds.
pub fn init() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_env("RIFF_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Logger already initialized: {}", e);
    }
}
