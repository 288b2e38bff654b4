/// Install the global tracing subscriber
///
/// Hosts call this once at startup. Calling it again is harmless: the second
/// subscriber is rejected and the first one stays active.
pub fn init(debug: bool) {
    let log_level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let installed = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .try_init();

    if installed.is_ok() {
        tracing::debug!("Logging initialised at {}", log_level);
    }
}
