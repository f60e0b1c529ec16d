use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize structured logging. Verbosity comes from `FIELDWORK_LOG`
/// (error/warn/info/debug/trace), defaulting to INFO.
pub fn init() {
    let level = match std::env::var("FIELDWORK_LOG").ok().as_deref() {
        Some("error") => Level::ERROR,
        Some("warn") => Level::WARN,
        Some("debug") => Level::DEBUG,
        Some("trace") => Level::TRACE,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
