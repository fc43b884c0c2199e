use tracing_subscriber::filter::LevelFilter;

/// Install the global fmt subscriber at `level`.
///
/// Accepts `off`, `error`, `warn`, `info`, `debug` and `trace` in any case;
/// anything else logs at `info`. Only the first call in a process installs
/// a subscriber.
pub fn init(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_filter(level))
        .with_target(false)
        .try_init();
}

pub(crate) fn level_filter(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::INFO)
}
