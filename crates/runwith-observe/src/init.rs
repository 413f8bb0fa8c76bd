use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{LoggerConfig, LoggerError, LoggerFormat, LoggerResult, Rfc3339Timer};

/// Install the global subscriber described by `cfg`.
///
/// Call once from `main` before spawning threads: a local timezone offset is
/// resolved here. Text and json output go to stderr so stdout stays with the
/// launched jobs.
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    let filter = cfg.level.to_env_filter();
    let timer = Rfc3339Timer::new(cfg.tz.offset());

    match cfg.format {
        LoggerFormat::Text => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(cfg.should_use_color())
                .with_target(cfg.with_targets)
                .with_timer(timer);
            install(tracing_subscriber::registry().with(filter).with(layer))
        }
        LoggerFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(cfg.with_targets)
                .with_timer(timer);
            install(tracing_subscriber::registry().with(filter).with(layer))
        }
        LoggerFormat::Journald => journald(cfg),
    }
}

#[cfg(target_os = "linux")]
fn journald(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer =
        tracing_journald::layer().map_err(|e| LoggerError::JournaldInitFailed(e.to_string()))?;
    install(
        tracing_subscriber::registry()
            .with(cfg.level.to_env_filter())
            .with(layer),
    )
}

#[cfg(not(target_os = "linux"))]
fn journald(_cfg: &LoggerConfig) -> LoggerResult<()> {
    Err(LoggerError::JournaldNotSupported)
}

fn install<S>(subscriber: S) -> LoggerResult<()>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only one test may install the global subscriber per test binary.
    #[test]
    fn second_init_is_rejected() {
        let cfg = LoggerConfig {
            use_color: false,
            ..Default::default()
        };
        init_logger(&cfg).unwrap();
        assert!(matches!(
            init_logger(&cfg),
            Err(LoggerError::AlreadyInitialized)
        ));
    }
}
