use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::{LoggerFormat, LoggerLevel, LoggerResult, LoggerTimeZone};

/// Overrides [`LoggerConfig::level`].
pub const ENV_LEVEL: &str = "RUNWITH_LOG";
/// Overrides [`LoggerConfig::format`].
pub const ENV_FORMAT: &str = "RUNWITH_LOG_FORMAT";
/// Overrides [`LoggerConfig::tz`].
pub const ENV_TZ: &str = "RUNWITH_LOG_TZ";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Filter expression, e.g. `"info"` or `"runwith_core=debug,info"`.
    pub level: LoggerLevel,
    pub tz: LoggerTimeZone,
    /// Include event targets (module paths) in text/json output.
    pub with_targets: bool,
    /// Color text output; only honored when stderr is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Defaults with `RUNWITH_LOG*` environment overrides applied.
    pub fn from_env() -> LoggerResult<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; unset or blank values keep the current setting.
    pub fn with_overrides<F>(mut self, lookup: F) -> LoggerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(level) = get(ENV_LEVEL) {
            self.level = level.parse()?;
        }
        if let Some(format) = get(ENV_FORMAT) {
            self.format = format.parse()?;
        }
        if let Some(tz) = get(ENV_TZ) {
            self.tz = tz.parse()?;
        }
        Ok(self)
    }

    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stderr().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::LoggerError;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = LoggerConfig::default();
        assert_eq!(cfg.format, LoggerFormat::Text);
        assert_eq!(cfg.tz, LoggerTimeZone::Utc);
        assert_eq!(cfg.level.as_str(), "info");
        assert!(cfg.with_targets);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let cfg: LoggerConfig = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert_eq!(cfg.level.as_str(), "info");
        assert!(cfg.use_color);
    }

    #[test]
    fn overrides_replace_set_values() {
        let cfg = LoggerConfig::default()
            .with_overrides(env(&[
                (ENV_LEVEL, "runwith_core=trace,warn"),
                (ENV_FORMAT, "json"),
                (ENV_TZ, "local"),
            ]))
            .unwrap();

        assert_eq!(cfg.level.as_str(), "runwith_core=trace,warn");
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert_eq!(cfg.tz, LoggerTimeZone::Local);
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let cfg = LoggerConfig::default()
            .with_overrides(env(&[(ENV_FORMAT, "  ")]))
            .unwrap();
        assert_eq!(cfg.format, LoggerFormat::Text);
    }

    #[test]
    fn bad_override_is_an_error() {
        let err = LoggerConfig::default()
            .with_overrides(env(&[(ENV_TZ, "mars")]))
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidTimeZone(_)));
    }
}
