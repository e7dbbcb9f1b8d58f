//! `[log]` section
//!
//! Diagnostics only. Events are printed on stdout, so logs go to stderr
//! unless asked otherwise.

use serde::Deserialize;

/// How log lines are rendered
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

/// Stream log lines are written to
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Shares the stream with printed events
    Stdout,
    #[default]
    Stderr,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Filter directive handed to the subscriber, e.g. `info` or
    /// `warn,kaudit_pipeline=debug`
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            output: LogOutput::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_section_uses_defaults() {
        let log: LogConfig = toml::from_str("").unwrap();
        assert_eq!(log.level, "info");
        assert_eq!(log.format, LogFormat::Console);
        assert_eq!(log.output, LogOutput::Stderr);
    }

    #[test]
    fn test_per_crate_directive_kept_verbatim() {
        let log: LogConfig = toml::from_str(
            r#"
level = "warn,kaudit_sources=trace"
format = "json"
output = "stdout"
"#,
        )
        .unwrap();
        assert_eq!(log.level, "warn,kaudit_sources=trace");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.output, LogOutput::Stdout);
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(toml::from_str::<LogConfig>("format = \"pretty\"").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<LogConfig>("file = \"/tmp/k.log\"").is_err());
    }
}
