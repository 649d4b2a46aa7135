//! Logging Config

use clap::Args;

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level for the storefront crates (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Log every SQL statement sqlx executes.
    #[arg(long, env = "LOG_SQL", default_value_t = false)]
    pub log_sql: bool,
}

impl LoggingConfig {
    /// Filter directives used when `RUST_LOG` does not hold a full filter.
    ///
    /// Transport crates are held at `warn` so request logs stay readable.
    #[must_use]
    pub fn default_directives(&self) -> String {
        let sqlx = if self.log_sql { "debug" } else { "warn" };

        format!(
            "{},sqlx={sqlx},h2=warn,hyper=warn,reqwest=warn,tower=warn,tonic=warn,opentelemetry=warn",
            self.log_level
        )
    }

    /// Same settings at a different level.
    #[must_use]
    pub fn with_level(&self, level: &str) -> Self {
        Self {
            log_level: level.to_string(),
            log_format: self.log_format,
            log_sql: self.log_sql,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(log_sql: bool) -> LoggingConfig {
        LoggingConfig {
            log_level: "debug".to_string(),
            log_format: LogFormat::Json,
            log_sql,
        }
    }

    #[test]
    fn sql_statements_are_quiet_unless_asked_for() {
        assert!(config(false).default_directives().contains("sqlx=warn"));
        assert!(config(true).default_directives().contains("sqlx=debug"));
    }

    #[test]
    fn configured_level_leads_the_filter() {
        assert!(config(false).default_directives().starts_with("debug,"));
    }
}
