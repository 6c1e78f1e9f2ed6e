//! Logging setup shared by the tasklog binaries.
//!
//! Everything is written to stderr so that command output on stdout stays
//! clean. The filter defaults to `tasklog=<level>`, which covers every
//! `tasklog_*` crate, and can be overridden by `RUST_LOG`.
//!
//! ```ignore
//! use tasklog_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::cli_debug())?;
//! ```

use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    prelude::*,
    registry::LookupSpan,
};

/// Target prefix shared by every crate in the workspace.
const LOG_TARGET: &str = "tasklog";

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("invalid log filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line, for reading a single run closely
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// One JSON object per line, for log shippers
    Json,
}

impl std::str::FromStr for TracingOutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format '{other}' (expected pretty, compact or json)"
            )),
        }
    }
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for the `tasklog` targets when `RUST_LOG` is unset.
    pub level: Level,
    pub format: TracingOutputFormat,
    /// File and line of each event.
    pub show_location: bool,
    /// Module path of each event.
    pub show_target: bool,
    pub timestamps: bool,
    /// Emit a line with the elapsed time when an instrumented span closes.
    pub span_timings: bool,
    /// Explicit filter directive; wins over both `level` and `RUST_LOG`.
    pub directive: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingOutputFormat::Compact,
            show_location: false,
            show_target: false,
            timestamps: true,
            span_timings: false,
            directive: None,
        }
    }
}

impl TracingConfig {
    /// Verbose CLI logging, enabled by `-v`: debug level, source locations
    /// and span timings, no timestamps.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            level: Level::DEBUG,
            show_location: true,
            show_target: true,
            timestamps: false,
            span_timings: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = Some(directive.into());
        self
    }

    /// Directive used when neither `directive` nor `RUST_LOG` is set.
    pub fn default_directive(&self) -> String {
        format!("{LOG_TARGET}={}", self.level)
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        Ok(match self.directive {
            Some(ref directive) => EnvFilter::try_new(directive)?,
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.default_directive())),
        })
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_timings {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// The stderr formatting layer for this configuration.
    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    {
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(self.show_location)
            .with_line_number(self.show_location)
            .with_target(self.show_target)
            .with_span_events(self.span_events());

        match (self.format, self.timestamps) {
            (TracingOutputFormat::Pretty, _) => base.pretty().boxed(),
            (TracingOutputFormat::Json, _) => base.json().boxed(),
            (TracingOutputFormat::Compact, true) => base.compact().boxed(),
            (TracingOutputFormat::Compact, false) => base.compact().without_time().boxed(),
        }
    }
}

/// Installs the global subscriber.
///
/// Fails if a subscriber is already installed or if the filter directive
/// does not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let subscriber = tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(config.fmt_layer());
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, TracingOutputFormat::Compact);
        assert!(!config.show_location);
        assert!(config.directive.is_none());
        assert_eq!(config.default_directive(), "tasklog=INFO");
    }

    #[test]
    fn cli_debug_config() {
        let config = TracingConfig::cli_debug();
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.show_location);
        assert!(config.span_timings);
        assert!(!config.timestamps);
        assert_eq!(config.default_directive(), "tasklog=DEBUG");
    }

    #[test]
    fn builder_methods() {
        let config = TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Json)
            .with_directive("tasklog_providers=trace");

        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.format, TracingOutputFormat::Json);
        assert_eq!(config.directive.as_deref(), Some("tasklog_providers=trace"));
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn bad_directive_is_rejected() {
        let config = TracingConfig::default().with_directive("tasklog=loud");
        assert!(matches!(config.env_filter(), Err(TracingError::EnvFilter(_))));
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("json".parse(), Ok(TracingOutputFormat::Json));
        assert_eq!("TEXT".parse(), Ok(TracingOutputFormat::Compact));
        assert_eq!("pretty".parse(), Ok(TracingOutputFormat::Pretty));
        assert!("xml".parse::<TracingOutputFormat>().is_err());
    }
}
