//! Logging initialization
//!
//! One subscriber per process, writing to stderr so command output on stdout
//! stays clean. `SNAPROTATE_LOG` takes any `EnvFilter` directive and wins over
//! the verbosity flags.

use std::fmt;
use std::str::FromStr;
use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive
pub const LOG_ENV: &str = "SNAPROTATE_LOG";

/// Output format of the log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact lines for a terminal
    #[default]
    Human,
    /// One JSON object per line, for log collectors
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(LogFormat::Human),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}', expected human or json", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Default directive for a verbosity offset (`-v` count minus `-q` count)
pub fn default_directive(verbosity: i8) -> &'static str {
    match verbosity {
        i8::MIN..=-2 => "error",
        -1 => "snaprotate=warn",
        0 => "snaprotate=info",
        1 => "snaprotate=debug",
        _ => "snaprotate=trace",
    }
}

/// Install the global subscriber; later calls do nothing
pub fn init(format: LogFormat, verbosity: i8) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);

        // Another subscriber may already be installed (embedding, tests)
        let _ = match format {
            LogFormat::Human => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(LogFormat::Human, 0);
        init(LogFormat::Json, 2);
    }

    #[test]
    fn test_directive_by_verbosity() {
        assert_eq!(default_directive(0), "snaprotate=info");
        assert_eq!(default_directive(1), "snaprotate=debug");
        assert_eq!(default_directive(5), "snaprotate=trace");
        assert_eq!(default_directive(-1), "snaprotate=warn");
        assert_eq!(default_directive(-3), "error");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Human".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
