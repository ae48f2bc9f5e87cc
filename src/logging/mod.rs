// Logging module for structured logging using the tracing crate

use std::error::Error;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the output format (`json` or `pretty`)
pub const LOG_FORMAT_ENV: &str = "IMGWELCOME_LOG_FORMAT";

/// Output format of the fmt subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event, for log aggregation systems
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown log format '{}'", other)),
        }
    }
}

impl LogFormat {
    /// Format from `IMGWELCOME_LOG_FORMAT`, falling back to pretty output
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }
}

/// Initialize the tracing subscriber for structured logging
///
/// Filtering follows `RUST_LOG` (default `info`); the format follows
/// `IMGWELCOME_LOG_FORMAT`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
///
/// # Examples
///
/// ```
/// use imgwelcome::logging::init_subscriber;
///
/// init_subscriber().expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber() -> Result<(), Box<dyn Error + Send + Sync>> {
    init_with_format(LogFormat::from_env())
}

/// Initialize the subscriber with an explicit format
pub fn init_with_format(format: LogFormat) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    }
}
