use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::origination::DocumentType;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub review: ReviewConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::from_label(&raw).ok_or(ConfigError::InvalidValue {
                key: "APP_LOG_FORMAT",
                value: raw,
            })?,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            review: ReviewConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Event layout written by the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line events, the default for deployed services.
    Compact,
    /// Multi-line events with source locations, for local debugging.
    Pretty,
}

impl LogFormat {
    fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// A bare level for the service crates, or full `EnvFilter` directives.
    pub log_level: String,
    pub log_format: LogFormat,
}

pub const DEFAULT_MIN_LOAN_AMOUNT: f64 = 1_000.0;
pub const DEFAULT_MAX_LOAN_AMOUNT: f64 = 1_000_000.0;
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Intake limits and scoring switches consumed by the origination services.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewConfig {
    pub min_loan_amount: f64,
    pub max_loan_amount: f64,
    pub max_document_bytes: u64,
    pub required_document_types: Vec<DocumentType>,
    pub scoring_enabled: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            min_loan_amount: DEFAULT_MIN_LOAN_AMOUNT,
            max_loan_amount: DEFAULT_MAX_LOAN_AMOUNT,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            required_document_types: vec![DocumentType::IdProof, DocumentType::IncomeProof],
            scoring_enabled: true,
        }
    }
}

impl ReviewConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let min_loan_amount = parse_var("LOAN_MIN_AMOUNT", defaults.min_loan_amount)?;
        let max_loan_amount = parse_var("LOAN_MAX_AMOUNT", defaults.max_loan_amount)?;
        if !(min_loan_amount > 0.0 && min_loan_amount <= max_loan_amount) {
            return Err(ConfigError::InvalidLoanBounds {
                min: min_loan_amount,
                max: max_loan_amount,
            });
        }

        let max_document_bytes = parse_var("DOCUMENT_MAX_BYTES", defaults.max_document_bytes)?;

        let required_document_types = match env::var("REQUIRED_DOCUMENT_TYPES") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(|label| {
                    DocumentType::from_label(label).ok_or_else(|| ConfigError::InvalidValue {
                        key: "REQUIRED_DOCUMENT_TYPES",
                        value: label.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => defaults.required_document_types,
        };

        let scoring_enabled = match env::var("SCORING_SERVICE_ENABLED") {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "SCORING_SERVICE_ENABLED",
                        value: raw,
                    })
                }
            },
            Err(_) => defaults.scoring_enabled,
        };

        Ok(Self {
            min_loan_amount,
            max_loan_amount,
            max_document_bytes,
            required_document_types,
            scoring_enabled,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { key: &'static str, value: String },
    InvalidLoanBounds { min: f64, max: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must be a valid IP address or 'localhost'")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
            ConfigError::InvalidLoanBounds { min, max } => write!(
                f,
                "loan amount bounds must satisfy 0 < min <= max (min {min}, max {max})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::InvalidLoanBounds { .. } => None,
        }
    }
}
