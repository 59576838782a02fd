// src/config.rs
use crate::domain::errors::{AppError, AppResult};
use crate::domain::service::ClassifierRules;
use crate::infrastructure::broker::DEFAULT_BASE_URL;
use crate::infrastructure::instruments::DEFAULT_INSTRUMENTS_URL;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Order bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Broker API credentials
    pub broker: BrokerConfig,

    /// Order sheet location
    pub sheet: SheetConfig,

    /// Poll loop settings
    pub pipeline: PipelineConfig,

    /// Instrument reference file
    pub instruments: InstrumentsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Kite Connect configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub api_key: String,

    pub api_secret: String,

    /// Pre-issued access token, tried before the token file
    pub access_token: Option<String>,

    /// File the access token is read from and saved to
    pub token_file: String,

    pub base_url: String,

    /// Read api_key/api_secret/access_token from the Info worksheet (B1:B3)
    pub credentials_from_sheet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetBackend {
    Google,
    Csv,
}

impl FromStr for SheetBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(SheetBackend::Google),
            "csv" => Ok(SheetBackend::Csv),
            other => Err(AppError::Config(format!("Unsupported sheet backend: {}", other))),
        }
    }
}

/// Order sheet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    pub backend: SheetBackend,

    pub spreadsheet_id: String,

    /// Worksheet holding order rows
    pub worksheet: String,

    /// Worksheet holding broker credentials
    pub info_worksheet: String,

    pub service_account_file: String,

    /// Order rows file for the csv backend
    pub csv_path: String,
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pause between cycles
    pub poll_interval_secs: u64,

    /// Pause after each row that reached the broker
    pub row_throttle_ms: u64,

    /// Deadline for every HTTP call
    pub call_timeout_secs: u64,

    /// Digits needed for a symbol to count as a derivative
    pub min_derivative_digits: usize,

    /// Submission ledger file; disabled when unset
    pub ledger_path: Option<String>,
}

impl PipelineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn row_throttle(&self) -> Duration {
        Duration::from_millis(self.row_throttle_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.max(1))
    }

    pub fn classifier_rules(&self) -> ClassifierRules {
        ClassifierRules::default().with_min_digits(self.min_derivative_digits)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentsConfig {
    pub file: String,

    pub url: String,

    pub max_age_hours: u64,
}

impl InstrumentsConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_hours * 3600)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,

    /// Log to file
    pub to_file: bool,

    /// Log file path
    pub file_path: Option<String>,
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let broker = BrokerConfig {
            api_key: env_or("KITE_API_KEY", ""),
            api_secret: env_or("KITE_API_SECRET", ""),
            access_token: env_opt("KITE_ACCESS_TOKEN"),
            token_file: env_or("KITE_TOKEN_FILE", &defaults.broker.token_file),
            base_url: env_or("KITE_BASE_URL", &defaults.broker.base_url),
            credentials_from_sheet: env_parse("KITE_CREDENTIALS_FROM_SHEET", false),
        };

        let sheet = SheetConfig {
            backend: env_or("SHEET_BACKEND", "google").parse()?,
            spreadsheet_id: env_or("SHEET_SPREADSHEET_ID", ""),
            worksheet: env_or("SHEET_WORKSHEET", &defaults.sheet.worksheet),
            info_worksheet: env_or("SHEET_INFO_WORKSHEET", &defaults.sheet.info_worksheet),
            service_account_file: env_or(
                "GOOGLE_SERVICE_ACCOUNT_FILE",
                &defaults.sheet.service_account_file,
            ),
            csv_path: env_or("SHEET_CSV_PATH", &defaults.sheet.csv_path),
        };

        let pipeline = PipelineConfig {
            poll_interval_secs: env_parse("POLL_INTERVAL_SECS", defaults.pipeline.poll_interval_secs),
            row_throttle_ms: env_parse("ROW_THROTTLE_MS", defaults.pipeline.row_throttle_ms),
            call_timeout_secs: env_parse("CALL_TIMEOUT_SECS", defaults.pipeline.call_timeout_secs),
            min_derivative_digits: env_parse(
                "MIN_DERIVATIVE_DIGITS",
                defaults.pipeline.min_derivative_digits,
            ),
            ledger_path: env_opt("LEDGER_PATH"),
        };

        let instruments = InstrumentsConfig {
            file: env_or("INSTRUMENTS_FILE", &defaults.instruments.file),
            url: env_or("INSTRUMENTS_URL", &defaults.instruments.url),
            max_age_hours: env_parse("INSTRUMENTS_MAX_AGE_HOURS", defaults.instruments.max_age_hours),
        };

        let logging = LoggingConfig {
            level: env_or("LOG_LEVEL", "info"),
            to_file: env_parse("LOG_TO_FILE", false),
            file_path: env_opt("LOG_FILE_PATH"),
        };

        Ok(Config {
            broker,
            sheet,
            pipeline,
            instruments,
            logging,
        })
    }

    /// Check the settings a polling run needs.
    pub fn validate_for_polling(&self) -> AppResult<()> {
        match self.sheet.backend {
            SheetBackend::Google if self.sheet.spreadsheet_id.is_empty() => Err(AppError::Config(
                "Missing SHEET_SPREADSHEET_ID environment variable".to_string(),
            )),
            SheetBackend::Csv if self.sheet.csv_path.is_empty() => Err(AppError::Config(
                "Missing SHEET_CSV_PATH environment variable".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let mut file = File::open(path).map_err(|e| {
            AppError::Config(format!("Failed to open config file: {}", e))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file: {}", e))
        })?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::Config(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, contents).map_err(|e| {
            AppError::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> AppResult<()> {
        let mut builder = env_logger::Builder::new();

        let log_level = match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        builder.filter_level(log_level);

        if self.logging.to_file {
            if let Some(file_path) = &self.logging.file_path {
                let file = File::create(file_path).map_err(|e| {
                    AppError::Config(format!("Failed to create log file: {}", e))
                })?;

                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
        }

        builder.init();

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker: BrokerConfig {
                api_key: "".to_string(),
                api_secret: "".to_string(),
                access_token: None,
                token_file: "access_token.txt".to_string(),
                base_url: DEFAULT_BASE_URL.to_string(),
                credentials_from_sheet: false,
            },
            sheet: SheetConfig {
                backend: SheetBackend::Google,
                spreadsheet_id: "".to_string(),
                worksheet: "Place_Orders".to_string(),
                info_worksheet: "Info".to_string(),
                service_account_file: "service_account.json".to_string(),
                csv_path: "place_orders.csv".to_string(),
            },
            pipeline: PipelineConfig {
                poll_interval_secs: 10,
                row_throttle_ms: 1000,
                call_timeout_secs: 10,
                min_derivative_digits: 1,
                ledger_path: None,
            },
            instruments: InstrumentsConfig {
                file: "instruments.csv".to_string(),
                url: DEFAULT_INSTRUMENTS_URL.to_string(),
                max_age_hours: 12,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                to_file: false,
                file_path: None,
            },
        }
    }
}
