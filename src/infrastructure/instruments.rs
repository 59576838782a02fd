// src/infrastructure/instruments.rs
// Instrument reference file (instruments.csv) lookup and refresh

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::domain::errors::{InstrumentError, InstrumentResult};
use crate::infrastructure::http::HttpTransport;

pub const DEFAULT_INSTRUMENTS_URL: &str = "https://api.kite.trade/instruments";

// instrument_token, exchange_token, tradingsymbol, name, last_price, expiry,
// strike, tick_size, lot_size, instrument_type, segment, exchange
const MIN_COLUMNS: usize = 12;
const TOKEN_COLUMN: usize = 0;
const SYMBOL_COLUMN: usize = 2;
const NAME_COLUMN: usize = 3;
const LOT_SIZE_COLUMN: usize = 8;
const EXCHANGE_COLUMN: usize = 11;

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentRecord {
    pub instrument_token: u64,
    pub tradingsymbol: String,
    pub name: String,
    pub lot_size: Option<u64>,
    pub exchange: String,
}

pub struct InstrumentCatalog {
    path: PathBuf,
    url: String,
    max_age: Duration,
}

impl InstrumentCatalog {
    pub fn new<P: AsRef<Path>>(path: P, url: &str, max_age: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            url: url.to_string(),
            max_age,
        }
    }

    /// Age of the local file, or None when it does not exist.
    pub fn age(&self) -> Option<Duration> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        Some(SystemTime::now().duration_since(modified).unwrap_or_default())
    }

    pub fn is_stale(&self) -> bool {
        match self.age() {
            Some(age) => age >= self.max_age,
            None => true,
        }
    }

    /// Download a fresh dump when the local file is missing or too old.
    pub async fn ensure_fresh(&self, transport: &HttpTransport) -> InstrumentResult<()> {
        match self.age() {
            Some(age) if age < self.max_age => {
                log::info!(
                    "Using cached instruments file {} ({:.2} hours old)",
                    self.path.display(),
                    age.as_secs_f64() / 3600.0
                );
                return Ok(());
            }
            Some(_) => log::info!("Cached instruments file is stale, downloading a new one"),
            None => log::info!("No cached instruments file, downloading"),
        }

        let response = transport
            .get(&self.url, &[])
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| InstrumentError::Download(e.to_string()))?;

        fs::write(&self.path, &response.body)
            .map_err(|e| InstrumentError::File(format!("{}: {}", self.path.display(), e)))?;
        log::info!("Saved instruments to {}", self.path.display());
        Ok(())
    }

    /// First row matching `exchange` and `tradingsymbol` exactly.
    pub fn lookup(&self, exchange: &str, tradingsymbol: &str) -> InstrumentResult<Option<InstrumentRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| InstrumentError::File(format!("{}: {}", self.path.display(), e)))?;

        for record in reader.records() {
            let record = record.map_err(|e| InstrumentError::File(e.to_string()))?;
            if record.len() < MIN_COLUMNS {
                continue;
            }
            if &record[EXCHANGE_COLUMN] != exchange || &record[SYMBOL_COLUMN] != tradingsymbol {
                continue;
            }

            let instrument_token = record[TOKEN_COLUMN].parse::<u64>().map_err(|e| {
                InstrumentError::Malformed(format!("token '{}': {}", &record[TOKEN_COLUMN], e))
            })?;
            log::info!(
                "Found instrument token {} for {} on {}",
                instrument_token,
                tradingsymbol,
                exchange
            );
            return Ok(Some(InstrumentRecord {
                instrument_token,
                tradingsymbol: record[SYMBOL_COLUMN].to_string(),
                name: record[NAME_COLUMN].to_string(),
                lot_size: record[LOT_SIZE_COLUMN].parse().ok(),
                exchange: record[EXCHANGE_COLUMN].to_string(),
            }));
        }

        log::info!("No instrument found for {} on {}", tradingsymbol, exchange);
        Ok(None)
    }
}
