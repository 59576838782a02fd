// src/domain/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Instrument error: {0}")]
    Instrument(#[from] InstrumentError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failures while fetching or interpreting quote depth.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("Quote request failed: {0}")]
    Fetch(String),

    #[error("Quote request timed out: {0}")]
    Timeout(String),

    #[error("No {side} depth available for {instrument}")]
    MissingDepth { instrument: String, side: String },

    #[error("Invalid quote format: {0}")]
    InvalidFormat(String),
}

/// Failures while placing an order with the broker.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    #[error("Order request failed: {0}")]
    Request(String),

    #[error("Order request timed out: {0}")]
    Timeout(String),

    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Broker returned no order id")]
    MissingOrderId,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("Sheet authorization failed: {0}")]
    Auth(String),

    #[error("Sheet read failed: {0}")]
    Read(String),

    #[error("Sheet write failed: {0}")]
    Write(String),

    #[error("Invalid cell range: {0}")]
    InvalidRange(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Token cache error: {0}")]
    TokenCache(String),
}

#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error("Instrument file error: {0}")]
    File(String),

    #[error("Instrument download failed: {0}")]
    Download(String),

    #[error("Malformed instrument row: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger IO error: {0}")]
    Io(String),

    #[error("Ledger format error: {0}")]
    Format(String),
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type MarketDataResult<T> = Result<T, MarketDataError>;
pub type SubmissionResult<T> = Result<T, SubmissionError>;
pub type SheetResult<T> = Result<T, SheetError>;
pub type SessionResult<T> = Result<T, SessionError>;
pub type InstrumentResult<T> = Result<T, InstrumentError>;
pub type LedgerResult<T> = Result<T, LedgerError>;
