// src/application/dto/mod.rs
pub mod parser;

use std::fmt;
use thiserror::Error;

use crate::domain::errors::{AppError, LedgerError, MarketDataError, SheetError, SubmissionError};
use crate::domain::model::OrderOutcome;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<ApplicationError> for AppError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::MarketData(e) => AppError::MarketData(e),
            ApplicationError::Submission(e) => AppError::Submission(e),
            ApplicationError::Sheet(e) => AppError::Sheet(e),
            ApplicationError::Ledger(e) => AppError::Ledger(e),
        }
    }
}

/// What happened to one sheet row during a cycle.
#[derive(Debug)]
pub enum RowOutcome {
    /// Required field missing or unparseable
    Invalid(String),
    /// Status already carries the placed sentinel
    Skipped,
    /// Order placed and the row was marked
    Placed(OrderOutcome),
    /// Row left unplaced for the next cycle
    Failed(ApplicationError),
}

/// Per-cycle counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub total: usize,
    pub placed: usize,
    pub skipped: usize,
    pub invalid: usize,
    pub failed: usize,
}

impl CycleReport {
    pub fn record(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Invalid(_) => self.invalid += 1,
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Placed(_) => self.placed += 1,
            RowOutcome::Failed(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "total={}, placed={}, skipped={}, invalid={}, failed={}",
            self.total, self.placed, self.skipped, self.invalid, self.failed
        )
    }
}
