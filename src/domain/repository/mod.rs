// src/domain/repository/mod.rs
// Repository interfaces for the external capabilities the core calls

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::errors::{LedgerResult, MarketDataResult, SheetResult, SubmissionResult};
use crate::domain::model::{CellValue, InstrumentKey, OrderTicket, QuoteDepth};

/// Live quote depth from the broker
#[async_trait]
pub trait MarketDataRepository: Send + Sync {
    async fn get_quote_depth(&self, instrument: &InstrumentKey) -> MarketDataResult<QuoteDepth>;
}

/// Order submission to the broker
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Returns the broker's order id.
    async fn send_order(&self, ticket: &OrderTicket) -> SubmissionResult<String>;
}

/// Tabular data source holding order rows
#[async_trait]
pub trait SheetRepository: Send + Sync {
    /// Re-establish the data-source session; called once per poll cycle.
    async fn connect(&mut self) -> SheetResult<()> {
        Ok(())
    }

    /// All rows including the header, as text cells.
    async fn read_all_rows(&self) -> SheetResult<Vec<Vec<String>>>;

    /// Write `values` into one row starting at `column`. Both are 1-based.
    async fn write_values(&self, row: usize, column: usize, values: &[CellValue]) -> SheetResult<()>;
}

/// Entry for an order that reached the broker but whose row was not updated.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LedgerEntry {
    pub order_id: String,
    /// None for market orders.
    pub limit_price: Option<Decimal>,
    pub submitted_at: String,
    /// Status cell as read when the order was sent; a different value means the row was edited since.
    #[serde(default)]
    pub prior_status: String,
}

/// Durable record of submissions pending a sheet write-back
pub trait SubmissionLedger: Send + Sync {
    fn lookup(&self, key: &str) -> LedgerResult<Option<LedgerEntry>>;
    fn record(&self, key: &str, entry: LedgerEntry) -> LedgerResult<()>;
    fn clear(&self, key: &str) -> LedgerResult<()>;
}
