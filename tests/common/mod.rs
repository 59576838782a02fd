// In-memory stand-ins for the broker, the order sheet and the ledger
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use sheet_trade::application::usecase::{OrderPlacer, PricingResolver, SheetOrderPipeline};
use sheet_trade::domain::errors::{
    LedgerResult, MarketDataError, MarketDataResult, SheetError, SheetResult, SubmissionError,
    SubmissionResult,
};
use sheet_trade::domain::model::{CellValue, DepthLevel, InstrumentKey, OrderTicket, QuoteDepth};
use sheet_trade::domain::repository::{
    LedgerEntry, MarketDataRepository, OrderRepository, SheetRepository, SubmissionLedger,
};
use sheet_trade::domain::service::{ClassifierRules, SymbolClassifier};

pub const HEADER: [&str; 6] = ["Symbol", "Direction", "Quantity", "Status", "Timestamp", "Price"];

#[derive(Default)]
pub struct FakeMarket {
    quotes: Mutex<HashMap<String, QuoteDepth>>,
    pub calls: AtomicUsize,
}

impl FakeMarket {
    /// `key` is `EXCHANGE:SYMBOL`; prices are (price, quantity).
    pub fn set(&self, key: &str, bid: Option<(Decimal, u64)>, ask: Option<(Decimal, u64)>) {
        let instrument: InstrumentKey = key.parse().unwrap();
        let level = |l: Option<(Decimal, u64)>| l.map(|(price, quantity)| DepthLevel { price, quantity });
        self.quotes.lock().unwrap().insert(
            instrument.to_string(),
            QuoteDepth {
                instrument,
                best_bid: level(bid),
                best_ask: level(ask),
            },
        );
    }
}

#[async_trait]
impl MarketDataRepository for FakeMarket {
    async fn get_quote_depth(&self, instrument: &InstrumentKey) -> MarketDataResult<QuoteDepth> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.quotes
            .lock()
            .unwrap()
            .get(&instrument.to_string())
            .cloned()
            .ok_or_else(|| MarketDataError::Fetch(format!("no quote for {}", instrument)))
    }
}

#[derive(Default)]
pub struct FakeBroker {
    pub tickets: Mutex<Vec<OrderTicket>>,
    pub reject: AtomicBool,
    pub empty_id: AtomicBool,
}

impl FakeBroker {
    pub fn sent(&self) -> Vec<OrderTicket> {
        self.tickets.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderRepository for FakeBroker {
    async fn send_order(&self, ticket: &OrderTicket) -> SubmissionResult<String> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(SubmissionError::Rejected("InputException: insufficient margin".to_string()));
        }
        let mut tickets = self.tickets.lock().unwrap();
        tickets.push(ticket.clone());
        if self.empty_id.load(Ordering::SeqCst) {
            return Ok(String::new());
        }
        Ok(format!("2510180000{:05}", tickets.len()))
    }
}

/// Shared handle to a grid of cells; clones see the same grid.
#[derive(Clone, Default)]
pub struct MemorySheet {
    pub rows: Arc<Mutex<Vec<Vec<String>>>>,
    pub fail_reads: Arc<AtomicBool>,
    pub fail_writes: Arc<AtomicBool>,
    pub connects: Arc<AtomicUsize>,
}

impl MemorySheet {
    pub fn with_rows(rows: &[&[&str]]) -> Self {
        let mut grid = vec![HEADER.iter().map(|c| c.to_string()).collect::<Vec<_>>()];
        grid.extend(rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()));
        let sheet = MemorySheet::default();
        *sheet.rows.lock().unwrap() = grid;
        sheet
    }

    /// Cell at 1-based row and column, empty when absent.
    pub fn set_cell(&self, row: usize, column: usize, value: &str) {
        let mut rows = self.rows.lock().unwrap();
        let cells = &mut rows[row - 1];
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = value.to_string();
    }

    pub fn cell(&self, row: usize, column: usize) -> String {
        self.rows
            .lock()
            .unwrap()
            .get(row - 1)
            .and_then(|r| r.get(column - 1))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SheetRepository for MemorySheet {
    async fn connect(&mut self) -> SheetResult<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_all_rows(&self) -> SheetResult<Vec<Vec<String>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SheetError::Read("quota exceeded".to_string()));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn write_values(&self, row: usize, column: usize, values: &[CellValue]) -> SheetResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SheetError::Write("service unavailable".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        while rows.len() < row {
            rows.push(Vec::new());
        }
        let cells = &mut rows[row - 1];
        let end = column - 1 + values.len();
        if cells.len() < end {
            cells.resize(end, String::new());
        }
        for (offset, value) in values.iter().enumerate() {
            cells[column - 1 + offset] = value.to_string();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    pub entries: Mutex<HashMap<String, LedgerEntry>>,
}

impl MemoryLedger {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl SubmissionLedger for MemoryLedger {
    fn lookup(&self, key: &str) -> LedgerResult<Option<LedgerEntry>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn record(&self, key: &str, entry: LedgerEntry) -> LedgerResult<()> {
        self.entries.lock().unwrap().insert(key.to_string(), entry);
        Ok(())
    }

    fn clear(&self, key: &str) -> LedgerResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

pub fn placer(market: &Arc<FakeMarket>, broker: &Arc<FakeBroker>) -> OrderPlacer {
    OrderPlacer::new(
        SymbolClassifier::new(ClassifierRules::default()),
        PricingResolver::new(market.clone()),
        broker.clone(),
    )
}

pub fn pipeline(market: &Arc<FakeMarket>, broker: &Arc<FakeBroker>, sheet: &MemorySheet) -> SheetOrderPipeline {
    pipeline_with_throttle(market, broker, sheet, Duration::ZERO)
}

pub fn pipeline_with_throttle(
    market: &Arc<FakeMarket>,
    broker: &Arc<FakeBroker>,
    sheet: &MemorySheet,
    throttle: Duration,
) -> SheetOrderPipeline {
    SheetOrderPipeline::new(placer(market, broker), Box::new(sheet.clone()), throttle)
}
