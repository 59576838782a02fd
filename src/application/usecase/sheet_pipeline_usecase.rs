// src/application/usecase/sheet_pipeline_usecase.rs
// Sheet-driven order pipeline: one pass over the order rows per cycle

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use crate::application::dto::parser::{parse_quantity, triage_row, RowTriage};
use crate::application::dto::{ApplicationError, CycleReport, RowOutcome};
use crate::application::usecase::order_usecase::OrderPlacer;
use crate::domain::errors::SheetResult;
use crate::domain::model::{
    CellValue, Direction, InstrumentKey, OrderOutcome, OrderRequest, OrderType, SheetRow,
    PLACED_SENTINEL,
};
use crate::domain::repository::{LedgerEntry, SheetRepository, SubmissionLedger};

/// Column of the status cell; timestamp and limit price follow it.
pub const STATUS_COLUMN: usize = 4;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SheetOrderPipeline {
    placer: OrderPlacer,
    sheet: Box<dyn SheetRepository>,
    ledger: Option<Arc<dyn SubmissionLedger>>,
    row_throttle: Duration,
}

impl SheetOrderPipeline {
    pub fn new(placer: OrderPlacer, sheet: Box<dyn SheetRepository>, row_throttle: Duration) -> Self {
        Self {
            placer,
            sheet,
            ledger: None,
            row_throttle,
        }
    }

    /// Remember submissions whose write-back failed so they are not sent twice.
    pub fn with_ledger(mut self, ledger: Arc<dyn SubmissionLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Run one cycle: reconnect, read every row, process data rows in order.
    pub async fn run_cycle(&mut self) -> SheetResult<CycleReport> {
        log::info!("Polling order sheet...");
        self.sheet.connect().await?;

        let rows = self.sheet.read_all_rows().await?;
        let mut report = CycleReport::default();

        if rows.len() <= 1 {
            log::info!("No data rows found (only header)");
            return Ok(report);
        }

        // rows[0] is the header; sheet rows are 1-based
        for (idx, cells) in rows.iter().enumerate().skip(1) {
            let row = SheetRow::from_cells(idx + 1, cells);
            report.total += 1;

            let (outcome, reached_broker) = self.process_row(&row).await;
            match &outcome {
                RowOutcome::Invalid(reason) => log::warn!("Invalid row: {}", reason),
                RowOutcome::Skipped => log::debug!("Row {} already placed", row.row_number),
                RowOutcome::Placed(placed) => log::info!(
                    "Row {} placed as order {} ({})",
                    row.row_number,
                    placed.order_id,
                    placed.order_type
                ),
                RowOutcome::Failed(e) => {
                    log::error!("Row {} left for next cycle: {}", row.row_number, e)
                }
            }
            report.record(&outcome);

            if reached_broker && !self.row_throttle.is_zero() {
                tokio::time::sleep(self.row_throttle).await;
            }
        }

        log::info!("Cycle done: {}", report);
        Ok(report)
    }

    /// Process one row. The flag reports whether the broker was contacted.
    pub async fn process_row(&self, row: &SheetRow) -> (RowOutcome, bool) {
        let request = match triage_row(row) {
            RowTriage::Invalid(reason) => return (RowOutcome::Invalid(reason), false),
            RowTriage::Skipped => {
                self.forget_write_back(row);
                return (RowOutcome::Skipped, false);
            }
            RowTriage::Pending(request) => request,
        };

        let key = ledger_key(row.row_number, &request);
        if let Some(entry) = self.pending_write_back(&key, row) {
            return (self.retry_write_back(row, &key, &request, entry).await, false);
        }

        log::info!(
            "Placing order for row {}: {} {} {}",
            row.row_number,
            request.symbol,
            request.direction,
            request.quantity
        );

        let placed = match self.placer.place(&request).await {
            Ok(placed) => placed,
            Err(e) => return (RowOutcome::Failed(e), true),
        };

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let outcome = match self.mark_placed(row.row_number, &timestamp, &placed).await {
            Ok(()) => RowOutcome::Placed(placed),
            Err(e) => {
                // The order is live; without a ledger the next cycle submits it again.
                self.remember(&key, &placed, timestamp, row);
                RowOutcome::Failed(e)
            }
        };

        (outcome, true)
    }

    async fn mark_placed(
        &self,
        row_number: usize,
        timestamp: &str,
        placed: &OrderOutcome,
    ) -> Result<(), ApplicationError> {
        let values = [
            CellValue::Text(PLACED_SENTINEL.to_string()),
            CellValue::Text(timestamp.to_string()),
            placed
                .limit_price
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(String::new())),
        ];
        self.sheet
            .write_values(row_number, STATUS_COLUMN, &values)
            .await?;
        Ok(())
    }

    /// Ledger entry still owed a write-back. An entry recorded under a
    /// different status cell is stale and is dropped.
    fn pending_write_back(&self, key: &str, row: &SheetRow) -> Option<LedgerEntry> {
        let ledger = self.ledger.as_ref()?;
        let entry = match ledger.lookup(key) {
            Ok(entry) => entry?,
            Err(e) => {
                log::error!("Failed reading submission ledger: {}", e);
                return None;
            }
        };

        if entry.prior_status != row.status {
            log::warn!(
                "Row {} status changed since order {} was sent; submitting again",
                row.row_number,
                entry.order_id
            );
            self.clear_entry(key);
            return None;
        }
        Some(entry)
    }

    /// A row marked placed no longer needs its ledger entry.
    fn forget_write_back(&self, row: &SheetRow) {
        let Some(ledger) = &self.ledger else {
            return;
        };
        let (Ok(direction), Ok(quantity)) = (row.direction.parse::<Direction>(), parse_quantity(&row.quantity))
        else {
            return;
        };
        let request = OrderRequest {
            symbol: row.symbol.clone(),
            direction,
            quantity,
            product: None,
        };
        let key = ledger_key(row.row_number, &request);
        if let Ok(Some(entry)) = ledger.lookup(&key) {
            log::info!(
                "Row {} marked placed; dropping ledger entry for order {}",
                row.row_number,
                entry.order_id
            );
            self.clear_entry(&key);
        }
    }

    fn clear_entry(&self, key: &str) {
        let Some(ledger) = &self.ledger else {
            return;
        };
        if let Err(e) = ledger.clear(key) {
            log::warn!("Failed clearing ledger entry {}: {}", key, e);
        }
    }

    fn remember(&self, key: &str, placed: &OrderOutcome, timestamp: String, row: &SheetRow) {
        let Some(ledger) = &self.ledger else {
            return;
        };
        let entry = LedgerEntry {
            order_id: placed.order_id.clone(),
            limit_price: placed.limit_price,
            submitted_at: timestamp,
            prior_status: row.status.clone(),
        };
        if let Err(e) = ledger.record(key, entry) {
            log::error!("Failed recording order {} in ledger: {}", placed.order_id, e);
        }
    }

    async fn retry_write_back(
        &self,
        row: &SheetRow,
        key: &str,
        request: &OrderRequest,
        entry: LedgerEntry,
    ) -> RowOutcome {
        log::info!(
            "Row {} already submitted as order {}; retrying status write",
            row.row_number,
            entry.order_id
        );

        let classification = self.placer.classifier().classify(&request.symbol);
        let placed = OrderOutcome {
            order_id: entry.order_id,
            order_type: if entry.limit_price.is_some() {
                OrderType::Limit
            } else {
                OrderType::Market
            },
            limit_price: entry.limit_price,
            instrument: InstrumentKey::new(classification.exchange, &request.symbol),
            product: classification.product_for(request.product),
        };

        if let Err(e) = self.mark_placed(row.row_number, &entry.submitted_at, &placed).await {
            return RowOutcome::Failed(e);
        }

        self.clear_entry(key);
        RowOutcome::Placed(placed)
    }
}

/// Identity of a submission: the row plus the request it carried.
pub fn ledger_key(row_number: usize, request: &OrderRequest) -> String {
    format!(
        "{}|{}|{}|{}",
        row_number,
        request.symbol.to_uppercase(),
        request.direction,
        request.quantity
    )
}
