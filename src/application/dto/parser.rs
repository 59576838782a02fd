// src/application/dto/parser.rs
// Triage of raw sheet rows into order requests

use crate::domain::model::{Direction, OrderRequest, RowStatus, SheetRow};

#[derive(Debug, Clone, PartialEq)]
pub enum RowTriage {
    Invalid(String),
    Skipped,
    Pending(OrderRequest),
}

/// Decide what to do with a row. Empty required fields make the row invalid
/// before the status is consulted; a placed row is skipped without parsing
/// its quantity.
pub fn triage_row(row: &SheetRow) -> RowTriage {
    if row.symbol.is_empty() || row.direction.is_empty() || row.quantity.is_empty() {
        return RowTriage::Invalid(format!(
            "row {} is missing symbol, direction or quantity",
            row.row_number
        ));
    }

    if row.status() == RowStatus::OrderPlaced {
        return RowTriage::Skipped;
    }

    let direction = match row.direction.parse::<Direction>() {
        Ok(direction) => direction,
        Err(e) => return RowTriage::Invalid(format!("row {}: {}", row.row_number, e)),
    };

    let quantity = match parse_quantity(&row.quantity) {
        Ok(quantity) => quantity,
        Err(e) => return RowTriage::Invalid(format!("row {}: {}", row.row_number, e)),
    };

    RowTriage::Pending(OrderRequest {
        symbol: row.symbol.clone(),
        direction,
        quantity,
        product: None,
    })
}

/// Parse a quantity cell as a number and truncate it to a positive integer.
pub fn parse_quantity(text: &str) -> Result<u64, String> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", text))?;

    if !value.is_finite() {
        return Err(format!("invalid quantity '{}'", text));
    }

    let truncated = value.trunc();
    if truncated < 1.0 || truncated > u64::MAX as f64 {
        return Err(format!("quantity '{}' is not a positive integer", text));
    }

    Ok(truncated as u64)
}
