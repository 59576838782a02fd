// src/infrastructure/sheets/mod.rs
// Tabular data source implementations

pub mod csv_sheet;
pub mod google;

pub use csv_sheet::CsvSheetRepository;
pub use google::{GoogleSheetRepository, ServiceAccountKey};

use crate::domain::errors::{SheetError, SheetResult};

/// Column letters for a 1-based column index (1 -> A, 27 -> AA).
pub fn column_letter(column: usize) -> SheetResult<String> {
    if column == 0 {
        return Err(SheetError::InvalidRange("columns are 1-based".to_string()));
    }
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    Ok(letters.iter().rev().collect())
}

/// A1 range covering `width` cells of one row, e.g. `'Place_Orders'!D2:F2`.
pub fn a1_row_range(worksheet: &str, row: usize, column: usize, width: usize) -> SheetResult<String> {
    if row == 0 || width == 0 {
        return Err(SheetError::InvalidRange(format!(
            "row {} width {} is not addressable",
            row, width
        )));
    }
    let first = column_letter(column)?;
    let last = column_letter(column + width - 1)?;
    Ok(format!("{}!{}{}:{}{}", quote_worksheet(worksheet), first, row, last, row))
}

pub fn quote_worksheet(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}
