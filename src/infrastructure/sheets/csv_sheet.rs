// src/infrastructure/sheets/csv_sheet.rs
// Local CSV file standing in for the order worksheet

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::{SheetError, SheetResult};
use crate::domain::model::CellValue;
use crate::domain::repository::SheetRepository;

pub struct CsvSheetRepository {
    path: PathBuf,
}

impl CsvSheetRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self) -> Result<Vec<Vec<String>>, String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| format!("{}: {}", self.path.display(), e))?;

        reader
            .records()
            .map(|record| {
                record
                    .map(|r| r.iter().map(str::to_string).collect())
                    .map_err(|e| e.to_string())
            })
            .collect()
    }

    fn store(&self, rows: &[Vec<String>]) -> Result<(), String> {
        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&tmp)
                .map_err(|e| e.to_string())?;
            for row in rows {
                writer.write_record(row).map_err(|e| e.to_string())?;
            }
            writer.flush().map_err(|e| e.to_string())?;
        }
        fs::rename(&tmp, &self.path).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl SheetRepository for CsvSheetRepository {
    async fn read_all_rows(&self) -> SheetResult<Vec<Vec<String>>> {
        self.load().map_err(SheetError::Read)
    }

    async fn write_values(&self, row: usize, column: usize, values: &[CellValue]) -> SheetResult<()> {
        if row == 0 || column == 0 {
            return Err(SheetError::InvalidRange(format!(
                "row {} column {} is not 1-based",
                row, column
            )));
        }

        let mut rows = self.load().map_err(SheetError::Write)?;
        if rows.len() < row {
            rows.resize(row, Vec::new());
        }

        let target = &mut rows[row - 1];
        let needed = column - 1 + values.len();
        if target.len() < needed {
            target.resize(needed, String::new());
        }
        for (offset, value) in values.iter().enumerate() {
            target[column - 1 + offset] = value.to_string();
        }

        self.store(&rows).map_err(SheetError::Write)
    }
}
