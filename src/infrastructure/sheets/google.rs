// src/infrastructure/sheets/google.rs
// Google Sheets v4 repository authorised with a service account

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use hyper::Method;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::domain::errors::{SheetError, SheetResult};
use crate::domain::model::CellValue;
use crate::domain::repository::SheetRepository;
use crate::infrastructure::http::HttpTransport;
use crate::infrastructure::sheets::{a1_row_range, quote_worksheet};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Fields of a service account key file used for the JWT bearer grant.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file<P: AsRef<Path>>(path: P) -> SheetResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| SheetError::Auth(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| SheetError::Auth(format!("invalid service account file: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

pub struct GoogleSheetRepository {
    spreadsheet_id: String,
    worksheet: String,
    key: ServiceAccountKey,
    transport: HttpTransport,
    access_token: Option<String>,
}

impl GoogleSheetRepository {
    pub fn new(spreadsheet_id: &str, worksheet: &str, key: ServiceAccountKey, transport: HttpTransport) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.to_string(),
            worksheet: worksheet.to_string(),
            key,
            transport,
            access_token: None,
        }
    }

    fn signed_assertion(&self) -> SheetResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| SheetError::Auth(format!("invalid private key: {}", e)))?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| SheetError::Auth(format!("cannot sign assertion: {}", e)))
    }

    async fn authorize(&self) -> SheetResult<String> {
        let form = [
            ("grant_type", JWT_BEARER_GRANT.to_string()),
            ("assertion", self.signed_assertion()?),
        ];
        let response = self
            .transport
            .post_form(&self.key.token_uri, &[], &form)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SheetError::Auth(e.to_string()))?;
        let body = response.json().map_err(|e| SheetError::Auth(e.to_string()))?;

        body.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SheetError::Auth("token response has no access_token".to_string()))
    }

    fn bearer(&self) -> SheetResult<Vec<(&'static str, String)>> {
        let token = self
            .access_token
            .as_ref()
            .ok_or_else(|| SheetError::Auth("not connected".to_string()))?;
        Ok(vec![("Authorization", format!("Bearer {}", token))])
    }

    fn values_url(&self, range: &str, query: &[(&str, &str)]) -> SheetResult<String> {
        let mut url = Url::parse(SHEETS_API).map_err(|e| SheetError::InvalidRange(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::InvalidRange("cannot build sheets URL".to_string()))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(range);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.into())
    }

    /// Read an arbitrary A1 range (rows of text cells).
    pub async fn read_range(&self, range: &str) -> SheetResult<Vec<Vec<String>>> {
        let url = self.values_url(range, &[("majorDimension", "ROWS")])?;
        let response = self
            .transport
            .get(&url, &self.bearer()?)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SheetError::Read(e.to_string()))?;
        let body = response.json().map_err(|e| SheetError::Read(e.to_string()))?;
        Ok(parse_value_rows(&body))
    }
}

/// `values` is absent for an empty range; non-string cells are stringified.
pub fn parse_value_rows(body: &Value) -> Vec<Vec<String>> {
    let Some(rows) = body.get("values").and_then(Value::as_array) else {
        return Vec::new();
    };
    rows.iter()
        .map(|row| {
            row.as_array()
                .map(|cells| {
                    cells
                        .iter()
                        .map(|cell| match cell {
                            Value::String(text) => text.clone(),
                            Value::Null => String::new(),
                            other => other.to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect()
}

fn cell_json(value: &CellValue) -> Value {
    match value {
        CellValue::Text(text) => Value::String(text.clone()),
        CellValue::Number(number) => number
            .to_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(number.to_string())),
    }
}

#[async_trait]
impl SheetRepository for GoogleSheetRepository {
    async fn connect(&mut self) -> SheetResult<()> {
        self.access_token = Some(self.authorize().await?);
        log::debug!("Authorised against spreadsheet {}", self.spreadsheet_id);
        Ok(())
    }

    async fn read_all_rows(&self) -> SheetResult<Vec<Vec<String>>> {
        self.read_range(&quote_worksheet(&self.worksheet)).await
    }

    async fn write_values(&self, row: usize, column: usize, values: &[CellValue]) -> SheetResult<()> {
        let range = a1_row_range(&self.worksheet, row, column, values.len())?;
        let url = self.values_url(&range, &[("valueInputOption", "RAW")])?;
        let payload = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [values.iter().map(cell_json).collect::<Vec<_>>()],
        });

        self.transport
            .send_json(Method::PUT, &url, &self.bearer()?, &payload)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SheetError::Write(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn repo() -> GoogleSheetRepository {
        GoogleSheetRepository::new(
            "sheet-id",
            "Place_Orders",
            ServiceAccountKey {
                client_email: "bot@example.iam.gserviceaccount.com".to_string(),
                private_key: String::new(),
                token_uri: DEFAULT_TOKEN_URI.to_string(),
            },
            HttpTransport::new(Duration::from_secs(1)),
        )
    }

    #[tokio::test]
    async fn values_url_escapes_range() {
        let url = repo()
            .values_url("'Place_Orders'!D2:F2", &[("valueInputOption", "RAW")])
            .unwrap();
        assert!(url.starts_with("https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/"));
        assert!(url.ends_with("?valueInputOption=RAW"));
        assert!(!url.contains(' '));
    }

    #[tokio::test]
    async fn calls_before_connect_are_rejected() {
        assert!(matches!(repo().read_all_rows().await, Err(SheetError::Auth(_))));
    }

    #[test]
    fn value_rows_are_ragged_text() {
        let body = json!({
            "range": "Place_Orders!A1:F3",
            "majorDimension": "ROWS",
            "values": [["Symbol", "Direction", "Qty"], ["SBIN", "BUY", 10], []]
        });
        let rows = parse_value_rows(&body);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["SBIN", "BUY", "10"]);
        assert!(rows[2].is_empty());
        assert!(parse_value_rows(&json!({"range": "A1:A1"})).is_empty());
    }

    #[test]
    fn numbers_are_written_as_numbers() {
        assert_eq!(cell_json(&CellValue::Number(dec!(42.5))), json!(42.5));
        assert_eq!(cell_json(&CellValue::Text("Order_Placed".into())), json!("Order_Placed"));
    }

    #[test]
    fn service_account_defaults_token_uri() {
        let key: ServiceAccountKey = serde_json::from_str(
            r#"{"client_email": "bot@example.com", "private_key": "pem"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }
}
