// src/infrastructure/broker/mod.rs
// Kite Connect brokerage session

pub mod auth;
pub mod dto;

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::domain::errors::{MarketDataError, MarketDataResult, SubmissionError, SubmissionResult};
use crate::domain::model::{InstrumentKey, OrderTicket, QuoteDepth};
use crate::domain::repository::{MarketDataRepository, OrderRepository};
use crate::infrastructure::http::{HttpTransport, TransportError};

pub const DEFAULT_BASE_URL: &str = "https://api.kite.trade";
const KITE_VERSION: &str = "3";

/// Authenticated broker session. Built once per process by
/// [`auth::KiteAuthenticator`] and shared by the quote and order paths.
pub struct KiteSession {
    api_key: String,
    access_token: String,
    base_url: String,
    transport: HttpTransport,
    connected: AtomicBool,
}

impl KiteSession {
    pub fn new(api_key: &str, access_token: &str, base_url: &str, transport: HttpTransport) -> Self {
        Self {
            api_key: api_key.to_string(),
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            connected: AtomicBool::new(true),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Release the session; later calls fail instead of reaching the broker.
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            log::info!("Broker session released");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn auth_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("X-Kite-Version", KITE_VERSION.to_string()),
            (
                "Authorization",
                format!("token {}:{}", self.api_key, self.access_token),
            ),
        ]
    }

    fn quote_url(&self, instruments: &[&InstrumentKey]) -> Result<String, String> {
        let params = instruments.iter().map(|key| ("i", key.to_string()));
        Url::parse_with_params(&format!("{}/quote", self.base_url), params)
            .map(String::from)
            .map_err(|e| e.to_string())
    }

    /// Quote several instruments in one request.
    pub async fn get_quotes(&self, instruments: &[&InstrumentKey]) -> MarketDataResult<Vec<QuoteDepth>> {
        if !self.is_connected() {
            return Err(MarketDataError::Fetch("session is closed".to_string()));
        }

        let url = self.quote_url(instruments).map_err(MarketDataError::Fetch)?;
        let response = self
            .transport
            .get(&url, &self.auth_headers())
            .await
            .map_err(market_data_error)?;

        let body = response.json().map_err(market_data_error)?;
        let data = dto::unwrap_envelope(&body).map_err(MarketDataError::Fetch)?;

        instruments
            .iter()
            .map(|key| dto::parse_quote_depth(data, key))
            .collect()
    }
}

#[async_trait]
impl MarketDataRepository for KiteSession {
    async fn get_quote_depth(&self, instrument: &InstrumentKey) -> MarketDataResult<QuoteDepth> {
        let mut quotes = self.get_quotes(&[instrument]).await?;
        quotes
            .pop()
            .ok_or_else(|| MarketDataError::InvalidFormat(format!("no quote for {}", instrument)))
    }
}

#[async_trait]
impl OrderRepository for KiteSession {
    async fn send_order(&self, ticket: &OrderTicket) -> SubmissionResult<String> {
        if !self.is_connected() {
            return Err(SubmissionError::Request("session is closed".to_string()));
        }

        let form = order_form(ticket);
        let url = format!("{}/orders/regular", self.base_url);
        let response = self
            .transport
            .post_form(&url, &self.auth_headers(), &form)
            .await
            .map_err(|e| match e {
                TransportError::Timeout(after) => {
                    SubmissionError::Timeout(format!("no response after {:?}", after))
                }
                other => SubmissionError::Request(other.to_string()),
            })?;

        let body: Value = response
            .json()
            .map_err(|e| SubmissionError::Request(e.to_string()))?;

        if !response.status.is_success() {
            return Err(SubmissionError::Rejected(dto::error_message(&body)));
        }

        let data = dto::unwrap_envelope(&body).map_err(SubmissionError::Rejected)?;
        dto::parse_order_id(data).ok_or(SubmissionError::MissingOrderId)
    }
}

/// Form body for `/orders/regular`. MARKET orders carry no price field.
fn order_form(ticket: &OrderTicket) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("tradingsymbol", ticket.instrument.symbol.clone()),
        ("exchange", ticket.instrument.exchange.code().to_string()),
        ("transaction_type", ticket.direction.as_str().to_string()),
        ("order_type", ticket.order_type.as_str().to_string()),
        ("quantity", ticket.quantity.to_string()),
        ("product", ticket.product.code().to_string()),
    ];
    if let Some(price) = ticket.limit_price {
        form.push(("price", price.to_string()));
    }
    form.push(("validity", "DAY".to_string()));
    form
}

fn market_data_error(error: TransportError) -> MarketDataError {
    match error {
        TransportError::Timeout(after) => {
            MarketDataError::Timeout(format!("no response after {:?}", after))
        }
        TransportError::Status { status, body } => {
            let message = serde_json::from_str::<Value>(&body)
                .map(|v| dto::error_message(&v))
                .unwrap_or(body);
            MarketDataError::Fetch(format!("HTTP {}: {}", status, message))
        }
        other => MarketDataError::Fetch(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Direction, Exchange, OrderType, Product};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn session() -> KiteSession {
        KiteSession::new("key", "token", "https://api.kite.trade/", HttpTransport::new(Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn quote_url_repeats_instrument_param() {
        let sbin = InstrumentKey::new(Exchange::Equity, "SBIN");
        let option = InstrumentKey::new(Exchange::Derivatives, "TCS25OCT2800PE");
        let url = session().quote_url(&[&sbin, &option]).unwrap();
        assert_eq!(
            url,
            "https://api.kite.trade/quote?i=NSE%3ASBIN&i=NFO%3ATCS25OCT2800PE"
        );
    }

    #[tokio::test]
    async fn auth_header_carries_key_and_token() {
        let headers = session().auth_headers();
        assert!(headers.contains(&("Authorization", "token key:token".to_string())));
        assert!(headers.contains(&("X-Kite-Version", "3".to_string())));
    }

    fn ticket(order_type: OrderType, limit_price: Option<Decimal>) -> OrderTicket {
        OrderTicket {
            instrument: InstrumentKey::new(Exchange::Derivatives, "TCS25OCT2800PE"),
            direction: Direction::Sell,
            quantity: 175,
            product: Product::Margin,
            order_type,
            limit_price,
        }
    }

    #[test]
    fn limit_order_form_carries_price() {
        let form = order_form(&ticket(OrderType::Limit, Some(dec!(42.5))));
        assert_eq!(
            form,
            vec![
                ("tradingsymbol", "TCS25OCT2800PE".to_string()),
                ("exchange", "NFO".to_string()),
                ("transaction_type", "SELL".to_string()),
                ("order_type", "LIMIT".to_string()),
                ("quantity", "175".to_string()),
                ("product", "NRML".to_string()),
                ("price", "42.5".to_string()),
                ("validity", "DAY".to_string()),
            ]
        );
    }

    #[test]
    fn market_order_form_has_no_price() {
        let form = order_form(&ticket(OrderType::Market, None));
        assert!(form.contains(&("order_type", "MARKET".to_string())));
        assert!(form.iter().all(|(name, _)| *name != "price"));
        assert_eq!(form.len(), 7);
    }

    #[tokio::test]
    async fn closed_session_refuses_calls() {
        let session = session();
        session.disconnect();
        let key = InstrumentKey::new(Exchange::Equity, "SBIN");
        assert!(matches!(
            session.get_quote_depth(&key).await,
            Err(MarketDataError::Fetch(_))
        ));
    }
}
