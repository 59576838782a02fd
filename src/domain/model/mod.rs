// src/domain/model/mod.rs
// Core domain models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status text written to a row once its order has been placed.
pub const PLACED_SENTINEL: &str = "Order_Placed";

/// Exchange segment an instrument trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// Cash equities (NSE)
    Equity,
    /// Equity and index futures/options (NFO)
    Derivatives,
    /// Currency futures/options (CDS)
    CurrencyDerivatives,
}

impl Exchange {
    pub fn code(&self) -> &'static str {
        match self {
            Exchange::Equity => "NSE",
            Exchange::Derivatives => "NFO",
            Exchange::CurrencyDerivatives => "CDS",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "NSE" => Some(Exchange::Equity),
            "NFO" => Some(Exchange::Derivatives),
            "CDS" => Some(Exchange::CurrencyDerivatives),
            _ => None,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Settlement/margin treatment of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    /// Cash and carry delivery (CNC)
    Cash,
    /// Carry-forward margin (NRML)
    Margin,
    /// Intraday margin (MIS); only ever chosen explicitly
    Intraday,
}

impl Product {
    pub fn code(&self) -> &'static str {
        match self {
            Product::Cash => "CNC",
            Product::Margin => "NRML",
            Product::Intraday => "MIS",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Product {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CNC" | "CASH" => Ok(Product::Cash),
            "NRML" | "MARGIN" => Ok(Product::Margin),
            "MIS" | "INTRADAY" => Ok(Product::Intraday),
            other => Err(format!("Unknown product: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(Direction::Buy),
            "SELL" => Ok(Direction::Sell),
            other => Err(format!("Unknown direction: {}", other)),
        }
    }
}

/// Exchange and default product inferred from a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub exchange: Exchange,
    pub default_product: Product,
}

impl Classification {
    /// An explicit product always wins over the inferred default.
    pub fn product_for(&self, explicit: Option<Product>) -> Product {
        explicit.unwrap_or(self.default_product)
    }
}

/// Exchange-qualified symbol, rendered as `NSE:SBIN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstrumentKey {
    pub exchange: Exchange,
    pub symbol: String,
}

impl InstrumentKey {
    pub fn new(exchange: Exchange, symbol: &str) -> Self {
        Self {
            exchange,
            symbol: symbol.to_string(),
        }
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.exchange.code(), self.symbol)
    }
}

impl FromStr for InstrumentKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (exchange, symbol) = s
            .split_once(':')
            .ok_or_else(|| format!("Expected EXCHANGE:SYMBOL, got {}", s))?;
        let exchange =
            Exchange::from_code(exchange).ok_or_else(|| format!("Unknown exchange: {}", exchange))?;
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(format!("Missing symbol in {}", s));
        }
        Ok(InstrumentKey::new(exchange, symbol))
    }
}

/// One price level of the order book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthLevel {
    pub price: Decimal,
    pub quantity: u64,
}

/// Top-of-book snapshot for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteDepth {
    pub instrument: InstrumentKey,
    pub best_bid: Option<DepthLevel>,
    pub best_ask: Option<DepthLevel>,
}

impl QuoteDepth {
    /// Level on the same side as the order: bid for BUY, ask for SELL.
    pub fn same_side(&self, direction: Direction) -> Option<DepthLevel> {
        match direction {
            Direction::Buy => self.best_bid,
            Direction::Sell => self.best_ask,
        }
    }
}

/// A request to trade, from a sheet row or a direct call.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: Direction,
    pub quantity: u64,
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    #[default]
    Limit,
    Market,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Limit => "LIMIT",
            OrderType::Market => "MARKET",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overrides for a direct placement. The default is a LIMIT order on the
/// inferred exchange at the same-side best price, which is what sheet rows get.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlacementOptions {
    pub order_type: OrderType,
    pub exchange: Option<Exchange>,
    /// Explicit limit price; skips the quote lookup
    pub price: Option<Decimal>,
}

/// Fully resolved order as sent to the broker. Validity is always DAY.
/// `limit_price` is None exactly for MARKET orders.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTicket {
    pub instrument: InstrumentKey,
    pub direction: Direction,
    pub quantity: u64,
    pub product: Product,
    pub order_type: OrderType,
    pub limit_price: Option<Decimal>,
}

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOutcome {
    pub order_id: String,
    pub order_type: OrderType,
    pub limit_price: Option<Decimal>,
    pub instrument: InstrumentKey,
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    Empty,
    OrderPlaced,
}

impl RowStatus {
    /// Case-insensitive exact match of the placed sentinel; anything else is unplaced.
    pub fn from_cell(cell: &str) -> Self {
        if cell.trim().eq_ignore_ascii_case(PLACED_SENTINEL) {
            RowStatus::OrderPlaced
        } else {
            RowStatus::Empty
        }
    }
}

/// Raw cells of one order row. `row_number` is the 1-based sheet row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetRow {
    pub row_number: usize,
    pub symbol: String,
    pub direction: String,
    pub quantity: String,
    pub status: String,
    pub timestamp: String,
    pub limit_price: String,
}

impl SheetRow {
    /// Build from the cells as returned by the data source; missing trailing cells are empty.
    pub fn from_cells(row_number: usize, cells: &[String]) -> Self {
        let cell = |idx: usize| cells.get(idx).map(|c| c.trim().to_string()).unwrap_or_default();
        Self {
            row_number,
            symbol: cell(0),
            direction: cell(1),
            quantity: cell(2),
            status: cell(3),
            timestamp: cell(4),
            limit_price: cell(5),
        }
    }

    pub fn status(&self) -> RowStatus {
        RowStatus::from_cell(&self.status)
    }
}

/// Value written back into a sheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(Decimal),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CellValue::Text(text) => write!(f, "{}", text),
            CellValue::Number(number) => write!(f, "{}", number),
        }
    }
}
