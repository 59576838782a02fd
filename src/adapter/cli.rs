// src/adapter/cli.rs
// Command line surface

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::domain::errors::{AppError, AppResult};
use crate::domain::model::{
    Direction, Exchange, InstrumentKey, OrderRequest, OrderType, PlacementOptions, Product,
};

#[derive(Debug, Parser)]
#[command(name = "sheet_trade", version, about = "Places Kite orders listed in a spreadsheet")]
pub struct Cli {
    /// Load settings from a JSON config file instead of the environment
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Poll the order sheet until Ctrl+C
    Poll,

    /// Place a single order, by default a LIMIT priced from the same side of the book
    Place {
        symbol: String,
        #[arg(value_parser = parse_direction)]
        direction: Direction,
        quantity: u64,
        #[arg(long, value_parser = parse_product)]
        product: Option<Product>,
        /// Send a MARKET order
        #[arg(long, conflicts_with = "price")]
        market: bool,
        /// Limit price to use instead of the best same-side level
        #[arg(long, value_parser = parse_price)]
        price: Option<Decimal>,
        /// Exchange to use instead of the one inferred from the symbol
        #[arg(long, value_parser = parse_exchange)]
        exchange: Option<Exchange>,
    },

    /// Show best levels for EXCHANGE:SYMBOL keys or EXCHANGE SYMBOL pairs
    Quote {
        #[arg(required = true, num_args = 1..)]
        targets: Vec<String>,
        #[arg(long, value_parser = parse_direction)]
        side: Option<Direction>,
    },

    /// Look up an instrument token in the instruments file
    Instrument { exchange: String, symbol: String },

    /// Validate the stored access token or run the login flow
    Login,

    /// Print exchange and default product for a symbol
    Classify { symbol: String },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Poll)
    }
}

impl Command {
    /// The order request a `place` invocation describes.
    pub fn order_request(&self) -> Option<OrderRequest> {
        match self {
            Command::Place {
                symbol,
                direction,
                quantity,
                product,
                ..
            } => Some(OrderRequest {
                symbol: symbol.trim().to_string(),
                direction: *direction,
                quantity: *quantity,
                product: *product,
            }),
            _ => None,
        }
    }

    /// Order type, exchange and price overrides of a `place` invocation.
    pub fn placement_options(&self) -> Option<PlacementOptions> {
        match self {
            Command::Place {
                market,
                price,
                exchange,
                ..
            } => Some(PlacementOptions {
                order_type: if *market { OrderType::Market } else { OrderType::Limit },
                exchange: *exchange,
                price: *price,
            }),
            _ => None,
        }
    }
}

fn parse_direction(s: &str) -> Result<Direction, String> {
    s.parse()
}

fn parse_product(s: &str) -> Result<Product, String> {
    s.parse()
}

fn parse_exchange(s: &str) -> Result<Exchange, String> {
    Exchange::from_code(s).ok_or_else(|| format!("Unknown exchange: {}", s))
}

fn parse_price(s: &str) -> Result<Decimal, String> {
    let price: Decimal = s.trim().parse().map_err(|_| format!("invalid price '{}'", s))?;
    if price <= Decimal::ZERO {
        return Err(format!("price '{}' must be positive", s));
    }
    Ok(price)
}

/// Quote targets are either all `EXCHANGE:SYMBOL` keys or a flat list of
/// exchange/symbol pairs.
pub fn parse_quote_targets(args: &[String]) -> AppResult<Vec<InstrumentKey>> {
    if args.is_empty() {
        return Err(AppError::InvalidInput("No instruments given".to_string()));
    }

    if args.iter().all(|a| a.contains(':')) {
        return args
            .iter()
            .map(|a| a.parse::<InstrumentKey>().map_err(AppError::InvalidInput))
            .collect();
    }

    if args.len() % 2 != 0 {
        return Err(AppError::InvalidInput(
            "Arguments must be in exchange/symbol pairs".to_string(),
        ));
    }

    args.chunks(2)
        .map(|pair| {
            let exchange = Exchange::from_code(&pair[0])
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown exchange: {}", pair[0])))?;
            Ok(InstrumentKey::new(exchange, pair[1].trim()))
        })
        .collect()
}
