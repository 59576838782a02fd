// src/application/usecase/pricing_usecase.rs
// Limit price resolution from live quote depth

use std::sync::Arc;

use crate::domain::errors::{MarketDataError, MarketDataResult};
use crate::domain::model::{Classification, DepthLevel, Direction, InstrumentKey};
use crate::domain::repository::MarketDataRepository;

/// Derives the limit price for an order from top-of-book depth.
///
/// The price is taken from the *same* side as the order: best bid for a
/// BUY, best ask for a SELL. This rests the order alongside existing
/// interest instead of crossing the spread, and every limit price written
/// back to the sheet follows this convention.
pub struct PricingResolver {
    market_data: Arc<dyn MarketDataRepository>,
}

impl PricingResolver {
    pub fn new(market_data: Arc<dyn MarketDataRepository>) -> Self {
        Self { market_data }
    }

    /// Fetch a fresh snapshot and return the same-side best level.
    pub async fn resolve_limit_price(
        &self,
        classification: &Classification,
        symbol: &str,
        direction: Direction,
    ) -> MarketDataResult<DepthLevel> {
        let instrument = InstrumentKey::new(classification.exchange, symbol);
        self.best_level(&instrument, direction).await
    }

    /// Same-side best level for an already qualified instrument.
    pub async fn best_level(
        &self,
        instrument: &InstrumentKey,
        direction: Direction,
    ) -> MarketDataResult<DepthLevel> {
        let depth = self.market_data.get_quote_depth(instrument).await?;

        let level = depth
            .same_side(direction)
            .ok_or_else(|| MarketDataError::MissingDepth {
                instrument: instrument.to_string(),
                side: side_name(direction).to_string(),
            })?;

        log::info!(
            "{} - best {} for {}: {} (qty {})",
            instrument,
            side_name(direction),
            direction,
            level.price,
            level.quantity
        );

        Ok(level)
    }
}

fn side_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Buy => "bid",
        Direction::Sell => "ask",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Exchange, Product, QuoteDepth};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    struct StaticDepth {
        depth: QuoteDepth,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MarketDataRepository for StaticDepth {
        async fn get_quote_depth(&self, instrument: &InstrumentKey) -> MarketDataResult<QuoteDepth> {
            self.requested.lock().unwrap().push(instrument.to_string());
            Ok(QuoteDepth {
                instrument: instrument.clone(),
                ..self.depth.clone()
            })
        }
    }

    fn resolver(bid: Option<DepthLevel>, ask: Option<DepthLevel>) -> (PricingResolver, Arc<StaticDepth>) {
        let repo = Arc::new(StaticDepth {
            depth: QuoteDepth {
                instrument: InstrumentKey::new(Exchange::Equity, "X"),
                best_bid: bid,
                best_ask: ask,
            },
            requested: Mutex::new(Vec::new()),
        });
        (PricingResolver::new(repo.clone()), repo)
    }

    const DERIVATIVE: Classification = Classification {
        exchange: Exchange::Derivatives,
        default_product: Product::Margin,
    };

    #[tokio::test]
    async fn buy_uses_best_bid_and_qualified_key() {
        let (resolver, repo) = resolver(
            Some(DepthLevel { price: dec!(41.9), quantity: 350 }),
            Some(DepthLevel { price: dec!(42.5), quantity: 175 }),
        );

        let level = resolver
            .resolve_limit_price(&DERIVATIVE, "TCS25OCT2800PE", Direction::Buy)
            .await
            .unwrap();

        assert_eq!(level.price, dec!(41.9));
        assert_eq!(level.quantity, 350);
        assert_eq!(repo.requested.lock().unwrap().as_slice(), ["NFO:TCS25OCT2800PE"]);
    }

    #[tokio::test]
    async fn sell_uses_best_ask() {
        let (resolver, _) = resolver(
            Some(DepthLevel { price: dec!(41.9), quantity: 350 }),
            Some(DepthLevel { price: dec!(42.5), quantity: 175 }),
        );

        let level = resolver
            .resolve_limit_price(&DERIVATIVE, "TCS25OCT2800PE", Direction::Sell)
            .await
            .unwrap();

        assert_eq!(level.price, dec!(42.5));
    }

    #[tokio::test]
    async fn missing_side_is_a_failure() {
        let (resolver, _) = resolver(None, Some(DepthLevel { price: dec!(42.5), quantity: 175 }));

        let err = resolver
            .resolve_limit_price(&DERIVATIVE, "TCS25OCT2800PE", Direction::Buy)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            MarketDataError::MissingDepth {
                instrument: "NFO:TCS25OCT2800PE".to_string(),
                side: "bid".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn every_call_fetches_a_new_snapshot() {
        let (resolver, repo) = resolver(Some(DepthLevel { price: dec!(1), quantity: 1 }), None);

        for _ in 0..2 {
            resolver
                .resolve_limit_price(&DERIVATIVE, "NIFTY25NOVFUT", Direction::Buy)
                .await
                .unwrap();
        }

        assert_eq!(repo.requested.lock().unwrap().len(), 2);
    }
}
