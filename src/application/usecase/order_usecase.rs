// src/application/usecase/order_usecase.rs
// Classify, price and submit a single order request

use std::sync::Arc;

use crate::application::dto::ApplicationError;
use crate::application::usecase::pricing_usecase::PricingResolver;
use crate::domain::errors::SubmissionError;
use crate::domain::model::{
    Classification, InstrumentKey, OrderOutcome, OrderRequest, OrderTicket, OrderType,
    PlacementOptions,
};
use crate::domain::repository::OrderRepository;
use crate::domain::service::SymbolClassifier;

pub struct OrderPlacer {
    classifier: SymbolClassifier,
    resolver: PricingResolver,
    orders: Arc<dyn OrderRepository>,
}

impl OrderPlacer {
    pub fn new(
        classifier: SymbolClassifier,
        resolver: PricingResolver,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            classifier,
            resolver,
            orders,
        }
    }

    pub fn classifier(&self) -> &SymbolClassifier {
        &self.classifier
    }

    /// Place a DAY limit order priced from the same-side best level.
    pub async fn place(&self, request: &OrderRequest) -> Result<OrderOutcome, ApplicationError> {
        self.place_with(request, &PlacementOptions::default()).await
    }

    /// Place a DAY order, letting `options` pin the exchange, the order type
    /// or the limit price. MARKET orders carry no price and skip the quote.
    pub async fn place_with(
        &self,
        request: &OrderRequest,
        options: &PlacementOptions,
    ) -> Result<OrderOutcome, ApplicationError> {
        let classification = match options.exchange {
            Some(exchange) => Classification {
                exchange,
                default_product: self.classifier.rules().product_for(exchange),
            },
            None => self.classifier.classify(&request.symbol),
        };
        let product = classification.product_for(request.product);
        log::info!(
            "Classified {} as {} with product {}",
            request.symbol,
            classification.exchange,
            product
        );

        let limit_price = match (options.order_type, options.price) {
            (OrderType::Market, _) => None,
            (OrderType::Limit, Some(price)) => Some(price),
            (OrderType::Limit, None) => {
                let level = self
                    .resolver
                    .resolve_limit_price(&classification, &request.symbol, request.direction)
                    .await?;
                Some(level.price)
            }
        };

        let ticket = OrderTicket {
            instrument: InstrumentKey::new(classification.exchange, &request.symbol),
            direction: request.direction,
            quantity: request.quantity,
            product,
            order_type: options.order_type,
            limit_price,
        };

        let order_id = self.orders.send_order(&ticket).await?;
        if order_id.trim().is_empty() {
            return Err(SubmissionError::MissingOrderId.into());
        }

        log::info!(
            "Order placed: {} ({} {} {} {} @ {} {})",
            order_id,
            ticket.order_type,
            ticket.direction,
            ticket.quantity,
            ticket.instrument,
            ticket
                .limit_price
                .map(|p| p.to_string())
                .unwrap_or_else(|| "market".to_string()),
            ticket.product
        );

        Ok(OrderOutcome {
            order_id,
            order_type: ticket.order_type,
            limit_price: ticket.limit_price,
            instrument: ticket.instrument,
            product,
        })
    }
}
