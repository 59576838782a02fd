pub mod dto;
pub mod usecase;

pub use dto::{ApplicationError, CycleReport, RowOutcome};
pub use usecase::{OrderPlacer, PricingResolver, SheetOrderPipeline};
