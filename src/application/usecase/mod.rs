pub mod order_usecase;
pub mod pricing_usecase;
pub mod sheet_pipeline_usecase;

// Re-export public API
pub use order_usecase::OrderPlacer;
pub use pricing_usecase::PricingResolver;
pub use sheet_pipeline_usecase::{ledger_key, SheetOrderPipeline, STATUS_COLUMN};
