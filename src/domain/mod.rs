pub mod errors;
pub mod model;
pub mod repository;
pub mod service;

// Re-export common types for convenience
pub use errors::{
    AppError, AppResult, MarketDataError, MarketDataResult, SheetError, SheetResult,
    SubmissionError, SubmissionResult,
};
pub use model::{
    CellValue, Classification, DepthLevel, Direction, Exchange, InstrumentKey, OrderOutcome,
    OrderRequest, OrderTicket, OrderType, PlacementOptions, Product, QuoteDepth, RowStatus, SheetRow, PLACED_SENTINEL,
};
pub use service::{ClassifierRules, SymbolClassifier};
