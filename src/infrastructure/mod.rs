pub mod broker;
pub mod http;
pub mod instruments;
pub mod ledger;
pub mod sheets;

pub use broker::auth::{KiteAuthenticator, KiteCredentials};
pub use broker::KiteSession;
pub use http::{HttpTransport, TransportError};
pub use instruments::{InstrumentCatalog, InstrumentRecord};
pub use ledger::JsonFileLedger;
pub use sheets::{CsvSheetRepository, GoogleSheetRepository, ServiceAccountKey};
