pub mod cli;
pub mod coordinator;

pub use cli::{parse_quote_targets, Cli, Command};
pub use coordinator::{PollSummary, PollingCoordinator};
