//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod account;
mod credentials;
mod export;
mod ledger;
pub mod logging;
pub mod migration;
mod status;

pub use account::AccountService;
pub use credentials::CredentialHasher;
pub use export::ExportService;
pub use ledger::{LedgerService, TransferOutcome};
pub use logging::{EntryPoint, EventCount, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use status::{AccountSummary, StatusService, StatusSummary};
