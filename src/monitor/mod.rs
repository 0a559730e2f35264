//! Real-time monitoring: price history, threshold alerts, the poller and the
//! snapshot merge, tied together by [`MonitoringSession`].

pub mod alerts;
pub mod history;
pub mod poller;
pub mod session;
pub mod snapshot;

pub use alerts::{Alert, AlertEngine, Direction};
pub use history::{PriceHistoryStore, PricePoint};
pub use poller::{CycleOutcome, SkipReason};
pub use session::MonitoringSession;
pub use snapshot::{DiversificationLevel, PortfolioSnapshot, SnapshotMerger};
