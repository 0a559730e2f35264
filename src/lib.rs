//! Portfolio monitoring client for the QuantWise analysis service.

pub mod api;
pub mod config;
pub mod error;
pub mod monitor;
pub mod portfolio;
pub mod ui;

pub use config::MonitorConfig;
pub use error::{ApiError, QuantWatchError, ValidationError};
pub use monitor::MonitoringSession;
pub use portfolio::{Holding, PortfolioEntry};
