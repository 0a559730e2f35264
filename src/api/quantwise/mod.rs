pub mod client;
pub mod types;

pub use client::QuantWiseClient;
pub use types::{
    AnalysisResponse, Diversification, HealthStatus, PortfolioMetrics, Quote, RiskAnalysis,
    ValuePoint,
};
