pub mod quantwise;

#[cfg(test)]
pub(crate) mod fake;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::portfolio::PortfolioEntry;
use quantwise::{HealthStatus, Quote};

/// The external analysis service.
///
/// Responses are passed through as JSON where the caller needs to keep
/// fields it does not model (the snapshot merge relies on this).
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// `POST /api/analyze`: full baseline analysis.
    async fn analyze(&self, portfolio: &[PortfolioEntry]) -> Result<Value, ApiError>;

    /// `POST /api/realtime`: latest quote per symbol.
    async fn fetch_prices(&self, symbols: &[String]) -> Result<BTreeMap<String, Quote>, ApiError>;

    /// `POST /api/analyze-realtime`: partial metrics recomputed at current prices.
    async fn analyze_realtime(
        &self,
        portfolio: &[PortfolioEntry],
        current_prices: &BTreeMap<String, Quote>,
    ) -> Result<Map<String, Value>, ApiError>;

    async fn health(&self) -> Result<HealthStatus, ApiError>;
}
