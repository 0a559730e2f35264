use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::portfolio::PortfolioEntry;

#[derive(Debug, Serialize)]
pub(crate) struct AnalyzeRequest<'a> {
    pub portfolio: &'a [PortfolioEntry],
}

#[derive(Debug, Serialize)]
pub(crate) struct RealtimeRequest<'a> {
    pub symbols: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalyzeRealtimeRequest<'a> {
    pub portfolio: &'a [PortfolioEntry],
    pub current_prices: &'a BTreeMap<String, Quote>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RealtimeResponse {
    pub prices: BTreeMap<String, Quote>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Live quote for one symbol as returned by `/api/realtime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub change_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_market_open: Option<bool>,
}

impl Quote {
    pub fn new(price: f64, change_percent: f64) -> Self {
        Self {
            price,
            change_percent,
            change: None,
            volume: None,
            timestamp: None,
            is_market_open: None,
        }
    }
}

/// Typed view of the `/api/analyze` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub portfolio_metrics: PortfolioMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diversification: Option<Diversification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_analysis: Option<RiskAnalysis>,
    #[serde(default)]
    pub history: Vec<ValuePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var_95: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diversification {
    pub diversification_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector_allocation: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concentration_risk: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub risk_level: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
