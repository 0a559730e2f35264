//! The displayed portfolio snapshot and the merge that keeps it current.
//!
//! A snapshot is created once from the full analysis and then patched by
//! real-time refreshes. Refreshes only carry the fields they recompute, so
//! the merge is shallow: top-level keys present in the refresh replace the
//! stored value, every other key is kept as it was.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::quantwise::{
    AnalysisResponse, Diversification, PortfolioMetrics, Quote, RiskAnalysis, ValuePoint,
};
use crate::api::AnalysisApi;
use crate::error::ApiError;
use crate::portfolio::PortfolioEntry;

const PORTFOLIO_VALUE: &str = "portfolio_value";
const PORTFOLIO_CHANGE: &str = "portfolio_change";

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSnapshot {
    fields: Map<String, Value>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl PortfolioSnapshot {
    /// Builds a snapshot from an `/api/analyze` body, rejecting bodies that
    /// do not carry the analysis shape.
    pub fn from_analysis(body: Value) -> Result<Self, ApiError> {
        AnalysisResponse::deserialize(&body)?;

        match body {
            Value::Object(fields) => Ok(Self {
                fields,
                refreshed_at: None,
            }),
            other => Err(ApiError::UnexpectedResponse(format!(
                "expected a JSON object from /api/analyze, got {}",
                other
            ))),
        }
    }

    /// Shallow merge of a real-time update. Returns the number of keys written.
    ///
    /// `null` values are skipped, so a refresh cannot clear a field.
    pub fn merge(&mut self, update: Map<String, Value>) -> usize {
        let mut written = 0;
        for (key, value) in update {
            if value.is_null() {
                debug!("Ignoring null '{}' in real-time update", key);
                continue;
            }
            self.fields.insert(key, value);
            written += 1;
        }
        self.refreshed_at = Some(Utc::now());
        written
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    fn typed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.fields
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn metrics(&self) -> Option<PortfolioMetrics> {
        self.typed("portfolio_metrics")
    }

    pub fn diversification(&self) -> Option<Diversification> {
        self.typed("diversification")
    }

    pub fn risk_analysis(&self) -> Option<RiskAnalysis> {
        self.typed("risk_analysis")
    }

    pub fn history(&self) -> Vec<ValuePoint> {
        self.typed("history").unwrap_or_default()
    }

    pub fn current_value(&self) -> Option<f64> {
        self.fields.get(PORTFOLIO_VALUE).and_then(Value::as_f64)
    }

    pub fn daily_change_percent(&self) -> Option<f64> {
        self.fields.get(PORTFOLIO_CHANGE).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiversificationLevel {
    High,
    Medium,
    Low,
}

impl DiversificationLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.6 {
            DiversificationLevel::High
        } else if score >= 0.3 {
            DiversificationLevel::Medium
        } else {
            DiversificationLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiversificationLevel::High => "High",
            DiversificationLevel::Medium => "Medium",
            DiversificationLevel::Low => "Low",
        }
    }
}

/// Owns the current snapshot.
///
/// The request half and the apply half are separate so a caller can drop
/// a result that arrives after it stopped caring about it.
#[derive(Debug, Clone, Default)]
pub struct SnapshotMerger {
    current: Option<PortfolioSnapshot>,
}

impl SnapshotMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&PortfolioSnapshot> {
        self.current.as_ref()
    }

    pub fn has_snapshot(&self) -> bool {
        self.current.is_some()
    }

    pub async fn request_baseline<A: AnalysisApi + ?Sized>(
        api: &A,
        portfolio: &[PortfolioEntry],
    ) -> Result<PortfolioSnapshot, ApiError> {
        let body = api.analyze(portfolio).await?;
        PortfolioSnapshot::from_analysis(body)
    }

    pub async fn request_update<A: AnalysisApi + ?Sized>(
        api: &A,
        portfolio: &[PortfolioEntry],
        current_prices: &BTreeMap<String, Quote>,
    ) -> Result<Map<String, Value>, ApiError> {
        api.analyze_realtime(portfolio, current_prices).await
    }

    pub fn install(&mut self, snapshot: PortfolioSnapshot) {
        info!(
            "Baseline snapshot installed with {} field(s)",
            snapshot.fields.len()
        );
        self.current = Some(snapshot);
    }

    /// Applies an update to the current snapshot. Without a baseline the
    /// update is dropped and `false` is returned.
    pub fn apply(&mut self, update: Map<String, Value>) -> bool {
        match self.current.as_mut() {
            Some(snapshot) => {
                let written = snapshot.merge(update);
                debug!("Merged {} real-time field(s) into snapshot", written);
                true
            }
            None => false,
        }
    }

    /// Runs the full analysis and installs the result. On failure the
    /// previous snapshot, if any, is kept.
    ///
    /// Standalone form for callers that own the merger outright.
    /// `MonitoringSession` calls `request_baseline` and `install` itself so
    /// it can drop a result that went stale while the request ran.
    pub async fn bootstrap<A: AnalysisApi + ?Sized>(
        &mut self,
        api: &A,
        portfolio: &[PortfolioEntry],
    ) -> Result<(), ApiError> {
        let snapshot = Self::request_baseline(api, portfolio).await?;
        self.install(snapshot);
        Ok(())
    }

    /// Requests real-time metrics and merges them. On failure the snapshot
    /// is left untouched. Standalone form of `request_update` plus `apply`.
    pub async fn refresh<A: AnalysisApi + ?Sized>(
        &mut self,
        api: &A,
        portfolio: &[PortfolioEntry],
        current_prices: &BTreeMap<String, Quote>,
    ) -> Result<bool, ApiError> {
        let update = Self::request_update(api, portfolio, current_prices).await?;
        Ok(self.apply(update))
    }
}
