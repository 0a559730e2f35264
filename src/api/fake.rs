use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::Notify;

use super::quantwise::{HealthStatus, Quote};
use super::AnalysisApi;
use crate::error::ApiError;
use crate::portfolio::PortfolioEntry;

/// Scripted analysis service for session tests.
///
/// A `None` response makes the matching call fail with a 5xx. With the gate
/// closed, `fetch_prices` signals `fetch_started` and then parks until
/// `release` is notified.
#[derive(Default)]
pub(crate) struct FakeAnalysisApi {
    pub analysis: Mutex<Option<Value>>,
    pub quotes: Mutex<Option<BTreeMap<String, Quote>>>,
    pub realtime: Mutex<Option<Map<String, Value>>>,
    pub analyze_calls: AtomicUsize,
    pub price_calls: AtomicUsize,
    pub realtime_calls: AtomicUsize,
    pub gated: AtomicBool,
    pub fetch_started: Notify,
    pub release: Notify,
}

impl FakeAnalysisApi {
    pub fn healthy() -> Self {
        let fake = Self::default();
        fake.set_analysis(Some(baseline_analysis()));
        fake.set_quotes(Some(&[("AAPL", 190.0, 0.5), ("MSFT", 410.0, -0.3)]));
        fake.set_realtime(Some(json!({"portfolio_value": 10_000.0, "portfolio_change": 0.1})));
        fake
    }

    pub fn set_analysis(&self, value: Option<Value>) {
        *self.analysis.lock().unwrap() = value;
    }

    pub fn set_quotes(&self, quotes: Option<&[(&str, f64, f64)]>) {
        *self.quotes.lock().unwrap() = quotes.map(|qs| {
            qs.iter()
                .map(|(symbol, price, change)| (symbol.to_string(), Quote::new(*price, *change)))
                .collect()
        });
    }

    pub fn set_realtime(&self, value: Option<Value>) {
        *self.realtime.lock().unwrap() = value.and_then(|v| match v {
            Value::Object(fields) => Some(fields),
            _ => None,
        });
    }

    pub fn close_gate(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn open_gate(&self) {
        self.gated.store(false, Ordering::SeqCst);
    }

    pub fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    fn unavailable() -> ApiError {
        ApiError::Status {
            status: 503,
            message: "service unavailable".to_string(),
        }
    }
}

pub(crate) fn baseline_analysis() -> Value {
    json!({
        "portfolio_metrics": {
            "expected_return": 0.1432,
            "volatility": 0.2211,
            "sharpe_ratio": 0.56,
            "beta": 1.08
        },
        "diversification": {"diversification_score": 0.42},
        "risk_analysis": {"risk_level": "Moderate", "recommendations": ["Add bonds"]},
        "history": [
            {"date": "2024-04-29", "value": 100.0},
            {"date": "2024-04-30", "value": 101.2}
        ]
    })
}

#[async_trait]
impl AnalysisApi for FakeAnalysisApi {
    async fn analyze(&self, _portfolio: &[PortfolioEntry]) -> Result<Value, ApiError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        let analysis = self.analysis.lock().unwrap().clone();
        analysis.ok_or_else(Self::unavailable)
    }

    async fn fetch_prices(&self, _symbols: &[String]) -> Result<BTreeMap<String, Quote>, ApiError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            self.fetch_started.notify_one();
            self.release.notified().await;
        }
        let quotes = self.quotes.lock().unwrap().clone();
        quotes.ok_or_else(Self::unavailable)
    }

    async fn analyze_realtime(
        &self,
        _portfolio: &[PortfolioEntry],
        _current_prices: &BTreeMap<String, Quote>,
    ) -> Result<Map<String, Value>, ApiError> {
        self.realtime_calls.fetch_add(1, Ordering::SeqCst);
        let realtime = self.realtime.lock().unwrap().clone();
        realtime.ok_or_else(Self::unavailable)
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        Ok(HealthStatus {
            status: "ok".to_string(),
        })
    }
}
