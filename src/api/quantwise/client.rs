use std::collections::BTreeMap;

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::types::{
    AnalyzeRealtimeRequest, AnalyzeRequest, ErrorBody, HealthStatus, Quote, RealtimeRequest,
    RealtimeResponse,
};
use crate::api::AnalysisApi;
use crate::config::MonitorConfig;
use crate::error::ApiError;
use crate::portfolio::PortfolioEntry;

/// HTTP client for the QuantWise analysis backend.
pub struct QuantWiseClient {
    base_url: String,
    client: reqwest::Client,
}

impl QuantWiseClient {
    pub fn new(config: &MonitorConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            base_url: config.api_url.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            warn!("Analysis service returned {}: {}", status, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Pulls the `{"error": "..."}` message the backend sends with 4xx/5xx.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|m| !m.is_empty())
}

#[async_trait]
impl AnalysisApi for QuantWiseClient {
    async fn analyze(&self, portfolio: &[PortfolioEntry]) -> Result<Value, ApiError> {
        self.post("/api/analyze", &AnalyzeRequest { portfolio }).await
    }

    async fn fetch_prices(&self, symbols: &[String]) -> Result<BTreeMap<String, Quote>, ApiError> {
        let response: RealtimeResponse = self
            .post("/api/realtime", &RealtimeRequest { symbols })
            .await?;
        Ok(response.prices)
    }

    async fn analyze_realtime(
        &self,
        portfolio: &[PortfolioEntry],
        current_prices: &BTreeMap<String, Quote>,
    ) -> Result<Map<String, Value>, ApiError> {
        let body = AnalyzeRealtimeRequest {
            portfolio,
            current_prices,
        };
        let value: Value = self.post("/api/analyze-realtime", &body).await?;
        match value {
            Value::Object(fields) => Ok(fields),
            other => Err(ApiError::UnexpectedResponse(format!(
                "expected a JSON object from /api/analyze-realtime, got {}",
                other
            ))),
        }
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = format!("{}/api/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_reads_backend_error_body() {
        let body = r#"{"error": "Total allocation must sum to 100.", "total_allocation": 90}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Total allocation must sum to 100.")
        );
    }

    #[test]
    fn error_message_ignores_non_json_bodies() {
        assert_eq!(error_message("<html>Bad Gateway</html>"), None);
        assert_eq!(error_message(r#"{"error": ""}"#), None);
    }

    #[test]
    fn client_uses_configured_base_url() {
        let config = MonitorConfig::default().with_api_url("http://10.0.0.5:5001/");
        let client = QuantWiseClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://10.0.0.5:5001");
    }
}
