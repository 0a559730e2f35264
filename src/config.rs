use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5001";
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const HISTORY_CAPACITY: usize = 20;
pub const ALERT_CAPACITY: usize = 10;
pub const ALERT_THRESHOLD_PERCENT: f64 = 2.0;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Runtime settings for a monitoring session and its service client.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub api_url: String,
    pub poll_interval: Duration,
    pub history_capacity: usize,
    pub alert_capacity: usize,
    pub alert_threshold_percent: f64,
    pub request_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: POLL_INTERVAL,
            history_capacity: HISTORY_CAPACITY,
            alert_capacity: ALERT_CAPACITY,
            alert_threshold_percent: ALERT_THRESHOLD_PERCENT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl MonitorConfig {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_constants() {
        let config = MonitorConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.alert_capacity, 10);
        assert_eq!(config.alert_threshold_percent, 2.0);
    }

    #[test]
    fn api_url_drops_trailing_slash() {
        let config = MonitorConfig::default().with_api_url("http://analysis:5001/");
        assert_eq!(config.api_url, "http://analysis:5001");
    }
}
