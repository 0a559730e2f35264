//! Plain-text report of a monitoring session.

use std::fmt::Write;

use chrono::Local;
use num_format::{Locale, ToFormattedString};

use crate::api::AnalysisApi;
use crate::monitor::{Alert, DiversificationLevel, MonitoringSession, PortfolioSnapshot, PricePoint};

const TREND_PERIOD: usize = 5;

pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as i64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}${}.{:02}",
        sign,
        (cents / 100).to_formatted_string(&Locale::en),
        cents % 100
    )
}

pub fn format_change(percent: f64) -> String {
    format!("{:+.2}%", percent)
}

pub fn snapshot_lines(snapshot: &PortfolioSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    let value = match snapshot.current_value() {
        Some(value) => format_currency(value),
        None => "n/a".to_string(),
    };
    match snapshot.daily_change_percent() {
        Some(change) => lines.push(format!("Portfolio value: {} ({})", value, format_change(change))),
        None => lines.push(format!("Portfolio value: {}", value)),
    }

    if let Some(metrics) = snapshot.metrics() {
        let mut line = format!(
            "Expected return {:.2}% | Volatility {:.2}% | Sharpe {:.2}",
            metrics.expected_return * 100.0,
            metrics.volatility * 100.0,
            metrics.sharpe_ratio
        );
        if let Some(beta) = metrics.beta {
            let _ = write!(line, " | Beta {:.2}", beta);
        }
        if let Some(var_95) = metrics.var_95 {
            let _ = write!(line, " | VaR(95) {:.2}%", var_95 * 100.0);
        }
        lines.push(line);
    }

    if let Some(diversification) = snapshot.diversification() {
        let level = DiversificationLevel::from_score(diversification.diversification_score);
        lines.push(format!(
            "Diversification: {} ({:.2})",
            level.as_str(),
            diversification.diversification_score
        ));
    }

    if let Some(risk) = snapshot.risk_analysis() {
        lines.push(format!("Risk level: {}", risk.risk_level));
        for recommendation in &risk.recommendations {
            lines.push(format!("  - {}", recommendation));
        }
    }

    lines
}

pub fn price_line(symbol: &str, latest: Option<&PricePoint>, trend: Option<f64>) -> String {
    let mut line = match latest {
        Some(point) => format!(
            "{:<6} {:>12} {:>8}",
            symbol,
            format_currency(point.price),
            format_change(point.change_percent)
        ),
        None => format!("{:<6} {:>12}", symbol, "waiting"),
    };
    if let Some(sma) = trend {
        let _ = write!(line, "  SMA({}) {}", TREND_PERIOD, format_currency(sma));
    }
    line
}

pub fn alert_line(alert: &Alert) -> String {
    format!(
        "[{}] #{} {}",
        alert.raised_at.with_timezone(&Local).format("%H:%M:%S"),
        alert.id,
        alert
    )
}

pub fn render<A: AnalysisApi + 'static>(session: &MonitoringSession<A>) -> String {
    let mut lines = vec![format!(
        "=== QuantWatch {} [{}] ===",
        Local::now().format("%H:%M:%S"),
        if session.is_active() { "LIVE" } else { "PAUSED" }
    )];

    match session.snapshot() {
        Some(snapshot) => lines.extend(snapshot_lines(&snapshot)),
        None => lines.push("No analysis yet".to_string()),
    }

    let portfolio = session.portfolio();
    if !portfolio.is_empty() {
        lines.push(String::new());
        for entry in &portfolio {
            let latest = session.latest_price(&entry.symbol);
            let trend = session.moving_average(&entry.symbol, TREND_PERIOD);
            lines.push(price_line(&entry.symbol, latest.as_ref(), trend));
        }
    }

    let alerts = session.alerts();
    if !alerts.is_empty() {
        lines.push(String::new());
        lines.push(format!("Alerts ({}):", alerts.len()));
        lines.extend(alerts.iter().map(alert_line));
    }

    if let Some(refreshed_at) = session.snapshot().and_then(|s| s.refreshed_at()) {
        lines.push(format!(
            "Last update: {}",
            refreshed_at.with_timezone(&Local).format("%H:%M:%S")
        ));
    }
    if let Some(error) = session.last_error() {
        lines.push(format!("Last refresh failed: {}", error));
    }

    lines.join("\n")
}
