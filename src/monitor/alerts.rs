use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use log::info;

use super::history::PricePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Gain,
    Loss,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: u64,
    pub symbol: String,
    pub direction: Direction,
    pub magnitude_percent: f64,
    pub raised_at: DateTime<Utc>,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.direction {
            Direction::Gain => "up",
            Direction::Loss => "down",
        };
        write!(f, "{} {} {:.2}%", self.symbol, verb, self.magnitude_percent)
    }
}

/// Raises an alert for every observation whose move exceeds the threshold.
///
/// Repeated breaches are not suppressed: a symbol that stays above the
/// threshold raises a new alert on every evaluation.
#[derive(Debug, Clone)]
pub struct AlertEngine {
    threshold_percent: f64,
    capacity: usize,
    alerts: VecDeque<Alert>,
    next_id: u64,
}

impl AlertEngine {
    pub fn new(threshold_percent: f64, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            threshold_percent,
            capacity,
            alerts: VecDeque::with_capacity(capacity),
            next_id: 1,
        }
    }

    /// Checks each symbol in ascending order and returns the alerts raised.
    pub fn evaluate(&mut self, prices: &BTreeMap<String, PricePoint>) -> Vec<Alert> {
        let mut raised = Vec::new();

        for (symbol, point) in prices {
            if point.change_percent.abs() <= self.threshold_percent {
                continue;
            }

            let direction = if point.change_percent > 0.0 {
                Direction::Gain
            } else {
                Direction::Loss
            };
            let alert = Alert {
                id: self.next_id,
                symbol: symbol.clone(),
                direction,
                magnitude_percent: point.change_percent.abs(),
                raised_at: point.observed_at,
            };
            self.next_id += 1;

            info!(
                "ALERT: {} (threshold: {:.2}%)",
                alert, self.threshold_percent
            );
            self.push(alert.clone());
            raised.push(alert);
        }

        raised
    }

    fn push(&mut self, alert: Alert) {
        while self.alerts.len() >= self.capacity {
            self.alerts.pop_back();
        }
        self.alerts.push_front(alert);
    }

    /// Removes the alert with `id`. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        match self.alerts.iter().position(|a| a.id == id) {
            Some(index) => self.alerts.remove(index).is_some(),
            None => false,
        }
    }

    /// Newest first.
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe(entries: &[(&str, f64)]) -> BTreeMap<String, PricePoint> {
        entries
            .iter()
            .map(|(symbol, change)| {
                (
                    symbol.to_string(),
                    PricePoint {
                        observed_at: Utc::now(),
                        price: 100.0,
                        change_percent: *change,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn large_gain_raises_one_alert() {
        let mut engine = AlertEngine::new(2.0, 10);
        let raised = engine.evaluate(&observe(&[("AAPL", 3.0)]));

        assert_eq!(raised.len(), 1);
        let alerts = engine.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].symbol, "AAPL");
        assert_eq!(alerts[0].direction, Direction::Gain);
        assert_eq!(alerts[0].magnitude_percent, 3.0);
    }

    #[test]
    fn small_move_is_ignored() {
        let mut engine = AlertEngine::new(2.0, 10);
        assert!(engine.evaluate(&observe(&[("AAPL", 1.5)])).is_empty());
        assert!(engine.evaluate(&observe(&[("AAPL", 2.0)])).is_empty());
        assert!(engine.alerts().is_empty());
    }

    #[test]
    fn negative_move_is_a_loss() {
        let mut engine = AlertEngine::new(2.0, 10);
        engine.evaluate(&observe(&[("TSLA", -4.25)]));
        let alert = &engine.alerts()[0];
        assert_eq!(alert.direction, Direction::Loss);
        assert_eq!(alert.magnitude_percent, 4.25);
        assert_eq!(alert.to_string(), "TSLA down 4.25%");
    }

    #[test]
    fn log_is_capped_and_newest_first() {
        let mut engine = AlertEngine::new(2.0, 10);
        for _ in 0..7 {
            engine.evaluate(&observe(&[("AAPL", 5.0), ("MSFT", -5.0)]));
            let alerts = engine.alerts();
            assert!(alerts.len() <= 10);
            assert!(alerts.windows(2).all(|w| w[0].id > w[1].id));
        }

        let alerts = engine.alerts();
        assert_eq!(alerts.len(), 10);
        assert_eq!(alerts[0].id, 14);
        assert_eq!(alerts[9].id, 5);
    }

    #[test]
    fn repeated_breach_is_not_deduplicated() {
        let mut engine = AlertEngine::new(2.0, 10);
        engine.evaluate(&observe(&[("AAPL", 3.0)]));
        engine.evaluate(&observe(&[("AAPL", 3.0)]));
        assert_eq!(engine.alerts().len(), 2);
    }

    #[test]
    fn dismiss_is_idempotent() {
        let mut engine = AlertEngine::new(2.0, 10);
        engine.evaluate(&observe(&[("AAPL", 3.0), ("MSFT", 3.0)]));
        let id = engine.alerts()[1].id;

        assert!(engine.dismiss(id));
        assert!(!engine.dismiss(id));
        assert_eq!(engine.alerts().len(), 1);
        assert!(engine.alerts().iter().all(|a| a.id != id));
    }
}
