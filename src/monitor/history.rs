use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use ta::{indicators::SimpleMovingAverage, Next};

use crate::api::quantwise::Quote;

/// One live observation of a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub observed_at: DateTime<Utc>,
    pub price: f64,
    pub change_percent: f64,
}

impl PricePoint {
    pub fn from_quote(quote: &Quote, observed_at: DateTime<Utc>) -> Self {
        Self {
            observed_at,
            price: quote.price,
            change_percent: quote.change_percent,
        }
    }
}

/// Rolling window of recent prices per symbol, oldest first.
#[derive(Debug, Clone)]
pub struct PriceHistoryStore {
    capacity: usize,
    series: HashMap<String, VecDeque<PricePoint>>,
}

impl PriceHistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            series: HashMap::new(),
        }
    }

    pub fn append(&mut self, symbol: &str, point: PricePoint) {
        let capacity = self.capacity;
        let entries = self
            .series
            .entry(symbol.to_string())
            .or_insert_with(|| VecDeque::with_capacity(capacity));

        while entries.len() >= capacity {
            entries.pop_front();
        }
        entries.push_back(point);
    }

    /// Copy of the symbol's window. Unknown symbols yield an empty vec.
    pub fn get(&self, symbol: &str) -> Vec<PricePoint> {
        self.series
            .get(symbol)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn latest(&self, symbol: &str) -> Option<&PricePoint> {
        self.series.get(symbol).and_then(|entries| entries.back())
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.series.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Clears one symbol, or everything when `symbol` is `None`.
    pub fn reset(&mut self, symbol: Option<&str>) {
        match symbol {
            Some(symbol) => {
                self.series.remove(symbol);
            }
            None => self.series.clear(),
        }
    }

    /// Simple moving average of the last `period` prices.
    pub fn moving_average(&self, symbol: &str, period: usize) -> Option<f64> {
        let entries = self.series.get(symbol)?;
        if period == 0 || entries.len() < period {
            return None;
        }

        let mut sma = SimpleMovingAverage::new(period).ok()?;
        entries.iter().fold(None, |_, p| Some(sma.next(p.price)))
    }
}
