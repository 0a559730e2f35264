//! Draft holdings and the validated portfolio sent to the analysis service.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const ALLOCATION_TOLERANCE: f64 = 0.01;

/// A row of the holdings form. Either field may still be blank.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub allocation: Option<f64>,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, allocation: f64) -> Self {
        Self {
            symbol: symbol.into(),
            allocation: Some(allocation),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.symbol.trim().is_empty() && self.allocation.is_some()
    }
}

/// Wire form of a holding: `{symbol, allocation}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub symbol: String,
    pub allocation: f64,
}

/// Keeps the complete holdings and checks that they add up to 100%.
pub fn validate(holdings: &[Holding]) -> Result<Vec<PortfolioEntry>, ValidationError> {
    let entries: Vec<PortfolioEntry> = holdings
        .iter()
        .filter(|h| h.is_complete())
        .filter_map(|h| {
            h.allocation.map(|allocation| PortfolioEntry {
                symbol: h.symbol.trim().to_uppercase(),
                allocation,
            })
        })
        .collect();

    if entries.is_empty() {
        return Err(ValidationError::NoHoldings);
    }

    if let Some(bad) = entries.iter().find(|e| e.allocation < 0.0) {
        return Err(ValidationError::NegativeAllocation {
            symbol: bad.symbol.clone(),
            allocation: bad.allocation,
        });
    }

    let total: f64 = entries.iter().map(|e| e.allocation).sum();
    if (total - 100.0).abs() > ALLOCATION_TOLERANCE {
        return Err(ValidationError::AllocationSum { total });
    }

    Ok(entries)
}

pub fn symbols(portfolio: &[PortfolioEntry]) -> Vec<String> {
    portfolio.iter().map(|e| e.symbol.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_allocation_short_of_hundred() {
        let err = validate(&[Holding::new("AAPL", 50.0), Holding::new("MSFT", 49.0)]).unwrap_err();
        assert_eq!(err, ValidationError::AllocationSum { total: 99.0 });
        assert!(err.to_string().contains("Current total: 99.00%"));
    }

    #[test]
    fn accepts_even_split() {
        let portfolio = validate(&[Holding::new("AAPL", 50.0), Holding::new("MSFT", 50.0)]).unwrap();
        assert_eq!(portfolio.len(), 2);
        assert_eq!(symbols(&portfolio), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn tolerates_rounding_within_a_hundredth() {
        let holdings = [
            Holding::new("AAPL", 33.33),
            Holding::new("MSFT", 33.33),
            Holding::new("GOOG", 33.335),
        ];
        assert!(validate(&holdings).is_ok());
    }

    #[test]
    fn skips_incomplete_rows_and_normalizes_symbols() {
        let holdings = [
            Holding::new(" tsla ", 100.0),
            Holding {
                symbol: "NVDA".to_string(),
                allocation: None,
            },
            Holding::new("   ", 25.0),
        ];
        let portfolio = validate(&holdings).unwrap();
        assert_eq!(
            portfolio,
            vec![PortfolioEntry {
                symbol: "TSLA".to_string(),
                allocation: 100.0
            }]
        );
    }

    #[test]
    fn empty_form_is_rejected() {
        let holdings = [Holding {
            symbol: String::new(),
            allocation: None,
        }];
        assert_eq!(validate(&holdings), Err(ValidationError::NoHoldings));
    }

    #[test]
    fn negative_allocation_is_rejected() {
        let err = validate(&[Holding::new("AAPL", 110.0), Holding::new("MSFT", -10.0)]).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeAllocation { ref symbol, .. } if symbol == "MSFT"));
    }
}
