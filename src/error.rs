use thiserror::Error;

/// Failures talking to the analysis service.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Rejected portfolio input. Raised before any request is sent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please add at least one stock with allocation.")]
    NoHoldings,

    #[error("Allocation for {symbol} must not be negative (got {allocation})")]
    NegativeAllocation { symbol: String, allocation: f64 },

    #[error("Total allocation must equal 100%. Current total: {total:.2}%")]
    AllocationSum { total: f64 },
}

#[derive(Error, Debug)]
pub enum QuantWatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Portfolio analysis failed: {0}")]
    Bootstrap(#[source] ApiError),

    #[error("Real-time refresh failed: {0}")]
    TransientFetch(#[source] ApiError),

    #[error("No baseline analysis; analyze the portfolio before enabling monitoring")]
    NoBaseline,
}
