use thiserror::Error;

//errors surfaced by the backtesting library
#[derive(Error, Debug)]
pub enum BacktestError {
    //bad or unknown configuration, raised before any simulation starts
    #[error("configuration error: {0}")]
    Configuration(String),

    //price data missing, empty or malformed
    #[error("data error: {0}")]
    Data(String),

    #[error("insufficient data for {symbol}: have {bars} bars, need at least {required}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        required: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl BacktestError {
    pub fn config(msg: impl Into<String>) -> Self {
        BacktestError::Configuration(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        BacktestError::Data(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BacktestError>;
