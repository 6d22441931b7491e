use backtesting::BacktestError;
use market_io::InputError;
use thiserror::Error;

use crate::models::ClassifierError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("train_ratio {train_ratio} splits {n_rows} rows at {split}: {reason}")]
    Split {
        train_ratio: f64,
        n_rows: usize,
        split: usize,
        reason: &'static str,
    },

    #[error("model has not been fitted")]
    NotFitted,

    #[error("classifier failed: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("backtest failed: {0}")]
    Backtest(#[from] BacktestError),
}

pub type Result<T> = std::result::Result<T, Error>;
