use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("no rows to backtest")]
    EmptySeries,

    #[error("{returns} returns but {signals} signals")]
    LengthMismatch { returns: usize, signals: usize },

    #[error("signal at row {row} must be 0 or 1, got {value}")]
    InvalidSignal { row: usize, value: u8 },

    #[error("return at row {row} is not finite")]
    NonFiniteReturn { row: usize },
}
