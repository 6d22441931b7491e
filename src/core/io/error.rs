use thiserror::Error;

/// Problems with the price table handed to the pipeline.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("insufficient data: need at least {required} rows, got {actual}")]
    TooFewRows { required: usize, actual: usize },

    #[error("no price data left after cleaning")]
    Empty,

    #[error("invalid close price {value} at row {row}")]
    InvalidPrice { row: usize, value: f64 },

    #[error("non-finite {column} value at row {row}")]
    NonFiniteValue { column: String, row: usize },

    #[error("timestamps must be strictly increasing (row {row})")]
    NotAscending { row: usize },

    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
