//! Next-bar direction classification over daily OHLCV bars, with a
//! shift-by-one backtest of the resulting long/flat signal.

pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;

pub use error::{Error, Result};
pub use features::{build_feature_set, FeatureRow, FeatureTable, COLUMN_NAMES, FEATURE_COLUMNS};
pub use models::{
    Classifier, ClassifierError, ClassifierKind, ClassifierParams, FitReport, ModelWrapper,
};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineReport};
