use anyhow::Result;
use clap::Parser;
use nextbar::{ClassifierKind, ClassifierParams, PipelineConfig, COLUMN_NAMES, FEATURE_COLUMNS};
use serde::Deserialize;

/// Configuration for the next-bar direction study
#[derive(Debug, Clone, Deserialize, Parser)]
#[command(name = "try_next_bar")]
#[command(about = "Next-bar direction classifier with a long/flat backtest")]
#[serde(default)]
pub struct Config {
    /// Path to an OHLCV CSV file (Date and Close columns required)
    #[arg(value_name = "DATA_FILE")]
    pub data_file: Option<String>,

    /// TOML file with the same keys; DATA_FILE on the command line wins
    #[arg(long = "config", value_name = "FILE")]
    #[serde(skip)]
    pub config_file: Option<String>,

    /// Instrument label used in the console summary
    #[arg(long, default_value = "ASSET")]
    pub symbol: String,

    /// Comma-separated model inputs
    #[arg(long, value_delimiter = ',', default_value = "Close,SMA_5,SMA_20,Vol_10,RSI_14")]
    pub feature_columns: Vec<String>,

    /// Fraction of feature rows used for training (0, 1)
    #[arg(long, default_value_t = 0.7)]
    pub train_ratio: f64,

    /// forest, tree or logistic
    #[arg(long, default_value_t = ClassifierKind::Forest)]
    pub classifier: ClassifierKind,

    /// Tree depth limit; unlimited when omitted
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Smallest node the trees will split
    #[arg(long, default_value_t = 2)]
    pub min_samples_split: usize,

    /// Number of trees in the forest
    #[arg(long, default_value_t = 100)]
    pub n_trees: usize,

    /// Seed for bootstrap and feature sampling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Gradient descent step for logistic regression
    #[arg(long, default_value_t = 0.1)]
    pub learning_rate: f64,

    /// Gradient descent passes for logistic regression
    #[arg(long, default_value_t = 500)]
    pub epochs: usize,

    /// Annual risk-free rate for the Sharpe ratio
    #[arg(long, default_value_t = 0.0)]
    pub risk_free_rate: f64,

    /// Directory for report files
    #[arg(long, default_value = "results/")]
    pub output_path: String,
}

impl Default for Config {
    fn default() -> Self {
        let params = ClassifierParams::default();
        Self {
            data_file: None,
            config_file: None,
            symbol: "ASSET".to_string(),
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            train_ratio: 0.7,
            classifier: params.kind,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            n_trees: params.n_trees,
            seed: params.seed,
            learning_rate: params.learning_rate,
            epochs: params.epochs,
            risk_free_rate: 0.0,
            output_path: "results/".to_string(),
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.data_file.as_deref().is_none_or(str::is_empty) {
            anyhow::bail!("a data file is required, either as DATA_FILE or in the config file");
        }

        if self.feature_columns.is_empty() {
            anyhow::bail!("at least one feature column is required");
        }

        if let Some(col) = self
            .feature_columns
            .iter()
            .find(|c| !COLUMN_NAMES.contains(&c.as_str()))
        {
            anyhow::bail!(
                "unknown feature column '{}', expected one of {}",
                col,
                COLUMN_NAMES.join(", ")
            );
        }

        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            anyhow::bail!("train_ratio must be in range (0, 1), got {}", self.train_ratio);
        }

        if self.n_trees == 0 {
            anyhow::bail!("n_trees must be greater than 0");
        }

        if self.min_samples_split < 2 {
            anyhow::bail!("min_samples_split must be at least 2");
        }

        if !(self.learning_rate > 0.0) {
            anyhow::bail!("learning_rate must be positive, got {}", self.learning_rate);
        }

        if !self.risk_free_rate.is_finite() {
            anyhow::bail!("risk_free_rate must be finite");
        }

        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn data_file(&self) -> &str {
        self.data_file.as_deref().unwrap_or_default()
    }

    pub fn classifier_params(&self) -> ClassifierParams {
        ClassifierParams {
            kind: self.classifier,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            n_trees: self.n_trees,
            seed: self.seed,
            learning_rate: self.learning_rate,
            epochs: self.epochs,
            ..ClassifierParams::default()
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            feature_columns: self.feature_columns.clone(),
            train_ratio: self.train_ratio,
            classifier: self.classifier_params(),
            risk_free_rate: self.risk_free_rate,
        }
    }
}
