use market_io::{ChronoSplit, InputError};
use serde::Serialize;
use tracing::{debug, info};

use super::{accuracy, Classifier, ClassifierError};
use crate::error::{Error, Result};
use crate::features::{FeatureTable, COLUMN_NAMES};

/// Accuracy of a fitted model on both sides of the chronological split
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitReport {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub split_index: usize,
    pub n_train: usize,
    pub n_test: usize,
}

/// Trains a classifier on the chronological prefix of a feature table and
/// serves next-bar predictions from it.
///
/// `split` is `None` until the first successful [`ModelWrapper::fit`].
pub struct ModelWrapper {
    feature_columns: Vec<String>,
    train_ratio: f64,
    classifier: Box<dyn Classifier>,
    split: Option<ChronoSplit>,
}

impl std::fmt::Debug for ModelWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelWrapper")
            .field("feature_columns", &self.feature_columns)
            .field("train_ratio", &self.train_ratio)
            .field("classifier", &self.classifier.name())
            .field("split", &self.split)
            .finish()
    }
}

impl ModelWrapper {
    pub fn new<S: AsRef<str>>(
        feature_columns: &[S],
        train_ratio: f64,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self> {
        if feature_columns.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one feature column is required".to_string(),
            ));
        }
        // written so NaN fails too
        if !(train_ratio > 0.0 && train_ratio < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "train_ratio must be in (0, 1), got {}",
                train_ratio
            )));
        }

        let feature_columns: Vec<String> = feature_columns
            .iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        if let Some(unknown) = feature_columns
            .iter()
            .find(|c| !COLUMN_NAMES.contains(&c.as_str()))
        {
            return Err(InputError::UnknownColumn(unknown.clone()).into());
        }

        Ok(Self {
            feature_columns,
            train_ratio,
            classifier,
            split: None,
        })
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    pub fn is_fitted(&self) -> bool {
        self.split.is_some()
    }

    /// First test row for a table of `n_rows` rows, or a split error when
    /// either side would be empty.
    pub fn split_index(&self, n_rows: usize) -> Result<usize> {
        self.split_for(n_rows).map(|s| s.split)
    }

    fn split_for(&self, n_rows: usize) -> Result<ChronoSplit> {
        let split = ChronoSplit::at_ratio(n_rows, self.train_ratio);
        let reason = if split.split >= n_rows {
            "empty test split"
        } else if split.split == 0 {
            "empty training split"
        } else {
            return Ok(split);
        };
        Err(Error::Split {
            train_ratio: self.train_ratio,
            n_rows,
            split: split.split,
            reason,
        })
    }

    /// Train on rows `[0, split)` and score both splits.
    ///
    /// Refitting discards the previous model.
    pub fn fit(&mut self, table: &FeatureTable) -> Result<FitReport> {
        let split = self.split_for(table.len())?;
        let n_vars = self.feature_columns.len();

        let x_train = table.design_matrix(&self.feature_columns, split.train())?;
        let y_train = &table.targets()[split.train()];

        self.split = None;
        self.classifier.fit(&x_train, n_vars, y_train)?;
        self.split = Some(split);

        let train_pred = check_count(self.classifier.predict(&x_train, n_vars)?, y_train.len())?;
        let test_pred = self.predict_rows(table, split.test())?;

        let report = FitReport {
            train_accuracy: accuracy(&train_pred, y_train),
            test_accuracy: accuracy(&test_pred, &table.targets()[split.test()]),
            split_index: split.split,
            n_train: split.n_train(),
            n_test: split.n_test(),
        };

        info!(
            classifier = self.classifier.name(),
            n_train = report.n_train,
            n_test = report.n_test,
            train_accuracy = report.train_accuracy,
            test_accuracy = report.test_accuracy,
            "model fitted"
        );

        Ok(report)
    }

    /// Predict any contiguous block of rows with the trained classifier
    pub fn predict_rows(
        &self,
        table: &FeatureTable,
        rows: std::ops::Range<usize>,
    ) -> Result<Vec<u8>> {
        if !self.is_fitted() {
            return Err(Error::NotFitted);
        }
        let n_vars = self.feature_columns.len();
        let expected = rows.len();
        let x = table.design_matrix(&self.feature_columns, rows)?;
        check_count(self.classifier.predict(&x, n_vars)?, expected)
    }

    /// Signals for the test split of `table`, computed fresh
    pub fn predict_test(&self, table: &FeatureTable) -> Result<Vec<u8>> {
        if !self.is_fitted() {
            return Err(Error::NotFitted);
        }
        let split = self.split_for(table.len())?;
        self.predict_rows(table, split.test())
    }

    /// 0/1 prediction for the most recent row of `table`
    pub fn predict_latest(&self, table: &FeatureTable) -> Result<u8> {
        if !self.is_fitted() {
            return Err(Error::NotFitted);
        }
        if table.is_empty() {
            return Err(InputError::Empty.into());
        }

        let last = table.len() - 1;
        let signal = self.predict_rows(table, last..table.len())?[0];

        debug!(row = last, signal, "latest prediction");
        Ok(signal)
    }
}

/// One prediction per row, or the classifier misbehaved
fn check_count(predicted: Vec<u8>, expected: usize) -> Result<Vec<u8>> {
    if predicted.len() != expected {
        return Err(ClassifierError::PredictionCount {
            expected,
            actual: predicted.len(),
        }
        .into());
    }
    Ok(predicted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::build_feature_set;
    use crate::models::DecisionTree;
    use chrono::NaiveDate;
    use market_io::PriceSeries;

    fn table(n: usize) -> FeatureTable {
        let start = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + (i as f64 * 0.9).sin() * 4.0 + i as f64 * 0.05)
            .collect();
        build_feature_set(&PriceSeries::from_closes(start, &closes).unwrap()).unwrap()
    }

    fn tree() -> Box<dyn Classifier> {
        Box::new(DecisionTree::new(Some(3), 2))
    }

    /// Predicts the sign of the first feature, and records nothing else.
    struct SignOfFirst {
        fitted: bool,
    }

    impl Classifier for SignOfFirst {
        fn name(&self) -> &'static str {
            "sign_of_first"
        }

        fn fit(&mut self, _: &[f64], _: usize, _: &[u8]) -> std::result::Result<(), ClassifierError> {
            self.fitted = true;
            Ok(())
        }

        fn predict(&self, data: &[f64], n_vars: usize) -> std::result::Result<Vec<u8>, ClassifierError> {
            if !self.fitted {
                return Err(ClassifierError::NotFitted);
            }
            Ok(data.chunks(n_vars).map(|x| u8::from(x[0] > 0.0)).collect())
        }
    }

    /// Fits fine but returns no predictions at all
    struct Silent;

    impl Classifier for Silent {
        fn name(&self) -> &'static str {
            "silent"
        }

        fn fit(&mut self, _: &[f64], _: usize, _: &[u8]) -> std::result::Result<(), ClassifierError> {
            Ok(())
        }

        fn predict(&self, _: &[f64], _: usize) -> std::result::Result<Vec<u8>, ClassifierError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_missing_predictions_are_an_error() {
        let table = table(40);
        assert_eq!(table.len(), 20);
        let mut model = ModelWrapper::new(&["Close"], 0.5, Box::new(Silent)).unwrap();

        assert!(matches!(
            model.fit(&table),
            Err(Error::Classifier(ClassifierError::PredictionCount { expected: 10, actual: 0 }))
        ));

        // bypass fit so the latest-row path itself is exercised
        model.split = Some(ChronoSplit::at_ratio(table.len(), 0.5));
        assert!(matches!(
            model.predict_latest(&table),
            Err(Error::Classifier(ClassifierError::PredictionCount {
                expected: 1,
                actual: 0
            }))
        ));
    }

    #[test]
    fn test_construct_rejects_bad_config() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            ModelWrapper::new(&empty, 0.7, tree()),
            Err(Error::InvalidConfig(_))
        ));
        for ratio in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                ModelWrapper::new(&["Close"], ratio, tree()),
                Err(Error::InvalidConfig(_))
            ));
        }
        assert!(matches!(
            ModelWrapper::new(&["Close", "MACD"], 0.7, tree()),
            Err(Error::Input(InputError::UnknownColumn(_)))
        ));
    }

    #[test]
    fn test_fit_reports_split() {
        let table = table(120);
        let mut model = ModelWrapper::new(&["Close", "SMA_5", "RSI_14"], 0.7, tree()).unwrap();
        let report = model.fit(&table).unwrap();

        assert_eq!(report.split_index, 70);
        assert_eq!(report.n_train, 70);
        assert_eq!(report.n_test, 30);
        assert!((0.0..=1.0).contains(&report.train_accuracy));
        assert!((0.0..=1.0).contains(&report.test_accuracy));
        assert!(model.is_fitted());
    }

    #[test]
    fn test_split_errors() {
        let small = table(22);
        assert_eq!(small.len(), 2);

        let mut model = ModelWrapper::new(&["Close"], 0.3, tree()).unwrap();
        match model.fit(&small) {
            Err(Error::Split { split, reason, .. }) => {
                assert_eq!(split, 0);
                assert_eq!(reason, "empty training split");
            }
            other => panic!("expected split error, got {:?}", other),
        }

        let model = ModelWrapper::new(&["Close"], 0.9, tree()).unwrap();
        assert!(model.split_index(5).is_ok());
        assert!(matches!(model.split_index(1), Err(Error::Split { .. })));
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_predict_before_fit() {
        let table = table(40);
        let model = ModelWrapper::new(&["Close"], 0.7, tree()).unwrap();

        assert!(matches!(model.predict_latest(&table), Err(Error::NotFitted)));
        assert!(matches!(model.predict_test(&table), Err(Error::NotFitted)));
    }

    #[test]
    fn test_predict_latest_uses_last_row() {
        let table = table(60);
        let returns = table.returns();
        let mut model = ModelWrapper::new(
            &["Return"],
            0.5,
            Box::new(SignOfFirst { fitted: false }),
        )
        .unwrap();
        model.fit(&table).unwrap();

        let expected = u8::from(returns[returns.len() - 1] > 0.0);
        assert_eq!(model.predict_latest(&table).unwrap(), expected);
    }

    #[test]
    fn test_predict_test_matches_split() {
        let table = table(60);
        let mut model = ModelWrapper::new(
            &["Return"],
            0.5,
            Box::new(SignOfFirst { fitted: false }),
        )
        .unwrap();
        let report = model.fit(&table).unwrap();
        let signals = model.predict_test(&table).unwrap();

        assert_eq!(signals.len(), report.n_test);
        let expected: Vec<u8> = table.returns()[report.split_index..]
            .iter()
            .map(|r| u8::from(*r > 0.0))
            .collect();
        assert_eq!(signals, expected);
    }
}
