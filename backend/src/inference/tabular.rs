use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use shared::SymptomPrediction;

use super::features::FEATURE_COLUMNS;
use super::{InferenceError, ModelLoadError};

/// On-disk form of the fitted classifier, exported from the training
/// pipeline as a YAML artifact.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SymptomModelFile {
    pub version: f32,
    pub feature_columns: Vec<String>,
    pub class_prior: Vec<f64>,
    pub theta: Vec<Vec<f64>>,
    pub var: Vec<Vec<f64>>,
    pub var_smoothing: f64,
}

/// Gaussian naive Bayes over the ten symptom features. Pure read-only data
/// after loading, so it is shared across requests without locking.
#[derive(Clone)]
pub struct SymptomClassifier {
    log_prior: Array1<f64>,
    theta: Array2<f64>,
    var: Array2<f64>,
}

impl SymptomClassifier {
    pub fn load(path: &str) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path)?;
        let file: SymptomModelFile = serde_yaml::from_str(&raw)?;
        if file.feature_columns != FEATURE_COLUMNS {
            return Err(ModelLoadError::Invalid(format!(
                "feature columns {:?} do not match the encoder order",
                file.feature_columns
            )));
        }
        Self::from_params(file)
    }

    pub(crate) fn from_params(file: SymptomModelFile) -> Result<Self, ModelLoadError> {
        let n_classes = file.class_prior.len();
        let n_features = file.feature_columns.len();
        if n_classes == 0 || file.theta.len() != n_classes || file.var.len() != n_classes {
            return Err(ModelLoadError::Invalid(format!(
                "expected {} rows of means and variances",
                n_classes
            )));
        }
        if file
            .theta
            .iter()
            .chain(file.var.iter())
            .any(|row| row.len() != n_features)
        {
            return Err(ModelLoadError::Invalid(format!(
                "expected {} values per feature row",
                n_features
            )));
        }
        if file.class_prior.iter().any(|&p| p <= 0.0) {
            return Err(ModelLoadError::Invalid(
                "class priors must be positive".to_string(),
            ));
        }

        let log_prior = Array1::from_iter(file.class_prior.iter().map(|p| p.ln()));
        let theta =
            Array2::from_shape_vec((n_classes, n_features), file.theta.concat()).map_err(|e| {
                ModelLoadError::Invalid(e.to_string())
            })?;
        let var = Array2::from_shape_vec(
            (n_classes, n_features),
            file.var
                .concat()
                .iter()
                .map(|v| v + file.var_smoothing)
                .collect(),
        )
        .map_err(|e| ModelLoadError::Invalid(e.to_string()))?;

        Ok(Self {
            log_prior,
            theta,
            var,
        })
    }

    /// Class with the highest joint log-likelihood; ties resolve to the
    /// lowest class index.
    pub fn predict(&self, features: &Array1<f64>) -> Result<usize, InferenceError> {
        let scores = self.joint_log_likelihood(features)?;
        let (class, _) = scores.iter().enumerate().fold(
            (0, f64::NEG_INFINITY),
            |(best_class, best), (class, &score)| {
                if score > best {
                    (class, score)
                } else {
                    (best_class, best)
                }
            },
        );
        Ok(class)
    }

    /// Posterior probability per class, normalised with log-sum-exp.
    pub fn predict_proba(&self, features: &Array1<f64>) -> Result<Array1<f64>, InferenceError> {
        let scores = self.joint_log_likelihood(features)?;
        let max = scores.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let shifted = scores.mapv(|s| (s - max).exp());
        let total = shifted.sum();
        Ok(shifted / total)
    }

    /// Runs both classifier operations and reports the probability of the
    /// class that was actually predicted, not the largest probability.
    pub fn assess(&self, features: &Array1<f64>) -> Result<SymptomPrediction, InferenceError> {
        let class = self.predict(features)?;
        let probabilities = self.predict_proba(features)?;
        let confidence = probabilities[class] * 100.0;
        Ok(SymptomPrediction {
            prediction: class as u8,
            confidence: confidence as f32,
        })
    }

    fn joint_log_likelihood(&self, features: &Array1<f64>) -> Result<Array1<f64>, InferenceError> {
        if features.len() != self.theta.ncols() {
            return Err(InferenceError::FeatureShape {
                expected: self.theta.ncols(),
                got: features.len(),
            });
        }

        let mut scores = self.log_prior.clone();
        for class in 0..self.log_prior.len() {
            for (j, &x) in features.iter().enumerate() {
                let mean = self.theta[[class, j]];
                let var = self.var[[class, j]];
                scores[class] += -0.5 * (2.0 * std::f64::consts::PI * var).ln()
                    - (x - mean).powi(2) / (2.0 * var);
            }
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        feature_columns: Vec<String>,
        class_prior: Vec<f64>,
        theta: Vec<Vec<f64>>,
        var: Vec<Vec<f64>>,
    ) -> SymptomModelFile {
        SymptomModelFile {
            version: 1.0,
            feature_columns,
            class_prior,
            theta,
            var,
            var_smoothing: 1e-9,
        }
    }

    fn ten_column_classifier() -> SymptomClassifier {
        SymptomClassifier::from_params(params(
            FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![0.5, 0.5],
            vec![vec![0.0; 10], vec![1.0; 10]],
            vec![vec![0.25; 10], vec![0.25; 10]],
        ))
        .unwrap()
    }

    #[test]
    fn predicts_the_nearer_class() {
        let classifier = ten_column_classifier();
        assert_eq!(classifier.predict(&Array1::ones(10)).unwrap(), 1);
        assert_eq!(classifier.predict(&Array1::zeros(10)).unwrap(), 0);
    }

    #[test]
    fn posterior_sums_to_one() {
        let classifier = ten_column_classifier();
        let proba = classifier.predict_proba(&Array1::ones(10)).unwrap();
        assert!((proba.sum() - 1.0).abs() < 1e-12);
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn confidence_is_probability_of_the_predicted_class() {
        let classifier = ten_column_classifier();
        let features = Array1::ones(10);

        let result = classifier.assess(&features).unwrap();
        let proba = classifier.predict_proba(&features).unwrap();
        assert_eq!(result.prediction, 1);
        assert!((f64::from(result.confidence) - proba[1] * 100.0).abs() < 1e-4);
    }

    #[test]
    fn eighty_percent_posterior_reads_as_eighty() {
        // Single-feature setup tuned so the posterior is exactly [0.2, 0.8]:
        // equal priors and variances, and the class-0 mean placed sqrt(ln 4)
        // further from the observation than the class-1 mean.
        let offset = (4.0f64).ln().sqrt();
        let classifier = SymptomClassifier::from_params(params(
            vec!["breathing".to_string()],
            vec![0.5, 0.5],
            vec![vec![1.0 - offset], vec![1.0]],
            vec![vec![0.5], vec![0.5]],
        ))
        .unwrap();

        let result = classifier.assess(&ndarray::arr1(&[1.0])).unwrap();
        assert_eq!(result.prediction, 1);
        assert!((result.confidence - 80.0).abs() < 1e-3);
    }

    #[test]
    fn assess_is_deterministic() {
        let classifier = ten_column_classifier();
        let features = ndarray::arr1(&[1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);

        let first = classifier.assess(&features).unwrap();
        let second = classifier.assess(&features).unwrap();
        assert_eq!(first.prediction, second.prediction);
        assert_eq!(first.confidence, second.confidence);
    }

    #[test]
    fn rejects_feature_vector_of_wrong_length() {
        let classifier = ten_column_classifier();
        let result = classifier.predict(&Array1::zeros(3));
        assert!(matches!(
            result,
            Err(InferenceError::FeatureShape {
                expected: 10,
                got: 3
            })
        ));
    }

    #[test]
    fn loads_artifact_from_disk() {
        let file = params(
            FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![0.3, 0.7],
            vec![vec![0.2; 10], vec![0.8; 10]],
            vec![vec![0.2; 10], vec![0.2; 10]],
        );
        let path = std::env::temp_dir().join(format!("{}-nb.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, serde_yaml::to_string(&file).unwrap()).unwrap();

        let classifier = SymptomClassifier::load(path.to_str().unwrap()).unwrap();
        let result = classifier.assess(&Array1::ones(10)).unwrap();
        assert!(result.prediction <= 1);
        assert!((0.0..=100.0).contains(&result.confidence));
    }

    #[test]
    fn rejects_artifact_with_reordered_columns() {
        let mut columns: Vec<String> = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.swap(0, 1);
        let file = params(
            columns,
            vec![0.5, 0.5],
            vec![vec![0.0; 10], vec![1.0; 10]],
            vec![vec![0.25; 10], vec![0.25; 10]],
        );
        let path = std::env::temp_dir().join(format!("{}-nb.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, serde_yaml::to_string(&file).unwrap()).unwrap();

        let result = SymptomClassifier::load(path.to_str().unwrap());
        assert!(matches!(result, Err(ModelLoadError::Invalid(_))));
    }

    #[test]
    fn rejects_ragged_parameter_rows() {
        let result = SymptomClassifier::from_params(params(
            FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![0.5, 0.5],
            vec![vec![0.0; 10], vec![1.0; 9]],
            vec![vec![0.25; 10], vec![0.25; 10]],
        ));
        assert!(matches!(result, Err(ModelLoadError::Invalid(_))));
    }
}
