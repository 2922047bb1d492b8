pub mod features;
pub mod image;
pub mod preprocess;
pub mod tabular;

/// Failure while invoking a loaded model. Never retried; the router turns
/// it into a 500 for the one request that hit it.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("model invocation failed: {0}")]
    Model(#[from] tch::TchError),
    #[error("model returned no output")]
    EmptyOutput,
    #[error("model returned {got} outputs, expected {expected}")]
    OutputShape { expected: usize, got: usize },
    #[error("feature vector has {got} columns, expected {expected}")]
    FeatureShape { expected: usize, got: usize },
}

/// Failure while loading a model artifact at startup. Fatal: the process
/// does not serve requests without both models.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to load model: {0}")]
    Model(#[from] tch::TchError),
    #[error("model artifact is inconsistent: {0}")]
    Invalid(String),
}

/// Everything that can go wrong between a persisted upload and a label.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Preprocess(#[from] preprocess::PreprocessError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}
