use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body of `POST /predict-prediction`. The questionnaire arrives as a free
/// map so that a missing question surfaces as an explicit validation error
/// in the feature encoder instead of a deserialization failure.
#[derive(Serialize, Deserialize, Clone)]
pub struct SymptomRequest {
    pub answer: HashMap<String, String>,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct SymptomPrediction {
    pub prediction: u8,
    pub confidence: f32,
}
