use std::collections::HashMap;

use ndarray::Array1;

/// Column order the symptom classifier was trained with. Encoding must
/// follow this order no matter how the request keys are arranged.
pub const FEATURE_COLUMNS: [&str; 10] = [
    "breathing",
    "fever",
    "cough",
    "soreThroat",
    "hyperTension",
    "abroad",
    "contact",
    "gathering",
    "exposed",
    "family",
];

#[derive(Debug, thiserror::Error)]
#[error("Missing required field: {0}")]
pub struct MissingFieldError(pub String);

/// Maps the questionnaire onto the fixed feature columns: `"Yes"` (exact
/// match) becomes 1.0, any other answer 0.0. Every column must be present.
pub fn encode(answers: &HashMap<String, String>) -> Result<Array1<f64>, MissingFieldError> {
    let mut features = Array1::<f64>::zeros(FEATURE_COLUMNS.len());
    for (index, column) in FEATURE_COLUMNS.iter().enumerate() {
        let answer = answers
            .get(*column)
            .ok_or_else(|| MissingFieldError(column.to_string()))?;
        features[index] = if answer == "Yes" { 1.0 } else { 0.0 };
    }
    Ok(features)
}
