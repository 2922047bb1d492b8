use std::path::Path;
use std::sync::{Arc, Mutex};

use ndarray::Array4;
use tch::{CModule, Device, Tensor};

use super::{InferenceError, ModelLoadError, PredictionError};
use crate::config::{ImageModelConfig, VariantConfig};
use crate::inference::preprocess;

const COVID_LABEL: &str = "COVID Detected";
const NO_COVID_LABEL: &str = "No COVID";

/// Output mapping for the deployed model. The binary model emits a single
/// sigmoid scalar, the multi-class model a probability vector over a fixed,
/// ordered class list.
#[derive(Clone)]
pub enum ModelVariant {
    Binary,
    MultiClass { classes: Vec<String> },
}

impl ModelVariant {
    pub fn label_for(&self, output: &[f32]) -> Result<String, InferenceError> {
        match self {
            ModelVariant::Binary => {
                let score = output.first().ok_or(InferenceError::EmptyOutput)?;
                let label = if *score < 0.5 { COVID_LABEL } else { NO_COVID_LABEL };
                Ok(label.to_string())
            }
            ModelVariant::MultiClass { classes } => {
                if output.len() != classes.len() {
                    return Err(InferenceError::OutputShape {
                        expected: classes.len(),
                        got: output.len(),
                    });
                }
                let (index, _) = output.iter().enumerate().fold(
                    (0, f32::NEG_INFINITY),
                    |(best_index, best), (index, &score)| {
                        if score > best {
                            (index, score)
                        } else {
                            (best_index, best)
                        }
                    },
                );
                Ok(classes[index].clone())
            }
        }
    }
}

#[derive(Clone)]
pub struct ImageClassifier {
    module: Arc<Mutex<CModule>>,
    variant: ModelVariant,
    input_size: [u32; 2],
}

impl ImageClassifier {
    pub fn load(config: &ImageModelConfig) -> Result<Self, ModelLoadError> {
        let device = Device::cuda_if_available();
        let module = CModule::load_on_device(&config.path, device)?;
        let variant = match &config.variant {
            VariantConfig::Binary => ModelVariant::Binary,
            VariantConfig::Multiclass { classes } => ModelVariant::MultiClass {
                classes: classes.clone(),
            },
        };
        Ok(Self {
            module: Arc::new(Mutex::new(module)),
            variant,
            input_size: config.input_size,
        })
    }

    /// Full image pipeline: decode and scale the persisted upload, invoke
    /// the model once, map its raw output to a label.
    pub fn predict(&self, path: &Path) -> Result<String, PredictionError> {
        let tensor = preprocess::image_tensor(path, self.input_size)?;
        let output = self.forward(&tensor)?;
        log::info!("Raw prediction output: {:?}", output);
        Ok(self.variant.label_for(&output)?)
    }

    fn forward(&self, tensor: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let shape = tensor.shape();
        let data: Vec<f32> = tensor.iter().copied().collect();
        let input = Tensor::from_slice(&data).view([
            shape[0] as i64,
            shape[1] as i64,
            shape[2] as i64,
            shape[3] as i64,
        ]);
        let output = self.module.lock().unwrap().forward_ts(&[input])?;
        let flat = output.to_kind(tch::Kind::Float).view([-1]);
        (&flat).try_into().map_err(InferenceError::Model)
    }
}
