use serde::{Deserialize, Serialize};

/// Deployment description of the two model artifacts. Loaded once at
/// startup; the artifacts themselves are opaque pre-trained files.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub version: f32,
    pub image: ImageModelConfig,
    pub tabular: TabularModelConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageModelConfig {
    pub path: String,
    /// Spatial resolution the model was trained at, `[height, width]`.
    pub input_size: [u32; 2],
    pub variant: VariantConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VariantConfig {
    Binary,
    Multiclass { classes: Vec<String> },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TabularModelConfig {
    pub path: String,
}

impl ModelsConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("MODELS_CONFIG").unwrap_or_else(|_| {
            match std::env::var("CARGO_MANIFEST_DIR") {
                Ok(manifest_dir) => format!("{}/../config/models.yaml", manifest_dir),
                Err(_) => "./config/models.yaml".to_string(),
            }
        });
        let config_str = std::fs::read_to_string(&config_path)?;
        let config: ModelsConfig = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }
}
