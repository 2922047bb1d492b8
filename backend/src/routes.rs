use actix_web::{web, Error, HttpResponse};
use actix_multipart::Multipart;
use serde_json::json;
use uuid::Uuid;
use std::io::Write;
use std::path::{Path, PathBuf};
use log::error;
use shared::SymptomRequest;
use futures::{StreamExt, TryStreamExt};
use crate::inference::features;
use crate::inference::image::ImageClassifier;
use crate::inference::tabular::SymptomClassifier;

/// Scratch location uploads are persisted to before preprocessing. Files
/// are never cleaned up afterwards.
#[derive(Clone)]
pub struct Scratch {
    pub dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file part")]
    NoFilePart,
    #[error("No selected file")]
    NoSelectedFile,
    #[error("failed to persist upload: {0}")]
    Persist(#[from] std::io::Error),
    #[error(transparent)]
    Multipart(#[from] actix_multipart::MultipartError),
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(predict_image)))
        .service(web::resource("/predict-prediction").route(web::post().to(predict_symptoms)));
}

async fn predict_image(
    classifier: web::Data<ImageClassifier>,
    scratch: web::Data<Scratch>,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let path = match save_upload(&scratch.dir, payload).await {
        Ok(path) => path,
        Err(e @ (UploadError::NoFilePart | UploadError::NoSelectedFile)) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": e.to_string() })));
        }
        Err(UploadError::Multipart(e)) => return Err(e.into()),
        Err(UploadError::Persist(e)) => {
            error!("Failed to persist upload: {}", e);
            return Ok(prediction_failure(&e));
        }
    };

    match classifier.predict(&path) {
        Ok(label) => {
            Ok(HttpResponse::Ok().json(json!({ "message": format!("Prediction: {}", label) })))
        }
        Err(e) => {
            error!("Prediction failed for {}: {}", path.display(), e);
            Ok(prediction_failure(&e))
        }
    }
}

async fn predict_symptoms(
    classifier: web::Data<SymptomClassifier>,
    request: web::Json<SymptomRequest>,
) -> HttpResponse {
    let feature_vector = match features::encode(&request.answer) {
        Ok(features) => features,
        Err(e) => return HttpResponse::BadRequest().json(json!({ "message": e.to_string() })),
    };

    match classifier.assess(&feature_vector) {
        Ok(prediction) => HttpResponse::Ok().json(prediction),
        Err(e) => {
            error!("Symptom prediction failed: {}", e);
            prediction_failure(&e)
        }
    }
}

/// Drains the multipart payload, persists the `file` part to scratch
/// storage and returns the path it was written to.
async fn save_upload(dir: &Path, mut payload: Multipart) -> Result<PathBuf, UploadError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = payload.try_next().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            data.write_all(&chunk?)?;
        }
        upload = Some((filename, data));
    }

    let (filename, data) = upload.ok_or(UploadError::NoFilePart)?;
    if filename.is_empty() {
        return Err(UploadError::NoSelectedFile);
    }

    let path = dir.join(format!("{}_{}", Uuid::new_v4(), filename));
    std::fs::write(&path, &data)?;
    Ok(path)
}

fn prediction_failure(cause: &dyn std::fmt::Display) -> HttpResponse {
    HttpResponse::InternalServerError()
        .json(json!({ "message": format!("Error during prediction: {}", cause) }))
}
