mod config;
mod inference;
mod routes;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use config::ModelsConfig;
use inference::image::ImageClassifier;
use inference::tabular::SymptomClassifier;
use routes::{configure_routes, Scratch};
use std::env;
use std::path::PathBuf;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let models_config = ModelsConfig::load().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Model configuration loading failed: {}", e),
        )
    })?;

    let image_classifier = match ImageClassifier::load(&models_config.image) {
        Ok(classifier) => {
            log::info!("Image model loaded from {}", models_config.image.path);
            classifier
        }
        Err(e) => {
            log::error!("Failed to preload image model at startup: {:?}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Image model loading failed: {:?}", e),
            ));
        }
    };

    let symptom_classifier = match SymptomClassifier::load(&models_config.tabular.path) {
        Ok(classifier) => {
            log::info!("Symptom model loaded from {}", models_config.tabular.path);
            classifier
        }
        Err(e) => {
            log::error!("Failed to preload symptom model at startup: {:?}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Symptom model loading failed: {:?}", e),
            ));
        }
    };

    let upload_dir =
        PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()));
    std::fs::create_dir_all(&upload_dir)?;
    let scratch = Scratch { dir: upload_dir };

    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(image_classifier.clone()))
            .app_data(web::Data::new(symptom_classifier.clone()))
            .app_data(web::Data::new(scratch.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
