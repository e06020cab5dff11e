mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod state;
#[cfg(test)]
mod testing;
mod utils;

use crate::config::{AppConfig, AuthProvider, StorageBackend};
use crate::database::{MemoryStore, MongoDB};
use crate::services::{
    CheckoutSettings, FirebaseVerifier, IdentityVerifier, SharedSecretVerifier, StripeClient,
};
use crate::state::AppState;
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;

fn startup_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

async fn build_state(config: &AppConfig) -> Result<AppState, utils::error::AppError> {
    let identity: Arc<dyn IdentityVerifier> = match &config.auth {
        AuthProvider::Firebase { project_id } => {
            log::info!("🔐 Verifying Firebase ID tokens for project {}", project_id);
            Arc::new(FirebaseVerifier::new(project_id.clone())?)
        }
        AuthProvider::SharedSecret { secret } => {
            log::warn!("⚠️  Using shared-secret tokens (development only)");
            Arc::new(SharedSecretVerifier::new(secret))
        }
    };

    let payments = Arc::new(StripeClient::new(&config.payments)?);
    let checkout = CheckoutSettings {
        currency: config.payments.currency.clone(),
        product_name: config.payments.product_name.clone(),
        client_url: config.payments.client_url.clone(),
    };

    let state = match &config.storage {
        StorageBackend::MongoDB { uri, database } => {
            log::info!("📊 Database: {}", database);
            let db = MongoDB::new(uri, database).await?;
            log::info!("✅ MongoDB connected successfully");
            AppState::with_store(Arc::new(db), identity, payments, checkout, config.max_page_limit)
        }
        StorageBackend::Memory => {
            log::warn!("⚠️  Using in-memory storage, data is lost on restart");
            AppState::with_store(
                Arc::new(MemoryStore::new()),
                identity,
                payments,
                checkout,
                config.max_page_limit,
            )
        }
    };

    Ok(state)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(startup_error)?;

    log::info!("🚀 Starting RedPulse server...");

    let state = web::Data::new(build_state(&config).await.map_err(startup_error)?);
    let allowed_origins = config.allowed_origins.clone();

    log::info!("🌐 Server starting on {}:{}", config.host, config.port);
    log::info!(
        "📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json",
        config.host,
        config.port
    );

    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
