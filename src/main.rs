use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use std::sync::Arc;

mod api;
mod attendance;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod utils;

use attendance::reconciler::Reconciler;
use attendance::store::MySqlPunchStore;
use attendance::upstream::BiometricClient;
use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/health")]
async fn health() -> impl Responder {
    "OK"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance-sync.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;

    if config.biometric_accept_invalid_certs {
        warn!(
            endpoint = %config.biometric_api_url,
            "Certificate verification disabled for the biometric api client"
        );
    }
    let source = BiometricClient::new(
        config.biometric_api_url.clone(),
        config.biometric_client_id.clone(),
        config.biometric_timeout,
        config.biometric_accept_invalid_certs,
    )
    .context("Failed to build biometric api client")?;

    let reconciler = Data::new(Reconciler::new(
        Arc::new(MySqlPunchStore::new(pool)),
        Arc::new(source),
    ));

    let governor = routes::attendance_governor(config.rate_attendance_per_min)
        .context("RATE_ATTENDANCE_PER_MIN yields an unusable rate limit")?;
    let api_prefix = config.api_prefix.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(reconciler.clone())
            .service(health)
            .configure(|cfg| routes::configure(cfg, &api_prefix, &governor))
    })
    .bind(&config.server_addr)?
    .run()
    .await?;

    Ok(())
}
