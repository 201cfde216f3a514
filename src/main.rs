use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

mod api;
mod config;
mod db;
mod docs;
mod engine;
mod error;
mod model;
mod routes;
mod store;
mod utils;

use config::{Config, StoreBackend};
use db::init_db;
use store::EventStore;
use store::directory::DirectorySource;
use store::memory::MemoryLog;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Staff attendance service"
}

async fn open_backends(config: &Config) -> anyhow::Result<(EventStore, DirectorySource)> {
    match config.store_backend {
        StoreBackend::MySql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let pool = init_db(url).await?;

            Ok((
                EventStore::MySql(pool.clone()),
                DirectorySource::mysql(pool, config.directory_cache_ttl),
            ))
        }
        StoreBackend::Memory => {
            let directory = match &config.directory_seed {
                Some(path) => DirectorySource::from_seed_file(path)?,
                None => {
                    warn!("No DIRECTORY_SEED given; every scan will be refused");
                    DirectorySource::fixed([])
                }
            };

            Ok((EventStore::Memory(MemoryLog::new()), directory))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        backend = ?config.store_backend,
        policy = %config.duplicate_clock_in_policy,
        "Server starting..."
    );

    let (store, directory) = open_backends(&config).await?;
    let store = Data::new(store);
    let directory = Data::new(directory);

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());
    let limiters = routes::RateLimiters::new(&config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(directory.clone())
            .app_data(config_data.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("binding {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
