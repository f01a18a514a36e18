use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod config;
mod db;
mod docs;
mod model;
mod reaper;
mod routes;
mod store;
mod utils;
mod vacation;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::store::{MemoryStore, MySqlStore, VacationRepository};
use crate::utils::calendar::SystemClock;
use crate::vacation::VacationService;
use routes::Limiters;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Clinic vacation booking"
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn VacationRepository>> {
    if let Some(url) = &config.database_url {
        let pool = init_db(url).await?;
        info!("Using MySQL store");
        return Ok(Arc::new(MySqlStore::new(pool)));
    }

    let store = MemoryStore::new();
    match &config.seed_employees {
        Some(path) => {
            let loaded = store.load_seed(path).await?;
            info!(loaded, path = %path.display(), "Seeded in-memory employees");
        }
        None => warn!("No DATABASE_URL or SEED_EMPLOYEES set, starting with an empty directory"),
    }
    Ok(Arc::new(store))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "vacation.log");
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

    let repo = open_store(&config).await?;
    let service = Arc::new(VacationService::new(
        repo,
        Arc::new(SystemClock),
        config.policy(),
    ));

    info!(policy = ?service.policy(), "Booking policy loaded");

    if let Some(days) = config.pending_expiry_days {
        info!(days, "Pending requests expire automatically");
        actix_web::rt::spawn(reaper::run_reaper(service.clone(), config.reaper_interval()));
    }

    let limiters = Limiters::from_config(&config)?;
    let server_addr = config.server_addr.clone();
    let api_prefix = config.api_prefix.clone();
    let service = Data::from(service);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &api_prefix, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await
    .context("Server terminated with an error")
}
