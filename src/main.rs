use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use quotedesk_api::config::AppConfig;
use quotedesk_api::db;
use quotedesk_api::routes::{self, AppContext};
use quotedesk_api::services::agency_settings::FileSettingsStorage;
use quotedesk_api::services::catalog_service::CatalogService;
use quotedesk_api::services::export_service::PlainTextExporter;
use quotedesk_api::services::id_generator::TimeBasedIdGenerator;
use quotedesk_api::services::quotation_service::QuotationService;

fn startup_error(e: impl std::fmt::Display) -> std::io::Error {
    error!("Startup failed: {}", e);
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(startup_error)?;
    info!("Starting quotedesk-api on {}:{}", config.host, config.port);

    let database = db::mongo::connect(&config.mongodb_uri, &config.mongodb_database)
        .await
        .map_err(startup_error)?;
    let settings = FileSettingsStorage::new(&config.settings_dir).map_err(startup_error)?;
    info!("Agency settings stored in {}", settings.dir().display());

    let context = web::Data::new(AppContext::new(
        Arc::new(settings),
        Arc::new(PlainTextExporter),
        Arc::new(TimeBasedIdGenerator::new()),
    ));
    let catalog = web::Data::new(CatalogService::new(database.clone()));
    let quotations = web::Data::new(QuotationService::new(database.clone()));
    let database = web::Data::new(database);
    let jwt_secret = config.jwt_secret.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .app_data(database.clone())
            .app_data(context.clone())
            .app_data(catalog.clone())
            .app_data(quotations.clone())
            .configure(|cfg| routes::configure(cfg, &jwt_secret))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
