use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use salestrack::catalog::{MySqlCustomerLookup, MySqlProductLookup, MySqlSubsidiaryLookup};
use salestrack::config::{AppConfig, Config, DatabaseConfig, LogFormat};
use salestrack::middleware::{ErrorLogger, RequestId};
use salestrack::sales::{LoggingEventPublisher, MySqlSaleRepository, SaleService};
use salestrack::{health, sales};

fn init_tracing(app: &AppConfig) {
    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("salestrack={},actix_web=info", app.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.app);
    config.validate().context("Configuration validation failed")?;

    tracing::info!("Starting salestrack");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    DatabaseConfig::migrate(&db_pool).await?;

    let sale_service = Arc::new(
        SaleService::new(
            Arc::new(MySqlSaleRepository::new(db_pool.clone())),
            Arc::new(MySqlCustomerLookup::new(db_pool.clone())),
            Arc::new(MySqlSubsidiaryLookup::new(db_pool.clone())),
            Arc::new(MySqlProductLookup::new(db_pool.clone())),
            Arc::new(LoggingEventPublisher::new()),
        )
        .with_default_page_size(config.app.default_page_size),
    );

    let permissive_cors = config.app.env == "development";
    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        let cors = if permissive_cors {
            Cors::permissive()
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                .allow_any_header()
                .max_age(3600)
        };

        App::new()
            .wrap(ErrorLogger)
            .wrap(RequestId)
            .wrap(cors)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(sale_service.clone()))
            .configure(health::configure)
            .configure(sales::controllers::configure)
    })
    .workers(config.server.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;
    Ok(())
}
