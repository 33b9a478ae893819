// src/server.rs - HTTP server bootstrap shared by the binary and the integration tests
use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::net::TcpListener;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, DatabaseConfig, SecurityConfig};
use crate::handlers::configure_routes;
use crate::AppState;

pub fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let level = config.logging.level.as_str();
            tracing_subscriber::EnvFilter::new(level)
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

pub async fn create_database_pool(db_config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&db_config.url)
        .with_context(|| format!("Invalid database URL: {}", db_config.url))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", db_config.url))?;

    Ok(pool)
}

pub fn setup_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") {
        log::warn!("⚠️  Using wildcard CORS (*)");
        // wildcard and credentials are mutually exclusive
        return Cors::permissive();
    }

    for origin in allowed_origins.iter().filter(|o| !o.is_empty()) {
        log::debug!("Adding CORS origin: {}", origin);
        cors = cors.allowed_origin(origin);
    }

    cors
}

fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
}

/// Builds the server on an already-bound listener. The returned future must be polled
/// (awaited or spawned) for the server to make progress.
pub fn build_server(
    app_state: Arc<AppState>,
    security: SecurityConfig,
    listener: TcpListener,
    workers: Option<usize>,
) -> anyhow::Result<Server> {
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(setup_cors(&security.allowed_origins))
            .wrap(security_headers())
            .wrap(Logger::default())
            .app_data(web::Data::new(app_state.clone()))
            .configure(configure_routes)
    });

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    let server = server
        .listen(listener)
        .context("Failed to attach listener")?
        .run();

    Ok(server)
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let pool = create_database_pool(&config.database).await?;

    crate::db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    log::info!("Starting server at http://{}", bind_address);

    let app_state = Arc::new(AppState { db_pool: pool });

    build_server(app_state, config.security.clone(), listener, config.server.workers)?
        .await
        .context("Server failed to run")?;

    Ok(())
}
