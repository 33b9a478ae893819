// src/main.rs - Medicine inventory API server
use anyhow::Context;
use medinv::config::load_config;
use medinv::server;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (this calls load_env_file internally)
    let config = load_config().context("Failed to load configuration")?;

    server::setup_logging(&config)?;
    config.print_startup_info();

    server::run(config).await
}
