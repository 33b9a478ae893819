// src/config.rs - Configuration management
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

/// Settings for the sync controller's HTTP client.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Quiet period before a search keystroke triggers a fetch. 0 disables debouncing.
    pub search_debounce_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            workers: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:medicines.db".to_string(),
            max_connections: 5,
            min_connections: 1,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:5174".to_string(),
                "http://127.0.0.1:5173".to_string(),
                "http://127.0.0.1:5174".to_string(),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            search_debounce_ms: 0,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

pub fn load_config() -> Result<Config> {
    load_env_file()?;

    let mut config = if let Ok(config_file) = env::var("CONFIG_FILE") {
        let path = Path::new(&config_file);
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", config_file))?;
        toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", config_file))?
    } else {
        Config::default()
    };

    override_with_env(&mut config)?;

    config.validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("Invalid {}: {:?}", name, raw)),
        Err(_) => Ok(None),
    }
}

fn override_with_env(config: &mut Config) -> Result<()> {
    if let Ok(host) = env::var("MEDINV_HOST") {
        config.server.host = host;
    }
    if let Some(port) = parse_env("MEDINV_PORT")? {
        config.server.port = port;
    }
    if let Some(workers) = parse_env("MEDINV_WORKERS")? {
        config.server.workers = Some(workers);
    }
    if let Ok(url) = env::var("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(max_conn) = parse_env("DATABASE_MAX_CONNECTIONS")? {
        config.database.max_connections = max_conn;
    }
    if let Some(min_conn) = parse_env("DATABASE_MIN_CONNECTIONS")? {
        config.database.min_connections = min_conn;
    }
    if let Ok(origins_str) = env::var("ALLOWED_ORIGINS") {
        config.security.allowed_origins = origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Ok(level) = env::var("RUST_LOG") {
        config.logging.level = level;
    }
    if let Ok(url) = env::var("MEDINV_API_URL") {
        config.client.base_url = url;
    }
    if let Some(timeout) = parse_env("MEDINV_REQUEST_TIMEOUT_SECS")? {
        config.client.request_timeout_secs = timeout;
    }
    if let Some(debounce) = parse_env("MEDINV_SEARCH_DEBOUNCE_MS")? {
        config.client.search_debounce_ms = debounce;
    }

    Ok(())
}

impl Config {
    pub fn load() -> Result<Self> {
        load_config()
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections < self.database.min_connections {
            return Err(anyhow::anyhow!(
                "max_connections ({}) must be >= min_connections ({})",
                self.database.max_connections,
                self.database.min_connections
            ));
        }

        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be at least 1"));
        }

        if !self.client.base_url.starts_with("http://") && !self.client.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "client.base_url must be an http(s) URL (got {:?})",
                self.client.base_url
            ));
        }

        if self.client.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("client.request_timeout_secs must be positive"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        env::var("MEDINV_ENV").map(|v| v == "production").unwrap_or(false)
    }

    pub fn print_startup_info(&self) {
        log::info!("💊 Medicine inventory API starting up...");
        log::info!("🌐 Server: {}:{}", self.server.host, self.server.port);
        log::info!("💾 Database: {}", self.database.url);
        log::info!("📊 Logging: {} level", self.logging.level);

        if !self.is_production() {
            log::warn!("🚧 Running in development mode");
        }
    }
}

pub fn load_env_file() -> Result<()> {
    if let Ok(env_file) = env::var("ENV_FILE") {
        dotenvy::from_filename(&env_file)
            .with_context(|| format!("Failed to load environment file: {}", env_file))?;
    } else if Path::new(".env").exists() {
        dotenvy::dotenv().context("Failed to load .env file")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ENV_KEYS: &[&str] = &[
        "CONFIG_FILE",
        "MEDINV_PORT",
        "MEDINV_API_URL",
        "MEDINV_SEARCH_DEBOUNCE_MS",
        "ALLOWED_ORIGINS",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.client.base_url, "http://localhost:8000");
        assert_eq!(config.client.search_debounce(), Duration::ZERO);
        assert_eq!(config.security.allowed_origins.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.database.max_connections = 1;
        config.database.min_connections = 5;
        assert!(config.validate().is_err());

        config.database.min_connections = 1;
        config.client.base_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());

        config.client.base_url = "https://inventory.example".to_string();
        config.client.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_toml_loading() -> Result<()> {
        clear_env();
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [client]
            base_url = "http://10.0.0.2:8000"
            search_debounce_ms = 250
            "#
        )?;

        env::set_var("CONFIG_FILE", file.path());
        let config = Config::load();
        clear_env();
        let config = config?;

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.client.base_url, "http://10.0.0.2:8000");
        assert_eq!(config.client.search_debounce(), Duration::from_millis(250));
        // unspecified sections keep their defaults
        assert_eq!(config.database.url, "sqlite:medicines.db");
        assert_eq!(config.client.request_timeout_secs, 30);

        Ok(())
    }

    #[test]
    #[serial]
    fn test_env_override() {
        clear_env();
        env::set_var("MEDINV_PORT", "9090");
        env::set_var("MEDINV_API_URL", "http://api.local:9090");
        env::set_var("ALLOWED_ORIGINS", "http://a.local, ,http://b.local");

        let config = Config::load();
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.client.base_url, "http://api.local:9090");
        assert_eq!(config.security.allowed_origins, vec!["http://a.local", "http://b.local"]);
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_is_rejected() {
        clear_env();
        env::set_var("MEDINV_SEARCH_DEBOUNCE_MS", "soon");
        let result = Config::load();
        clear_env();
        assert!(result.is_err());
    }
}
