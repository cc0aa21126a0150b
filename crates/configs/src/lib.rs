use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// gRPC listener port; defaults to `port + 1`.
    #[serde(default)]
    pub grpc_port: Option<u16>,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, grpc_port: None, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `compact` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SeedCustomer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_seed_customers")]
    pub customers: Vec<SeedCustomer>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { enabled: true, customers: default_seed_customers() }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }
fn default_log_format() -> String { "compact".into() }

fn default_seed_customers() -> Vec<SeedCustomer> {
    [
        ("momo", "momo@gmail.com"),
        ("moha", "moha@gmail.com"),
        ("zakia", "zakia@gmail.com"),
        ("ali", "ali@gmail.com"),
    ]
    .into_iter()
    .map(|(name, email)| SeedCustomer { name: name.into(), email: email.into() })
    .collect()
}

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/customers.db?mode=rwc";

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml`; when the file does not exist, build the config from
    /// `SERVER_HOST`, `SERVER_PORT`, `GRPC_PORT` and `DATABASE_URL` instead.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => Self::from_env(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn from_env() -> Self {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        cfg.server.grpc_port = std::env::var("GRPC_PORT").ok().and_then(|p| p.parse::<u16>().ok());
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        // 归一化 database（支持从环境变量填充 URL）
        self.database.normalize_from_env();
        self.database.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

fn is_missing_file(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.grpc_port {
            Some(0) => return Err(anyhow!("server.grpc_port must be in 1..=65535")),
            Some(p) if p == self.port => {
                return Err(anyhow!("server.grpc_port must differ from server.port"));
            }
            Some(_) => {}
            None => {
                let next = self.port.checked_add(1).ok_or_else(|| {
                    anyhow!("server.grpc_port must be set when server.port is 65535")
                })?;
                self.grpc_port = Some(next);
            }
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }

    /// gRPC port after normalization.
    pub fn grpc_port(&self) -> u16 {
        self.grpc_port.unwrap_or_else(|| self.port.saturating_add(1))
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // 若 TOML 中未提供 URL，则尝试从环境变量填充，最后回落到本地 SQLite 文件
        if self.url.trim().is_empty() {
            self.url = std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        let supported = ["postgresql://", "postgres://", "sqlite:"];
        if !supported.iter().any(|p| lower.starts_with(p)) {
            return Err(anyhow!(
                "database.url must start with postgres://, postgresql:// or sqlite:"
            ));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        match self.format.to_ascii_lowercase().as_str() {
            "compact" | "json" => Ok(()),
            other => Err(anyhow!("logging.format must be compact or json, got {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [database]
        url = "sqlite::memory:"
        max_connections = 1

        [logging]
        format = "json"

        [seed]
        enabled = false
    "#;

    #[test]
    fn parses_sample_and_fills_defaults() -> Result<()> {
        let mut cfg = load_from_str(SAMPLE)?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.grpc_port(), 9001);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.database.min_connections, 1);
        assert!(cfg.database.run_migrations);
        assert_eq!(cfg.logging.format, "json");
        assert!(!cfg.seed.enabled);
        assert_eq!(cfg.seed.customers.len(), 4);
        Ok(())
    }

    #[test]
    fn rejects_unknown_database_scheme() {
        let db = DatabaseConfig { url: "mysql://localhost/db".into(), ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_conflicting_ports() {
        let mut server = ServerConfig { grpc_port: Some(8080), ..Default::default() };
        assert!(server.normalize().is_err());
    }

    #[test]
    fn max_port_requires_explicit_grpc_port() {
        let mut server = ServerConfig { port: 65535, ..Default::default() };
        assert!(server.normalize().is_err());
        let mut server = ServerConfig { port: 65535, grpc_port: Some(50051), ..Default::default() };
        assert!(server.normalize().is_ok());
    }

    #[test]
    fn rejects_unknown_log_format() {
        let cfg = LoggingConfig { format: "pretty".into() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_is_detected() {
        let err = load_from_file("/nonexistent/customer-hub.toml").unwrap_err();
        assert!(is_missing_file(&err));
    }
}
