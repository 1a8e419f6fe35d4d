use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub email: EmailConfig,

    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// `pretty` or `json`
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/compatd.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// `*` allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5012,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for signing access and reset tokens.
    pub jwt_secret: String,

    /// Access token lifetime (default: 168 = 7 days)
    pub token_ttl_hours: i64,

    /// Password reset token lifetime (default: 60)
    pub reset_token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            token_ttl_hours: 24 * 7,
            reset_token_ttl_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransportKind {
    Smtp,
    File,
    /// Render messages and emit them to the log only.
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub transport: EmailTransportKind,

    pub smtp_host: String,

    pub smtp_port: u16,

    pub smtp_username: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub smtp_password: String,

    pub smtp_tls: bool,

    /// Output directory for the file transport.
    pub file_path: String,

    pub from_email: String,

    pub from_name: String,

    /// Base URL used to build links in outgoing mail.
    pub frontend_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: EmailTransportKind::Log,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_tls: true,
            file_path: "data/emails".to_string(),
            from_email: "noreply@compatd.local".to_string(),
            from_name: "Compatd".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            email: EmailConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });

        if dotenvy::dotenv().is_ok() {
            info!("Loaded environment overrides from .env");
        }
        config.apply_env_overrides();

        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets and deployment-specific values may come from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("COMPATD_DATABASE_URL") {
            self.general.database_path = url;
        }

        if let Some(secret) = lookup("COMPATD_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(port) = lookup("COMPATD_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid COMPATD_PORT value: {port}"),
            }
        }

        if let Some(password) = lookup("COMPATD_SMTP_PASSWORD") {
            self.email.smtp_password = password;
        }

        if let Some(url) = lookup("COMPATD_FRONTEND_URL") {
            self.email.frontend_url = url;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("compatd").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".compatd").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes a default config with a freshly generated JWT secret.
    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let mut config = Self::default();
            config.auth.jwt_secret = generate_secret();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            anyhow::bail!("auth.jwt_secret cannot be empty");
        }

        if self.auth.token_ttl_hours <= 0 || self.auth.reset_token_ttl_minutes <= 0 {
            anyhow::bail!("Token lifetimes must be positive");
        }

        if self.email.transport == EmailTransportKind::Smtp && self.email.smtp_host.is_empty() {
            anyhow::bail!("email.smtp_host cannot be empty when the SMTP transport is selected");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("min_db_connections cannot exceed max_db_connections");
        }

        if self.auth.jwt_secret == AuthConfig::default().jwt_secret {
            warn!("Using the built-in JWT secret; set auth.jwt_secret or COMPATD_JWT_SECRET");
        }

        Ok(())
    }
}

/// 64-character hex secret.
#[must_use]
pub fn generate_secret() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5012);
        assert_eq!(config.auth.token_ttl_hours, 168);
        assert_eq!(config.auth.reset_token_ttl_minutes, 60);
        assert_eq!(config.email.transport, EmailTransportKind::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[auth]"));
        assert!(toml_str.contains("[email]"));
        assert!(!toml_str.contains("smtp_password"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [email]
            transport = "file"
            file_path = "/tmp/mail"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.email.transport, EmailTransportKind::File);
        assert_eq!(config.email.file_path, "/tmp/mail");

        assert_eq!(config.server.port, 5012);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("COMPATD_JWT_SECRET", "from-env"),
            ("COMPATD_PORT", "9000"),
            ("COMPATD_DATABASE_URL", "sqlite::memory:"),
        ]);

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.general.database_path, "sqlite::memory:");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "COMPATD_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 5012);
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut config = Config::default();
        config.auth.jwt_secret = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_smtp_without_host() {
        let mut config = Config::default();
        config.email.transport = EmailTransportKind::Smtp;
        config.email.smtp_host = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_generate_secret() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 64);
        assert_ne!(secret, generate_secret());
    }
}
