use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub identity: IdentityConfig,

    pub media: MediaConfig,

    pub mailer: MailerConfig,

    pub quota: QuotaConfig,

    pub security: SecurityConfig,

    pub maintenance: MaintenanceConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (0 = number of CPU cores)
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/snapnest.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8490,
            cors_allowed_origins: vec![
                "http://localhost:8490".to_string(),
                "http://127.0.0.1:8490".to_string(),
            ],
        }
    }
}

/// Settings for the external identity provider whose bearer tokens this
/// backend accepts. The verifier handle is constructed once at startup from
/// these values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Expected `iss` claim.
    pub issuer: String,

    /// Expected `aud` claim.
    pub audience: String,

    /// Shared HMAC secret for HS256 token verification. Providers using
    /// asymmetric keys front this service with a token exchange.
    pub hs256_secret: String,

    /// Emails granted the admin flag when their account is reconciled.
    pub admin_emails: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            issuer: "https://id.example.com".to_string(),
            audience: "snapnest".to_string(),
            hs256_secret: "change-me".to_string(),
            admin_emails: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// When disabled, uploads are rejected instead of forwarded to the CDN.
    pub enabled: bool,

    /// Base URL of the media CDN upload API.
    pub base_url: String,

    pub api_key: String,

    /// Edge length of generated thumbnails, in pixels.
    pub thumbnail_size: u32,

    pub request_timeout_seconds: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://media.example.com/v1".to_string(),
            api_key: "change-me".to_string(),
            thumbnail_size: 400,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    pub enabled: bool,

    /// HTTP mail API endpoint (transactional mail relay).
    pub endpoint: String,

    pub api_key: String,

    pub from_address: String,

    pub from_name: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://mail.example.com/v1/send".to_string(),
            api_key: String::new(),
            from_address: "no-reply@snapnest.app".to_string(),
            from_name: "Snapnest".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Cumulative upload ceiling per host account, in bytes.
    pub max_total_bytes_per_user: i64,

    /// Per-file upload ceiling, in bytes.
    pub max_file_bytes: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_total_bytes_per_user: 1024 * 1024 * 1024,
            max_file_bytes: 10 * 1024 * 1024,
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

    /// Argon2 parallelism (default: 1)
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

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub enabled: bool,

    /// Audit log rows older than this are pruned by the daily job.
    pub audit_retention_days: i64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            audit_retention_days: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            identity: IdentityConfig::default(),
            media: MediaConfig::default(),
            mailer: MailerConfig::default(),
            quota: QuotaConfig::default(),
            security: SecurityConfig::default(),
            maintenance: MaintenanceConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
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
            paths.push(config_dir.join("snapnest").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".snapnest").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.identity.hs256_secret.is_empty() {
            anyhow::bail!("identity.hs256_secret cannot be empty");
        }

        if self.media.enabled && self.media.base_url.is_empty() {
            anyhow::bail!("media.base_url cannot be empty when the media client is enabled");
        }

        if self.quota.max_file_bytes <= 0 {
            anyhow::bail!("quota.max_file_bytes must be positive");
        }

        if self.quota.max_total_bytes_per_user < self.quota.max_file_bytes {
            anyhow::bail!("quota.max_total_bytes_per_user cannot be below quota.max_file_bytes");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_quota_ceilings() {
        let mut config = Config::default();
        config.quota.max_total_bytes_per_user = 1024;
        config.quota.max_file_bytes = 2048;
        assert!(config.validate().is_err());
    }

    #[test]
    fn roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.quota.max_file_bytes, config.quota.max_file_bytes);
    }
}
