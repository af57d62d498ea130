use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Deployment environment. Only "dev" permits running without
    /// configured signing key material.
    pub environment: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/accountd.db".to_string(),
            log_level: "info".to_string(),
            environment: "dev".to_string(),
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
            port: 8080,
            cors_allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
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

    /// Issuer claim embedded in tokens and enforced on verification.
    pub jwt_issuer: String,

    /// Key identifier published in the JWKS document and in token headers.
    pub jwt_kid: String,

    /// Token lifetime in hours. Tokens cannot be revoked before expiry,
    /// so this value is the only invalidation knob.
    pub token_ttl_hours: i64,

    /// PEM-encoded RSA private key (PKCS#8 or PKCS#1). Usually supplied
    /// via the ACCOUNTD_RSA_PRIVATE_KEY environment variable rather than
    /// the config file. Required outside the "dev" environment.
    #[serde(skip_serializing)]
    pub rsa_private_key: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            jwt_issuer: "accountd".to_string(),
            jwt_kid: "accountd-key-1".to_string(),
            token_ttl_hours: 24,
            rsa_private_key: None,
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

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
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

    /// Secret material and the deployment environment come from the
    /// process environment so they never live in the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(pem) = std::env::var("ACCOUNTD_RSA_PRIVATE_KEY")
            && !pem.is_empty()
        {
            self.security.rsa_private_key = Some(pem);
        }

        if let Ok(env) = std::env::var("ACCOUNTD_ENV")
            && !env.is_empty()
        {
            self.general.environment = env;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("accountd").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".accountd").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.jwt_issuer.is_empty() {
            anyhow::bail!("jwt_issuer cannot be empty");
        }

        if self.security.jwt_kid.is_empty() {
            anyhow::bail!("jwt_kid cannot be empty");
        }

        if self.security.token_ttl_hours <= 0 {
            anyhow::bail!("token_ttl_hours must be > 0");
        }

        if self.general.max_db_connections < self.general.min_db_connections {
            anyhow::bail!("max_db_connections must be >= min_db_connections");
        }

        Ok(())
    }

    #[must_use]
    pub fn is_dev(&self) -> bool {
        self.general.environment.eq_ignore_ascii_case("dev")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.security.jwt_issuer, "accountd");
        assert_eq!(parsed.security.token_ttl_hours, 24);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [general]
            environment = "production"
            "#,
        )
        .unwrap();

        assert_eq!(config.general.environment, "production");
        assert_eq!(config.security.jwt_kid, "accountd-key-1");
        assert!(!config.is_dev());
    }

    #[test]
    fn validate_rejects_zero_ttl() {
        let mut config = Config::default();
        config.security.token_ttl_hours = 0;
        assert!(config.validate().is_err());
    }
}
