use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed to make credentialed cross-site requests
    pub allowed_origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub database_path: PathBuf, // users + posts
    pub upload_dir: PathBuf,    // staging directory, served under /uploads
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token_secret: String,
    pub token_ttl_hours: i64,
    /// Argon2 iteration count
    pub password_hash_cost: u32,
    pub admin_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base_url: String,
    pub cover_folder: String,
    pub inline_folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_file_bytes: usize,
    /// Cap for each text field of a post form
    #[serde(default = "default_max_field_bytes")]
    pub max_field_bytes: usize,
}

fn default_max_field_bytes() -> usize {
    1024 * 1024
}

/// Longest session lifetime accepted from configuration (ten years)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting {0}: {1}")]
    Invalid(&'static str, String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 4000,
                allowed_origin: String::new(),
            },
            paths: PathConfig {
                database_path: PathBuf::from("blog.db"),
                upload_dir: PathBuf::from("uploads"),
            },
            auth: AuthConfig {
                token_secret: String::new(),
                token_ttl_hours: 24 * 7,
                password_hash_cost: 2,
                admin_code: String::new(),
            },
            media: MediaConfig {
                cloud_name: String::new(),
                api_key: String::new(),
                api_secret: String::new(),
                api_base_url: "https://api.cloudinary.com".to_string(),
                cover_folder: "blog_covers".to_string(),
                inline_folder: "blog_images".to_string(),
            },
            uploads: UploadConfig {
                max_file_bytes: 10 * 1024 * 1024,
                max_field_bytes: default_max_field_bytes(),
            },
        }
    }
}

impl Config {
    /// Load the TOML file if it exists, then overlay the process environment
    /// (including a `.env` file in the working directory).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            log::info!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        if let Ok(env_file) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", env_file.display());
        }
        config.apply_env_with(|key| std::env::var(key).ok());

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay values from `lookup`, keyed by environment variable name.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, target: &mut String| {
            if let Some(value) = lookup(key) {
                *target = value;
            }
        };

        text("HOST", &mut self.server.host);
        text("REQ_ORIGIN", &mut self.server.allowed_origin);
        text("JWT_SECRET", &mut self.auth.token_secret);
        text("ADMIN_CREATION_SECRET", &mut self.auth.admin_code);
        text("CLOUDINARY_CLOUD_NAME", &mut self.media.cloud_name);
        text("CLOUDINARY_API_KEY", &mut self.media.api_key);
        text("CLOUDINARY_API_SECRET", &mut self.media.api_secret);
        text("CLOUDINARY_API_BASE_URL", &mut self.media.api_base_url);

        if let Some(path) = lookup("DATABASE_PATH") {
            self.paths.database_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("UPLOAD_DIR") {
            self.paths.upload_dir = PathBuf::from(path);
        }

        if let Some(port) = parse_env(&lookup, "PORT") {
            self.server.port = port;
        }
        if let Some(ttl) = parse_env(&lookup, "TOKEN_TTL_HOURS") {
            self.auth.token_ttl_hours = ttl;
        }
        if let Some(cost) = parse_env(&lookup, "SALT_ROUNDS") {
            self.auth.password_hash_cost = cost;
        }
        if let Some(max) = parse_env(&lookup, "MAX_UPLOAD_BYTES") {
            self.uploads.max_file_bytes = max;
        }
        if let Some(max) = parse_env(&lookup, "MAX_FIELD_BYTES") {
            self.uploads.max_field_bytes = max;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_secret.trim().is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.auth.password_hash_cost == 0 {
            return Err(ConfigError::Invalid("SALT_ROUNDS", "must be at least 1".to_string()));
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("TOKEN_TTL_HOURS", "must be positive".to_string()));
        }
        if self.auth.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::Invalid(
                "TOKEN_TTL_HOURS",
                format!("must be at most {}", MAX_TOKEN_TTL_HOURS),
            ));
        }
        Ok(())
    }

    pub fn database_path(&self) -> String {
        self.paths.database_path.to_string_lossy().to_string()
    }
}

fn parse_env<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}: '{}' is not a valid value", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_requires_secret() {
        let config = Config::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.media.cover_folder, "blog_covers");
        assert!(matches!(config.validate(), Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn test_env_overlay() {
        let mut config = Config::default();
        config.apply_env_with(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("PORT", "8081"),
            ("SALT_ROUNDS", "3"),
            ("REQ_ORIGIN", "http://localhost:3000"),
            ("ADMIN_CREATION_SECRET", "letmein"),
            ("DATABASE_PATH", "/tmp/other.db"),
        ]));

        assert_eq!(config.auth.token_secret, "s3cret");
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.auth.password_hash_cost, 3);
        assert_eq!(config.server.allowed_origin, "http://localhost:3000");
        assert_eq!(config.auth.admin_code, "letmein");
        assert_eq!(config.database_path(), "/tmp/other.db");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_numbers_are_ignored() {
        let mut config = Config::default();
        config.apply_env_with(lookup_from(&[("PORT", "eighty"), ("SALT_ROUNDS", "-1")]));
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.auth.password_hash_cost, 2);
    }

    #[test]
    fn test_zero_cost_rejected() {
        let mut config = Config::default();
        config.auth.token_secret = "x".to_string();
        config.auth.password_hash_cost = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid("SALT_ROUNDS", _))));
    }

    #[test]
    fn test_token_ttl_is_bounded() {
        let mut config = Config::default();
        config.auth.token_secret = "x".to_string();
        config.apply_env_with(lookup_from(&[("TOKEN_TTL_HOURS", "9223372036854775807")]));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid("TOKEN_TTL_HOURS", _))));

        config.auth.token_ttl_hours = MAX_TOKEN_TTL_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_field_limit_from_env() {
        let mut config = Config::default();
        assert_eq!(config.uploads.max_field_bytes, 1024 * 1024);
        config.apply_env_with(lookup_from(&[("MAX_FIELD_BYTES", "2048")]));
        assert_eq!(config.uploads.max_field_bytes, 2048);
    }

    #[test]
    fn test_save_and_load_roundtrip_file() {
        let path = std::env::temp_dir().join(format!("inkpost_config_{}.toml", uuid::Uuid::new_v4()));
        let mut config = Config::default();
        config.server.port = 9999;
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();
        assert_eq!(parsed.server.port, 9999);

        std::fs::remove_file(&path).ok();
    }
}
