//! Application configuration.
//!
//! Read from the TOML file named by `LANTERN_CONFIG` when set, with
//! `SECRET_KEY` overriding the signing secret. Every field has a default,
//! so a missing file or an empty one yields a usable development setup.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "LANTERN_CONFIG";
/// Environment variable overriding [`Config::secret_key`].
pub const SECRET_ENV: &str = "SECRET_KEY";

/// Settings shared by the demo apps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key for signing session cookies.
    pub secret_key: String,
    /// Directory uploaded files are written to.
    pub upload_path: PathBuf,
    /// Largest accepted request body in bytes.
    pub max_body_size: usize,
    /// File extensions accepted by image uploads (lowercase, no dot).
    pub allowed_extensions: Vec<String>,
    /// Address to listen on.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Per-file limit shown by the drag-and-drop widget, in MB.
    pub dropzone_max_file_size: u32,
    /// Files the drag-and-drop widget accepts per page.
    pub dropzone_max_files: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_key: "secret string".to_string(),
            upload_path: PathBuf::from("uploads"),
            max_body_size: 3 * 1024 * 1024,
            allowed_extensions: ["png", "jpg", "jpeg", "gif"]
                .into_iter()
                .map(String::from)
                .collect(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            dropzone_max_file_size: 3,
            dropzone_max_files: 30,
        }
    }
}

impl Config {
    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Custom(format!("Invalid configuration: {}", e)))
    }

    /// Configuration from the environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let secret = std::env::var(SECRET_ENV).ok();
        Self::load_from(path.as_deref(), secret)
    }

    /// Read `path` if given, then apply a `secret` override.
    pub fn load_from(path: Option<&Path>, secret: Option<String>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                tracing::debug!(path = %path.display(), "loaded configuration file");
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            config.secret_key = secret;
        }
        Ok(config)
    }

    /// Socket address built from `host` and `port`.
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Custom(format!("Invalid listen address {}:{}: {}", self.host, self.port, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.secret_key, "secret string");
        assert_eq!(config.allowed_extensions, ["png", "jpg", "jpeg", "gif"]);
        assert_eq!(config.dropzone_max_files, 30);
        assert_eq!(config.addr().unwrap().port(), 5000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("port = 8080\nupload_path = \"/tmp/up\"").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_path, PathBuf::from("/tmp/up"));
        assert_eq!(config.dropzone_max_file_size, 3);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml_str("port = \"eighty\"").is_err());
    }

    #[test]
    fn test_load_from_file_and_secret_override() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lantern.toml");
        std::fs::write(&path, "secret_key = \"from file\"\nhost = \"0.0.0.0\"")?;

        let config = Config::load_from(Some(&path), None)?;
        assert_eq!(config.secret_key, "from file");
        assert_eq!(config.host, "0.0.0.0");

        let config = Config::load_from(Some(&path), Some("from env".into()))?;
        assert_eq!(config.secret_key, "from env");

        let config = Config::load_from(None, Some(String::new()))?;
        assert_eq!(config.secret_key, "secret string");
        Ok(())
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(Some(&dir.path().join("nope.toml")), None).is_err());
    }

    #[test]
    fn test_bad_addr() {
        let config = Config {
            host: "not a host".into(),
            ..Config::default()
        };
        assert!(config.addr().is_err());
    }
}
