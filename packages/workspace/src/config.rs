use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// `folio-server` configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of stored documents. Unset means an in-memory store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Directory served at `/uploads`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploads_dir: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl ServerConfig {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: ServerConfig = serde_json::from_str(&content)?;
            tracing::info!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(ServerConfig::default())
        }
    }

    /// Relative directories resolve against `cwd`
    pub fn data_dir(&self, cwd: &Path) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| cwd.join(dir))
    }

    pub fn uploads_dir(&self, cwd: &Path) -> Option<PathBuf> {
        self.uploads_dir.as_ref().map(|dir| cwd.join(dir))
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: None,
            uploads_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "port": 8080,
            "dataDir": "data",
            "uploadsDir": "uploads"
        }"#;

        let config: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_dir(Path::new("/srv")), Some(PathBuf::from("/srv/data")));
        assert_eq!(config.uploads_dir.as_deref(), Some("uploads"));
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "127.0.0.1:5000");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ServerConfig::load(dir.path()).unwrap(), ServerConfig::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{"host":"0.0.0.0"}"#).unwrap();
        let config = ServerConfig::load(dir.path()).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
    }
}
