use crate::error::{CatalogError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Cookie signing secret. Overridable via SESSION_SECRET; never hardcoded.
    pub secret: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from("config.toml")?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Environment wins over the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(secret) = env::var("SESSION_SECRET") {
            self.session.secret = Some(secret);
        }
        if let Ok(host) = env::var("CATALOGO_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("CATALOGO_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
    }

    pub fn session_secret(&self) -> Result<String> {
        self.session.secret.clone().ok_or_else(|| {
            CatalogError::Config(
                "Session secret not configured; set SESSION_SECRET or [session].secret".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nhost = \"0.0.0.0\"\nport = 8080\n\n[session]\nsecret = \"s3cr3t\"\n"
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session_secret().unwrap(), "s3cr3t");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let config = Config::default();
        assert!(config.session_secret().is_err());
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[session]\nsecret = \"x\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
    }
}
