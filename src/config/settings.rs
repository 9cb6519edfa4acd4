use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GatewayError, Result};

/// Env var consulted when no config path is passed on the command line.
pub const CONFIG_PATH_ENV: &str = "MESH_GATEWAY_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub mesh: MeshConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    /// `host:port` or a full `http://host:port` URI of the llm_mesh service.
    pub address: String,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:50051".to_string(),
        }
    }
}

impl MeshConfig {
    /// gRPC endpoints need a scheme; bare `host:port` is treated as plaintext http.
    pub fn endpoint_uri(&self) -> String {
        let address = self.address.trim();
        if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let cli_arg = std::env::args().nth(1);
        let env_path = std::env::var(CONFIG_PATH_ENV).ok();
        let config_path = Self::find_config_file(cli_arg, env_path)?;
        tracing::info!("Loading configuration from {}", config_path.display());
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config_content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&config_content)?;
        if settings.mesh.address.trim().is_empty() {
            return Err(GatewayError::Config("mesh.address must not be empty".into()));
        }
        Ok(settings)
    }

    fn find_config_file(cli_arg: Option<String>, env_path: Option<String>) -> Result<PathBuf> {
        if let Some(explicit) = cli_arg.or(env_path).filter(|p| !p.trim().is_empty()) {
            return Ok(PathBuf::from(explicit));
        }

        let possible_names = ["custom-config.toml", "config.toml"];

        for name in &possible_names {
            if Path::new(name).exists() {
                return Ok(PathBuf::from(name));
            }
        }

        Err(GatewayError::Config(
            "Configuration file not found. Pass a path or create custom-config.toml or config.toml"
                .into(),
        ))
    }
}
