use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{self, Config, EndpointConfig, ToolConfig};

pub struct InitInputs {
    pub host: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub api_url: Option<String>,
    pub binary: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InitResult {
    pub config_path: PathBuf,
    pub endpoint: String,
    pub binary: String,
}

pub fn cmd_init(inputs: InitInputs, config_path: &Path, force: bool) -> Result<InitResult> {
    let raw = Config {
        endpoint: EndpointConfig {
            host: inputs.host,
            user: inputs.user,
            port: inputs.port,
            api_url: inputs.api_url,
        },
        tool: ToolConfig {
            binary: inputs.binary,
            username: inputs.username,
            password: inputs.password,
            min_version: None,
            command_timeout_secs: None,
        },
    };

    // Reject inconsistent inputs the same way loading would.
    let serialized = toml::to_string_pretty(&raw).context("failed to serialize config")?;
    let resolved = config::parse_config(&serialized)?;

    config::write_config_atomic(config_path, &raw, force)?;

    Ok(InitResult {
        config_path: config_path.to_path_buf(),
        endpoint: match &resolved.endpoint {
            crate::exec::Endpoint::Local => "local".to_string(),
            crate::exec::Endpoint::Ssh { host, user, port } => {
                format!("{user}@{host}:{port}")
            }
        },
        binary: resolved.tool.binary,
    })
}

pub fn format_init_human(result: &InitResult) -> String {
    format!(
        "Wrote config to {}\n  endpoint: {}\n  tool: {}",
        result.config_path.display(),
        result.endpoint,
        result.binary
    )
}
