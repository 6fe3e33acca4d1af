use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::exec::Endpoint;

pub const CONFIG_ENV_VAR: &str = "MALLET_CONFIG";

const DEFAULT_USER: &str = "root";
const DEFAULT_PORT: u16 = 22;
const DEFAULT_BINARY: &str = "hammer";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// On-disk shape. Everything is optional; `parse_config` applies defaults
/// and validates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub tool: ToolConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: Endpoint,
    pub api_url: Option<String>,
    pub tool: ResolvedTool,
}

#[derive(Debug, Clone)]
pub struct ResolvedTool {
    pub binary: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub min_version: Option<semver::Version>,
    pub command_timeout: Duration,
}

pub fn default_config_path() -> Result<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", "mallet")
        .context("could not determine config directory")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// CLI flag wins, then the environment variable, then the platform dir.
pub fn resolve_config_path(cli_override: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = cli_override {
        return Ok(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    default_config_path()
}

pub fn load_config(path: &Path) -> Result<ResolvedConfig> {
    if !path.exists() {
        bail!(
            "config not found at {}\nRun `mallet init` to create one.",
            path.display()
        );
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<ResolvedConfig> {
    let raw: Config = toml::from_str(contents).context("failed to parse config TOML")?;

    let endpoint = match raw.endpoint.host {
        Some(host) => {
            if host.trim().is_empty() {
                bail!("endpoint.host must not be empty");
            }
            Endpoint::Ssh {
                host,
                user: raw
                    .endpoint
                    .user
                    .unwrap_or_else(|| DEFAULT_USER.to_string()),
                port: raw.endpoint.port.unwrap_or(DEFAULT_PORT),
            }
        }
        None => {
            if raw.endpoint.user.is_some() || raw.endpoint.port.is_some() {
                bail!("endpoint.user and endpoint.port require endpoint.host");
            }
            Endpoint::Local
        }
    };

    if let Some(url) = &raw.endpoint.api_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("endpoint.api_url must be an http(s) URL, got {:?}", url);
        }
    }

    let binary = raw
        .tool
        .binary
        .unwrap_or_else(|| DEFAULT_BINARY.to_string());
    if binary.trim().is_empty() {
        bail!("tool.binary must not be empty");
    }

    let min_version = raw
        .tool
        .min_version
        .as_deref()
        .map(|v| {
            semver::Version::parse(v)
                .with_context(|| format!("tool.min_version is not a valid version: {:?}", v))
        })
        .transpose()?;

    let timeout_secs = raw.tool.command_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        bail!("tool.command_timeout_secs must be positive");
    }

    Ok(ResolvedConfig {
        endpoint,
        api_url: raw.endpoint.api_url,
        tool: ResolvedTool {
            binary,
            username: raw.tool.username,
            password: raw.tool.password,
            min_version,
            command_timeout: Duration::from_secs(timeout_secs),
        },
    })
}

pub fn write_config_atomic(path: &Path, config: &Config, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "config already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(config).context("failed to serialize config")?;

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write temp config to {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename config to {}", path.display()))?;

    Ok(())
}
