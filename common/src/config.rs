//! # Run Configuration
//!
//! Everything a propagation run needs is carried by [`Config`], which is
//! built once by the caller and handed to the runner. Configuration can come
//! from built-in defaults, an `ipsync.toml` file, and whatever overrides the
//! caller layers on top (flags, environment).

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_PROBE: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 254, 254, 254)), 1);
pub const CONFIG_FILE_NAME: &str = "ipsync.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How an embedded endpoint is located inside a target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Any IPv4-shaped token anywhere in the file. Kept for legacy files that
    /// hold exactly one such token.
    BareAddress,
    /// Only `http://<ipv4>:<port>` spans using the configured port.
    #[default]
    ScopedUrl,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bare" | "bare-address" => Ok(MatchPolicy::BareAddress),
            "scoped" | "scoped-url" => Ok(MatchPolicy::ScopedUrl),
            _ => Err(format!("unknown match policy: {s}")),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::BareAddress => write!(f, "bare-address"),
            MatchPolicy::ScopedUrl => write!(f, "scoped-url"),
        }
    }
}

/// A file whose embedded endpoint follows the host address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub path: PathBuf,
    /// Falls back to [`Config::default_policy`] when unset.
    #[serde(default)]
    pub policy: Option<MatchPolicy>,
}

impl TargetConfig {
    pub fn new(path: impl Into<PathBuf>, policy: Option<MatchPolicy>) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }
}

impl FromStr for TargetConfig {
    type Err = String;

    /// Parses `path` or `path=policy` (e.g. `frontend/script.js=bare`).
    ///
    /// The suffix is only split off when it names a policy, so paths that
    /// legitimately contain `=` still work.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("empty target path".to_string());
        }
        if let Some((path, policy)) = s.rsplit_once('=') {
            if let Ok(policy) = policy.parse::<MatchPolicy>() {
                return Ok(TargetConfig::new(path, Some(policy)));
            }
        }
        Ok(TargetConfig::new(s, None))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Files to patch, in the order they are processed and reported.
    pub targets: Vec<TargetConfig>,
    /// Port used both to build and to match endpoint strings.
    pub port: u16,
    /// Destination used to make the OS pick an outbound source address.
    /// Nothing is ever sent to it.
    pub probe: SocketAddr,
    pub default_policy: MatchPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            port: DEFAULT_PORT,
            probe: DEFAULT_PROBE,
            default_policy: MatchPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    port: Option<u16>,
    probe: Option<SocketAddr>,
    default_policy: Option<MatchPolicy>,
    #[serde(default)]
    targets: Vec<TargetConfig>,
}

impl Config {
    /// Loads `explicit` if given, otherwise `ipsync.toml` from the working
    /// directory when present, otherwise the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Ok((Self::load(&local)?, Some(local)));
        }

        debug!("No config file found, using defaults");
        Ok((Self::default(), None))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_toml_str(&content, base_dir)
    }

    /// Parses a TOML document. Relative target paths are resolved against
    /// `base_dir`.
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let defaults = Self::default();

        let targets = file
            .targets
            .into_iter()
            .map(|target| TargetConfig {
                path: if target.path.is_absolute() {
                    target.path
                } else {
                    base_dir.join(target.path)
                },
                policy: target.policy,
            })
            .collect();

        Ok(Self {
            targets,
            port: file.port.unwrap_or(defaults.port),
            probe: file.probe.unwrap_or(defaults.probe),
            default_policy: file.default_policy.unwrap_or(defaults.default_policy),
        })
    }

    pub fn policy_for(&self, target: &TargetConfig) -> MatchPolicy {
        target.policy.unwrap_or(self.default_policy)
    }

    /// Rejects configurations no run could do anything useful with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::Invalid("no target files configured".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".to_string()));
        }
        if self.probe.ip().is_unspecified() {
            return Err(ConfigError::Invalid(format!(
                "probe address {} is unspecified",
                self.probe
            )));
        }
        Ok(())
    }
}
