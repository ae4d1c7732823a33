use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ScanConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory names skipped by every recursive scan.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

fn default_exclude_dirs() -> Vec<String> {
    [
        "node_modules",
        ".git",
        "dist",
        "build",
        "coverage",
        "target",
        "venv",
        ".venv",
        "__pycache__",
        ".pytest_cache",
        ".next",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

impl ScanConfig {
    pub fn is_excluded(&self, dir_name: &str) -> bool {
        self.exclude_dirs.iter().any(|d| d == dir_name)
    }
}

// ---------------------------------------------------------------------------
// FlagsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagsConfig {
    #[serde(default = "default_environments")]
    pub environments: Vec<String>,
    /// Lines searched on either side of a flag mention in a test file.
    #[serde(default = "default_window_lines")]
    pub window_lines: usize,
}

fn default_environments() -> Vec<String> {
    vec![
        "development".to_string(),
        "staging".to_string(),
        "production".to_string(),
    ]
}

fn default_window_lines() -> usize {
    10
}

impl Default for FlagsConfig {
    fn default() -> Self {
        Self {
            environments: default_environments(),
            window_lines: default_window_lines(),
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorsConfig {
    /// Prefix for RFC 9457 problem `type` URIs.
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
}

fn default_base_uri() -> String {
    "https://api.example.com/errors".to_string()
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
        }
    }
}

// ---------------------------------------------------------------------------
// SecretsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default = "default_plugin_version")]
    pub default_plugin_version: String,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub flags: FlagsConfig,
    #[serde(default)]
    pub errors: ErrorsConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
}

fn default_version() -> u32 {
    1
}

fn default_author() -> String {
    "Marketplace Maintainers".to_string()
}

fn default_plugin_version() -> String {
    "1.0.0".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            author: default_author(),
            default_plugin_version: default_plugin_version(),
            scan: ScanConfig::default(),
            flags: FlagsConfig::default(),
            errors: ErrorsConfig::default(),
            secrets: SecretsConfig::default(),
        }
    }
}

impl Config {
    /// Load `.skillmart.yaml` from `root`, falling back to defaults when the
    /// file is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Write the default config to `root`. Leaves an existing file alone
    /// unless `force`; returns whether a file was written.
    pub fn init(root: &Path, force: bool) -> Result<bool> {
        let defaults = Self::default();
        if force {
            defaults.save(root)?;
            return Ok(true);
        }
        let data = serde_yaml::to_string(&defaults)?;
        crate::io::write_if_missing(&paths::config_path(root), data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.flags.environments.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "flags.environments is empty: generated flags would have no environments"
                    .to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for env in &self.flags.environments {
            if !seen.insert(env.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("flags.environments lists '{env}' more than once"),
                });
            }
        }

        if self.flags.window_lines == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "flags.window_lines is 0: only the mentioning line is searched for test contexts"
                    .to_string(),
            });
        }

        let uri = self.errors.base_uri.trim();
        if !(uri.starts_with("https://") || uri.starts_with("http://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("errors.base_uri '{uri}' has no http(s) scheme"),
            });
        }

        if semver_like(&self.default_plugin_version).is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "default_plugin_version '{}' is not MAJOR.MINOR.PATCH",
                    self.default_plugin_version
                ),
            });
        }

        if let Some(p) = &self.secrets.patterns_file {
            if p.as_os_str().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "secrets.patterns_file is set but empty".to_string(),
                });
            }
        }

        warnings
    }
}

fn semver_like(v: &str) -> Option<(u64, u64, u64)> {
    let mut parts = v.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
