//! Feature-flag configuration scaffolding.
//!
//! A flag config is write-once template output: it is rendered to
//! TypeScript, JSON or YAML for a human to edit, never read back.

use crate::config::FlagsConfig;
use crate::error::{MarketError, Result};
use crate::io;
use crate::openapi::case;
use crate::paths;
use crate::types::OutputFormat;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

const PRODUCTION_ENVS: &[&str] = &["production", "prod"];

// ---------------------------------------------------------------------------
// FlagType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagType {
    #[default]
    Release,
    Experiment,
    Ops,
    Permission,
}

impl FlagType {
    pub fn all() -> &'static [FlagType] {
        &[
            FlagType::Release,
            FlagType::Experiment,
            FlagType::Ops,
            FlagType::Permission,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlagType::Release => "release",
            FlagType::Experiment => "experiment",
            FlagType::Ops => "ops",
            FlagType::Permission => "permission",
        }
    }

    pub fn default_enabled(self) -> bool {
        matches!(self, FlagType::Ops)
    }

    pub fn default_rollout(self) -> u8 {
        match self {
            FlagType::Release | FlagType::Permission => 0,
            FlagType::Experiment => 50,
            FlagType::Ops => 100,
        }
    }

    pub fn temporary(self) -> bool {
        matches!(self, FlagType::Release | FlagType::Experiment)
    }

    fn settings(self) -> TypeSettings {
        match self {
            FlagType::Release => TypeSettings::Release {
                rollout_stages: vec![1, 10, 50, 100],
                expires_after_days: 90,
            },
            FlagType::Experiment => TypeSettings::Experiment {
                variants: vec![
                    Variant {
                        name: "control".to_string(),
                        weight: 50,
                    },
                    Variant {
                        name: "treatment".to_string(),
                        weight: 50,
                    },
                ],
                metrics: Vec::new(),
                hypothesis: String::new(),
            },
            FlagType::Ops => TypeSettings::Ops {
                kill_switch: true,
                fail_open: true,
            },
            FlagType::Permission => TypeSettings::Permission {
                allowed_roles: Vec::new(),
                allowed_users: Vec::new(),
            },
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlagType {
    type Err = MarketError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FlagType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MarketError::InvalidFlagType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FlagConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub weight: u8,
}

/// Fields that only exist for one flag type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSettings {
    Release {
        rollout_stages: Vec<u8>,
        expires_after_days: u32,
    },
    Experiment {
        variants: Vec<Variant>,
        metrics: Vec<String>,
        hypothesis: String,
    },
    Ops {
        kill_switch: bool,
        fail_open: bool,
    },
    Permission {
        allowed_roles: Vec<String>,
        allowed_users: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSetting {
    pub name: String,
    pub enabled: bool,
    pub rollout_percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    pub description: String,
    pub owner: String,
    pub enabled: bool,
    pub rollout_percentage: u8,
    pub temporary: bool,
    pub created_at: String,
    pub environments: Vec<EnvironmentSetting>,
    #[serde(flatten)]
    pub settings: TypeSettings,
}

/// Inputs to [`build`]; unset fields fall back to type and config defaults.
#[derive(Debug, Clone, Default)]
pub struct FlagRequest {
    pub name: String,
    pub flag_type: FlagType,
    pub enabled: bool,
    pub rollout: Option<i64>,
    pub environments: Option<Vec<String>>,
    pub owner: Option<String>,
    pub description: Option<String>,
}

pub fn build(req: &FlagRequest, defaults: &FlagsConfig) -> Result<FlagConfig> {
    if req.name.trim().is_empty() {
        return Err(MarketError::MissingArgument("--flag".to_string()));
    }
    paths::validate_name(&req.name)?;

    let rollout = match req.rollout {
        Some(r) if !(0..=100).contains(&r) => return Err(MarketError::RolloutOutOfRange(r)),
        Some(r) => r as u8,
        None => req.flag_type.default_rollout(),
    };
    let enabled = req.enabled || req.flag_type.default_enabled();

    let env_names: Vec<String> = req
        .environments
        .clone()
        .unwrap_or_else(|| defaults.environments.clone())
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect();
    if env_names.is_empty() {
        return Err(MarketError::MissingArgument("--environments".to_string()));
    }

    let environments = env_names
        .into_iter()
        .map(|name| {
            let gated = PRODUCTION_ENVS.contains(&name.as_str()) && req.flag_type != FlagType::Ops;
            EnvironmentSetting {
                enabled: enabled && !gated,
                rollout_percentage: if gated { 0 } else { rollout },
                name,
            }
        })
        .collect();

    Ok(FlagConfig {
        name: req.name.clone(),
        flag_type: req.flag_type,
        description: req.description.clone().unwrap_or_default(),
        owner: req.owner.clone().unwrap_or_default(),
        enabled,
        rollout_percentage: rollout,
        temporary: req.flag_type.temporary(),
        created_at: Utc::now().format("%Y-%m-%d").to_string(),
        environments,
        settings: req.flag_type.settings(),
    })
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Explicit format first, then the output file's extension, then TypeScript.
pub fn resolve_format(explicit: Option<OutputFormat>, output: Option<&Path>) -> OutputFormat {
    explicit
        .or_else(|| output.and_then(OutputFormat::from_path))
        .unwrap_or(OutputFormat::Ts)
}

pub fn default_output(name: &str, format: OutputFormat) -> PathBuf {
    PathBuf::from(format!("{name}.flag.{}", format.extension()))
}

pub fn render(flag: &FlagConfig, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(flag)?)),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(flag)?),
        OutputFormat::Ts => render_ts(flag),
    }
}

fn render_ts(flag: &FlagConfig) -> Result<String> {
    let value = serde_json::to_value(flag)?;
    let (camel, pascal) = ts_names(&flag.name);

    let mut out = String::new();
    out.push_str(&format!("export const {camel}Flag = "));
    ts_literal(&value, 0, &mut out);
    out.push_str(" as const;\n\n");
    out.push_str(&format!("export type {pascal}Flag = typeof {camel}Flag;\n"));
    Ok(out)
}

/// camelCase and PascalCase identifier stems for `name`. Names that do not
/// start with a letter get a `flag`/`Flag` prefix.
fn ts_names(name: &str) -> (String, String) {
    let camel = case::camel_case(name);
    let pascal = case::pascal_case(name);
    if camel.starts_with(|c: char| c.is_ascii_alphabetic()) {
        (camel, pascal)
    } else {
        (format!("flag{pascal}"), format!("Flag{pascal}"))
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Write `value` as a TypeScript object literal, two-space indented.
fn ts_literal(value: &Value, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth + 1);
    let close = "  ".repeat(depth);
    match value {
        Value::Object(map) if !map.is_empty() => {
            out.push_str("{\n");
            for (key, v) in map {
                out.push_str(&pad);
                if is_identifier(key) {
                    out.push_str(key);
                } else {
                    out.push_str(&Value::String(key.clone()).to_string());
                }
                out.push_str(": ");
                ts_literal(v, depth + 1, out);
                out.push_str(",\n");
            }
            out.push_str(&close);
            out.push('}');
        }
        Value::Array(items) if !items.is_empty() => {
            out.push_str("[\n");
            for v in items {
                out.push_str(&pad);
                ts_literal(v, depth + 1, out);
                out.push_str(",\n");
            }
            out.push_str(&close);
            out.push(']');
        }
        Value::Object(_) => out.push_str("{}"),
        Value::Array(_) => out.push_str("[]"),
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Write the rendered flag to `path`. Refuses to overwrite unless `force`.
pub fn write(flag: &FlagConfig, path: &Path, format: OutputFormat, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(MarketError::PathExists(path.display().to_string()));
    }
    let body = render(flag, format)?;
    io::atomic_write(path, body.as_bytes())?;
    debug!(flag = %flag.name, path = %path.display(), format = %format, "wrote flag config");
    Ok(())
}
