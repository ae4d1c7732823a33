use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// AssetType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetType {
    #[serde(rename = "commands")]
    Command,
    #[serde(rename = "agents")]
    Agent,
    #[serde(rename = "skills")]
    Skill,
}

impl AssetType {
    pub fn all() -> &'static [AssetType] {
        &[AssetType::Command, AssetType::Agent, AssetType::Skill]
    }

    /// Directory name under `registry/` and each plugin.
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetType::Command => "commands",
            AssetType::Agent => "agents",
            AssetType::Skill => "skills",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            AssetType::Command => "command",
            AssetType::Agent => "agent",
            AssetType::Skill => "skill",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl std::str::FromStr for AssetType {
    type Err = crate::error::MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commands" | "command" => Ok(AssetType::Command),
            "agents" | "agent" => Ok(AssetType::Agent),
            "skills" | "skill" => Ok(AssetType::Skill),
            _ => Err(crate::error::MarketError::InvalidAssetType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Severity (shared by document checks)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn all() -> &'static [Severity] {
        &[Severity::Error, Severity::Warning, Severity::Info]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }

    /// True when `self` is at least as severe as `min`.
    pub fn at_least(self, min: Severity) -> bool {
        self <= min
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = crate::error::MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Severity::Error),
            "WARNING" => Ok(Severity::Warning),
            "INFO" => Ok(Severity::Info),
            _ => Err(crate::error::MarketError::InvalidFormat(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// OutputFormat
// ---------------------------------------------------------------------------

/// Serialization target for generated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Ts,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Ts => "ts",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }

    /// Infer the format from a file extension, if recognised.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "ts" => Some(OutputFormat::Ts),
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::error::MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ts" | "typescript" => Ok(OutputFormat::Ts),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(crate::error::MarketError::InvalidFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn asset_type_parses_singular_and_plural() {
        assert_eq!("skills".parse::<AssetType>().unwrap(), AssetType::Skill);
        assert_eq!("agent".parse::<AssetType>().unwrap(), AssetType::Agent);
        assert!("widgets".parse::<AssetType>().is_err());
    }

    #[test]
    fn asset_type_serializes_as_dir_name() {
        let json = serde_json::to_string(&AssetType::Command).unwrap();
        assert_eq!(json, "\"commands\"");
    }

    #[test]
    fn severity_ordering_filters() {
        assert!(Severity::Error.at_least(Severity::Warning));
        assert!(Severity::Warning.at_least(Severity::Warning));
        assert!(!Severity::Info.at_least(Severity::Warning));
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
    }

    #[test]
    fn output_format_from_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("flags/new-checkout.yml")),
            Some(OutputFormat::Yaml)
        );
        assert_eq!(OutputFormat::from_path(Path::new("x.txt")), None);
    }
}
