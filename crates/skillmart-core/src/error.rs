use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    #[error("plugin already exists: {0}")]
    PluginExists(String),

    #[error("asset not found: {asset_type}/{name}")]
    AssetNotFound { asset_type: String, name: String },

    #[error("asset already exists in registry: {0}")]
    AssetExists(String),

    #[error("asset {name} is used by plugins: {plugins} (use --force to delete anyway)")]
    AssetInUse { name: String, plugins: String },

    #[error("invalid name '{0}': must be lowercase alphanumeric with '-', '_' or '.' separators")]
    InvalidName(String),

    #[error("invalid asset type '{0}': expected commands, agents, or skills")]
    InvalidAssetType(String),

    #[error("invalid flag type '{0}': expected release, experiment, ops, or permission")]
    InvalidFlagType(String),

    #[error("rollout percentage {0} is out of range: must be between 0 and 100")]
    RolloutOutOfRange(i64),

    #[error("invalid format '{0}'")]
    InvalidFormat(String),

    #[error("missing required argument: {0}")]
    MissingArgument(String),

    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("path already exists: {0} (use --force to overwrite)")]
    PathExists(String),

    #[error("invalid pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, MarketError>;
