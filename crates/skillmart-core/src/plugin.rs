//! Plugin definitions.
//!
//! A plugin is a directory under `plugins/` holding a
//! `.claude-plugin/plugin.json` manifest and one directory per asset type
//! whose entries are relative symlinks into `registry/`.

use crate::config::Config;
use crate::error::{MarketError, Result};
use crate::io;
use crate::paths;
use crate::registry;
use crate::types::AssetType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginAuthor {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<PluginAuthor>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Fields this tool does not interpret, preserved on rewrite.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl PluginManifest {
    pub fn load(root: &Path, plugin: &str) -> Result<Self> {
        let path = paths::plugin_manifest(root, plugin);
        if !path.exists() {
            return Err(MarketError::PluginNotFound(plugin.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, root: &Path, plugin: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        io::atomic_write(&paths::plugin_manifest(root, plugin), data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plugin {
    /// Directory name under `plugins/`.
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Plugin {
    pub fn total_assets(&self) -> usize {
        self.commands.len() + self.agents.len() + self.skills.len()
    }

    pub fn assets(&self, asset_type: AssetType) -> &[String] {
        match asset_type {
            AssetType::Command => &self.commands,
            AssetType::Agent => &self.agents,
            AssetType::Skill => &self.skills,
        }
    }

    pub fn dir(&self, root: &Path) -> PathBuf {
        paths::plugin_dir(root, &self.name)
    }
}

/// Asset names present in one of a plugin's type directories, sorted and
/// deduplicated.
pub fn list_assets(plugin_dir: &Path, asset_type: AssetType) -> Result<Vec<String>> {
    let dir = plugin_dir.join(asset_type.dir_name());
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = BTreeSet::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if let Some(name) = paths::asset_name_of(&path) {
            names.insert(name);
        }
    }
    Ok(names.into_iter().collect())
}

pub fn load(root: &Path, name: &str) -> Result<Plugin> {
    let manifest = PluginManifest::load(root, name)?;
    let dir = paths::plugin_dir(root, name);
    Ok(Plugin {
        name: name.to_string(),
        description: manifest.description,
        version: manifest.version,
        keywords: manifest.keywords,
        commands: list_assets(&dir, AssetType::Command)?,
        agents: list_assets(&dir, AssetType::Agent)?,
        skills: list_assets(&dir, AssetType::Skill)?,
    })
}

/// All plugins with a readable manifest, sorted by name.
pub fn list(root: &Path) -> Result<Vec<Plugin>> {
    let dir = paths::plugins_dir(root);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut plugins = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        match load(root, name) {
            Ok(p) => plugins.push(p),
            Err(e) => debug!(plugin = %name, error = %e, "skipping plugin directory"),
        }
    }
    plugins.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(plugins)
}

pub fn exists(root: &Path, name: &str) -> bool {
    paths::plugin_dir(root, name).is_dir()
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

pub fn create(root: &Path, name: &str, description: &str, config: &Config) -> Result<Plugin> {
    paths::validate_name(name)?;
    let dir = paths::plugin_dir(root, name);
    if dir.exists() {
        return Err(MarketError::PluginExists(name.to_string()));
    }

    for asset_type in AssetType::all() {
        io::ensure_dir(&dir.join(asset_type.dir_name()))?;
    }

    let manifest = PluginManifest {
        name: name.to_string(),
        description: description.to_string(),
        version: config.default_plugin_version.clone(),
        author: Some(PluginAuthor {
            name: config.author.clone(),
        }),
        keywords: Vec::new(),
        extra: serde_json::Map::new(),
    };
    manifest.save(root, name)?;
    debug!(plugin = %name, "created plugin");

    load(root, name)
}

/// Rename a plugin directory and rewrite the manifest name. Relative links
/// inside the plugin stay valid because the directory depth is unchanged.
pub fn rename(root: &Path, old: &str, new: &str) -> Result<()> {
    paths::validate_name(new)?;
    let old_dir = paths::plugin_dir(root, old);
    let new_dir = paths::plugin_dir(root, new);
    if !old_dir.is_dir() {
        return Err(MarketError::PluginNotFound(old.to_string()));
    }
    if new_dir.exists() {
        return Err(MarketError::PluginExists(new.to_string()));
    }

    std::fs::rename(&old_dir, &new_dir)?;

    if paths::plugin_manifest(root, new).exists() {
        let mut manifest = PluginManifest::load(root, new)?;
        manifest.name = new.to_string();
        manifest.save(root, new)?;
    }
    Ok(())
}

/// Link a registry asset into a plugin. Returns `false` when the plugin
/// already has an entry with that name.
pub fn add_asset(root: &Path, plugin: &str, asset: &str, asset_type: AssetType) -> Result<bool> {
    if !exists(root, plugin) {
        return Err(MarketError::PluginNotFound(plugin.to_string()));
    }
    let source = registry::locate(root, asset, asset_type)?;

    let type_dir = paths::plugin_type_dir(root, plugin, asset_type);
    let target = if source.is_file() {
        type_dir.join(format!("{asset}.md"))
    } else {
        type_dir.join(asset)
    };

    if target.exists() || target.is_symlink() {
        return Ok(false);
    }

    io::link(&source, &target)?;
    debug!(plugin = %plugin, asset = %asset, asset_type = %asset_type, "linked asset");
    Ok(true)
}

/// Remove an asset entry from a plugin. Returns `false` when absent.
pub fn remove_asset(root: &Path, plugin: &str, asset: &str, asset_type: AssetType) -> Result<bool> {
    if !exists(root, plugin) {
        return Err(MarketError::PluginNotFound(plugin.to_string()));
    }
    let type_dir = paths::plugin_type_dir(root, plugin, asset_type);
    let candidates = [type_dir.join(asset), type_dir.join(format!("{asset}.md"))];
    let Some(target) = candidates
        .into_iter()
        .find(|p| p.exists() || p.is_symlink())
    else {
        return Ok(false);
    };

    io::remove_entry(&target)?;
    debug!(plugin = %plugin, asset = %asset, asset_type = %asset_type, "removed asset");
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed_registry(root: &Path) {
        io::atomic_write(&root.join("registry/commands/commit.md"), b"Commit").unwrap();
        io::atomic_write(&root.join("registry/skills/api-design/SKILL.md"), b"API").unwrap();
    }

    #[test]
    fn create_writes_manifest_and_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let plugin = create(root, "dx-tools", "Developer experience", &Config::default()).unwrap();

        assert_eq!(plugin.name, "dx-tools");
        assert_eq!(plugin.version, "1.0.0");
        assert!(root.join("plugins/dx-tools/skills").is_dir());

        let manifest = PluginManifest::load(root, "dx-tools").unwrap();
        assert_eq!(manifest.description, "Developer experience");
        assert_eq!(manifest.author.unwrap().name, "Marketplace Maintainers");

        assert!(matches!(
            create(root, "dx-tools", "", &Config::default()),
            Err(MarketError::PluginExists(_))
        ));
    }

    #[test]
    fn create_rejects_invalid_name() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            create(dir.path(), "Bad Name", "", &Config::default()),
            Err(MarketError::InvalidName(_))
        ));
    }

    #[test]
    fn manifest_preserves_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let json = r#"{"name":"x","version":"2.0.0","homepage":"https://x.dev","license":"MIT"}"#;
        io::atomic_write(&paths::plugin_manifest(root, "x"), json.as_bytes()).unwrap();

        let manifest = PluginManifest::load(root, "x").unwrap();
        manifest.save(root, "x").unwrap();
        let raw = std::fs::read_to_string(paths::plugin_manifest(root, "x")).unwrap();
        assert!(raw.contains("homepage"));
        assert!(raw.contains("2.0.0"));
    }

    #[test]
    fn list_skips_directories_without_manifest() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        create(root, "b-plugin", "", &Config::default()).unwrap();
        create(root, "a-plugin", "", &Config::default()).unwrap();
        std::fs::create_dir_all(root.join("plugins/scratch")).unwrap();
        std::fs::create_dir_all(root.join("plugins/.cache")).unwrap();

        let names: Vec<_> = list(root).unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["a-plugin", "b-plugin"]);
    }

    #[cfg(unix)]
    #[test]
    fn add_and_remove_assets() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        seed_registry(root);
        create(root, "core", "", &Config::default()).unwrap();

        assert!(add_asset(root, "core", "commit", AssetType::Command).unwrap());
        assert!(add_asset(root, "core", "api-design", AssetType::Skill).unwrap());
        assert!(!add_asset(root, "core", "commit", AssetType::Command).unwrap());

        let link = root.join("plugins/core/commands/commit.md");
        assert!(link.is_symlink());
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "Commit");
        assert!(root.join("plugins/core/skills/api-design/SKILL.md").is_file());

        let plugin = load(root, "core").unwrap();
        assert_eq!(plugin.commands, vec!["commit"]);
        assert_eq!(plugin.skills, vec!["api-design"]);
        assert_eq!(plugin.total_assets(), 2);

        assert!(remove_asset(root, "core", "commit", AssetType::Command).unwrap());
        assert!(!remove_asset(root, "core", "commit", AssetType::Command).unwrap());
        assert!(root.join("registry/commands/commit.md").is_file());
    }

    #[test]
    fn add_asset_errors() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        seed_registry(root);
        assert!(matches!(
            add_asset(root, "ghost", "commit", AssetType::Command),
            Err(MarketError::PluginNotFound(_))
        ));
        create(root, "core", "", &Config::default()).unwrap();
        assert!(matches!(
            add_asset(root, "core", "missing", AssetType::Agent),
            Err(MarketError::AssetNotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn rename_keeps_links_and_updates_manifest() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        seed_registry(root);
        create(root, "core", "", &Config::default()).unwrap();
        add_asset(root, "core", "commit", AssetType::Command).unwrap();

        rename(root, "core", "core-productivity").unwrap();
        assert!(!root.join("plugins/core").exists());
        let manifest = PluginManifest::load(root, "core-productivity").unwrap();
        assert_eq!(manifest.name, "core-productivity");
        let link = root.join("plugins/core-productivity/commands/commit.md");
        assert_eq!(std::fs::read_to_string(link).unwrap(), "Commit");
    }
}
