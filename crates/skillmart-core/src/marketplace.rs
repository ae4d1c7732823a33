//! Cross-cutting marketplace operations: usage accounting, link health,
//! and maintenance that touches both the registry and plugins.

use crate::config::Config;
use crate::error::{MarketError, Result};
use crate::io;
use crate::paths;
use crate::plugin::{self, Plugin};
use crate::registry::{self, Asset};
use crate::types::AssetType;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct UsageInfo {
    pub asset_name: String,
    pub asset_type: AssetType,
    pub plugins: Vec<String>,
}

impl UsageInfo {
    pub fn usage_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_orphan(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn is_shared(&self) -> bool {
        self.plugins.len() > 1
    }
}

/// Which plugins reference each registry asset, in registry order.
pub fn usage(root: &Path) -> Result<Vec<UsageInfo>> {
    let plugins = plugin::list(root)?;
    Ok(usage_with(&registry::list(root, None)?, &plugins))
}

fn usage_with(assets: &[Asset], plugins: &[Plugin]) -> Vec<UsageInfo> {
    let mut by_key: BTreeMap<(AssetType, String), UsageInfo> = assets
        .iter()
        .map(|a| {
            (
                (a.asset_type, a.name.clone()),
                UsageInfo {
                    asset_name: a.name.clone(),
                    asset_type: a.asset_type,
                    plugins: Vec::new(),
                },
            )
        })
        .collect();

    for p in plugins {
        for asset_type in AssetType::all() {
            for name in p.assets(*asset_type) {
                if let Some(u) = by_key.get_mut(&(*asset_type, name.clone())) {
                    u.plugins.push(p.name.clone());
                }
            }
        }
    }

    by_key.into_values().collect()
}

pub fn orphans(root: &Path) -> Result<Vec<UsageInfo>> {
    Ok(usage(root)?.into_iter().filter(|u| u.is_orphan()).collect())
}

/// Assets referenced by more than one plugin, most-shared first.
pub fn shared(root: &Path) -> Result<Vec<UsageInfo>> {
    let mut shared: Vec<_> = usage(root)?.into_iter().filter(|u| u.is_shared()).collect();
    shared.sort_by(|a, b| {
        b.usage_count()
            .cmp(&a.usage_count())
            .then_with(|| a.asset_name.cmp(&b.asset_name))
    });
    Ok(shared)
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total_assets: usize,
    pub commands: usize,
    pub agents: usize,
    pub skills: usize,
    pub plugins: usize,
    pub orphans: usize,
    pub shared: usize,
    pub total_size_kb: u64,
    pub avg_assets_per_plugin: f64,
}

pub fn stats(root: &Path) -> Result<Stats> {
    let assets = registry::list(root, None)?;
    let plugins = plugin::list(root)?;
    let usage = usage_with(&assets, &plugins);

    let count = |t: AssetType| assets.iter().filter(|a| a.asset_type == t).count();
    let avg = if plugins.is_empty() {
        0.0
    } else {
        plugins.iter().map(Plugin::total_assets).sum::<usize>() as f64 / plugins.len() as f64
    };

    Ok(Stats {
        total_assets: assets.len(),
        commands: count(AssetType::Command),
        agents: count(AssetType::Agent),
        skills: count(AssetType::Skill),
        plugins: plugins.len(),
        orphans: usage.iter().filter(|u| u.is_orphan()).count(),
        shared: usage.iter().filter(|u| u.is_shared()).count(),
        total_size_kb: assets.iter().map(|a| a.size_bytes).sum::<u64>() / 1024,
        avg_assets_per_plugin: avg,
    })
}

// ---------------------------------------------------------------------------
// Link validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Broken,
    Warning,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueKind::Broken => f.write_str("broken"),
            IssueKind::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkIssue {
    pub path: PathBuf,
    pub kind: IssueKind,
    pub message: String,
}

/// Every symlink found in a plugin's type directories.
fn plugin_links(root: &Path, plugin: &str) -> Result<Vec<(AssetType, PathBuf)>> {
    let mut links = Vec::new();
    for asset_type in AssetType::all() {
        let dir = paths::plugin_type_dir(root, plugin, *asset_type);
        if !dir.is_dir() {
            continue;
        }
        let mut entries: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_symlink())
            .collect();
        entries.sort();
        links.extend(entries.into_iter().map(|p| (*asset_type, p)));
    }
    Ok(links)
}

/// Check every plugin symlink. The marketplace is valid when no link is
/// broken; links that resolve outside the registry are warnings only.
pub fn validate(root: &Path) -> Result<(bool, Vec<LinkIssue>)> {
    let registry_dir = paths::registry_dir(root);
    let registry_real =
        std::fs::canonicalize(&registry_dir).unwrap_or_else(|_| io::absolutize(&registry_dir));

    let mut issues = Vec::new();
    for p in plugin::list(root)? {
        for (_, link) in plugin_links(root, &p.name)? {
            match std::fs::canonicalize(&link) {
                Ok(target) => {
                    if !target.starts_with(&registry_real) {
                        issues.push(LinkIssue {
                            path: link,
                            kind: IssueKind::Warning,
                            message: "Not pointing to registry".to_string(),
                        });
                    }
                }
                Err(_) => issues.push(LinkIssue {
                    path: link,
                    kind: IssueKind::Broken,
                    message: "Broken symlink".to_string(),
                }),
            }
        }
    }

    let valid = !issues.iter().any(|i| i.kind == IssueKind::Broken);
    Ok((valid, issues))
}

// ---------------------------------------------------------------------------
// Repair / rebuild
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct RepairReport {
    pub broken: usize,
    /// (link, new target) pairs.
    pub fixed: Vec<(PathBuf, PathBuf)>,
    pub removed: Vec<PathBuf>,
    pub dry_run: bool,
}

/// Re-point broken links at a same-named registry entry, or remove them.
pub fn repair(root: &Path, dry_run: bool, remove_only: bool) -> Result<RepairReport> {
    let (_, issues) = validate(root)?;
    let mut report = RepairReport {
        dry_run,
        ..RepairReport::default()
    };

    for issue in issues.into_iter().filter(|i| i.kind == IssueKind::Broken) {
        report.broken += 1;
        let link = issue.path;

        let replacement = if remove_only {
            None
        } else {
            repair_candidate(root, &link)?
        };

        match replacement {
            Some(target) => {
                if !dry_run {
                    io::link(&target, &link)?;
                }
                info!(link = %link.display(), target = %target.display(), "repaired link");
                report.fixed.push((link, target));
            }
            None => {
                if !dry_run {
                    std::fs::remove_file(&link)?;
                }
                info!(link = %link.display(), "removed broken link");
                report.removed.push(link);
            }
        }
    }

    Ok(report)
}

fn repair_candidate(root: &Path, link: &Path) -> Result<Option<PathBuf>> {
    let Some(asset_type) = link
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .and_then(|n| n.parse::<AssetType>().ok())
    else {
        return Ok(None);
    };
    let raw = std::fs::read_link(link)?;
    let Some(target_name) = raw.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    let bare = target_name.strip_suffix(".md").unwrap_or(target_name);
    Ok(paths::find_asset_entry(
        &paths::registry_type_dir(root, asset_type),
        bare,
    ))
}

/// Rewrite every resolvable plugin link as a relative link. Returns the
/// number of links rewritten.
pub fn rebuild(root: &Path, only: Option<&str>) -> Result<usize> {
    let plugins: Vec<Plugin> = match only {
        Some(name) => vec![plugin::load(root, name)?],
        None => plugin::list(root)?,
    };

    let mut rewritten = 0;
    for p in &plugins {
        debug!(plugin = %p.name, "rebuilding links");
        for (_, link) in plugin_links(root, &p.name)? {
            if let Ok(target) = std::fs::canonicalize(&link) {
                io::link(&target, &link)?;
                rewritten += 1;
            }
        }
    }
    Ok(rewritten)
}

// ---------------------------------------------------------------------------
// Registry mutations that must keep plugins consistent
// ---------------------------------------------------------------------------

/// Rename a registry asset and re-point every plugin link to it.
pub fn rename_asset(root: &Path, old: &str, new: &str, asset_type: AssetType) -> Result<usize> {
    paths::validate_name(new)?;
    let old_path = registry::locate(root, old, asset_type)?;
    let type_dir = paths::registry_type_dir(root, asset_type);
    let is_file = old_path.is_file();
    let new_path = if is_file {
        type_dir.join(format!("{new}.md"))
    } else {
        type_dir.join(new)
    };
    if registry::exists(root, new, asset_type) {
        return Err(MarketError::AssetExists(format!("{asset_type}/{new}")));
    }

    let old_abs = io::absolutize(&old_path);
    std::fs::rename(&old_path, &new_path)?;

    let mut relinked = 0;
    for p in plugin::list(root)? {
        for (link_type, link) in plugin_links(root, &p.name)? {
            if link_type != asset_type {
                continue;
            }
            let points_at_old = io::link_target(&link).map(|t| t == old_abs).unwrap_or(false);
            let dangling_same_name =
                !link.exists() && paths::asset_name_of(&link).as_deref() == Some(old);
            if !(points_at_old || dangling_same_name) {
                continue;
            }
            std::fs::remove_file(&link)?;
            let link_dir = paths::plugin_type_dir(root, &p.name, asset_type);
            let new_link = if is_file {
                link_dir.join(format!("{new}.md"))
            } else {
                link_dir.join(new)
            };
            io::link(&new_path, &new_link)?;
            relinked += 1;
        }
    }

    info!(old = %old, new = %new, relinked, "renamed asset");
    Ok(relinked)
}

/// Delete a registry asset. Refuses while plugins reference it unless
/// `force`, in which case their links are removed first.
pub fn delete_asset(root: &Path, name: &str, asset_type: AssetType, force: bool) -> Result<()> {
    let users: Vec<String> = usage(root)?
        .into_iter()
        .find(|u| u.asset_type == asset_type && u.asset_name == name)
        .map(|u| u.plugins)
        .unwrap_or_default();
    if !users.is_empty() && !force {
        return Err(MarketError::AssetInUse {
            name: name.to_string(),
            plugins: users.join(", "),
        });
    }

    let asset_path = registry::locate(root, name, asset_type)?;
    let asset_real = std::fs::canonicalize(&asset_path)?;

    for p in plugin::list(root)? {
        for (link_type, link) in plugin_links(root, &p.name)? {
            if link_type != asset_type {
                continue;
            }
            if std::fs::canonicalize(&link).is_ok_and(|t| t == asset_real) {
                std::fs::remove_file(&link)?;
                debug!(plugin = %p.name, link = %link.display(), "removed link to deleted asset");
            }
        }
    }

    io::remove_entry(&asset_path)?;
    info!(asset = %name, asset_type = %asset_type, "deleted asset");
    Ok(())
}

// ---------------------------------------------------------------------------
// Manifest-driven linking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginAssets {
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl PluginAssets {
    pub fn of(&self, asset_type: AssetType) -> &[String] {
        match asset_type {
            AssetType::Command => &self.commands,
            AssetType::Agent => &self.agents,
            AssetType::Skill => &self.skills,
        }
    }
}

/// Plugin name → assets it should link, as read from a YAML manifest.
pub type LinkManifest = BTreeMap<String, PluginAssets>;

pub fn load_link_manifest(path: &Path) -> Result<LinkManifest> {
    if !path.exists() {
        return Err(MarketError::PathNotFound(path.display().to_string()));
    }
    let data = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&data)?)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkReport {
    /// Plugins created because the manifest named them.
    pub created: Vec<String>,
    /// `plugin:type/name` entries linked.
    pub linked: Vec<String>,
    /// `type/name` entries absent from the registry.
    pub missing: Vec<String>,
}

/// Link every asset the manifest lists into its plugin, creating plugins
/// that do not exist yet. Missing registry assets are reported, not fatal.
pub fn link_manifest(root: &Path, manifest: &LinkManifest, config: &Config) -> Result<LinkReport> {
    let mut report = LinkReport::default();

    for (plugin_name, assets) in manifest {
        if !plugin::exists(root, plugin_name) {
            plugin::create(root, plugin_name, "", config)?;
            report.created.push(plugin_name.clone());
        }

        for asset_type in AssetType::all() {
            for asset in assets.of(*asset_type) {
                let Ok(source) = registry::locate(root, asset, *asset_type) else {
                    warn!(plugin = %plugin_name, asset = %asset, asset_type = %asset_type, "asset not found in registry");
                    report.missing.push(format!("{asset_type}/{asset}"));
                    continue;
                };
                let type_dir = paths::plugin_type_dir(root, plugin_name, *asset_type);
                let target = if source.is_file() {
                    type_dir.join(format!("{asset}.md"))
                } else {
                    type_dir.join(asset)
                };
                io::link(&source, &target)?;
                report
                    .linked
                    .push(format!("{plugin_name}:{asset_type}/{asset}"));
            }
        }
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Migration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrateReport {
    /// `type/name` entries moved into the registry.
    pub moved: Vec<String>,
    /// `plugin:type/name` copies dropped in favour of the registry entry.
    pub duplicates: Vec<String>,
    /// Links created in place of the migrated originals.
    pub linked: usize,
}

/// Move real (non-symlink) plugin assets into the registry and leave links
/// behind. The first occurrence of a name wins, in sorted plugin order.
pub fn migrate(root: &Path) -> Result<MigrateReport> {
    let plugins_dir = paths::plugins_dir(root);
    if !plugins_dir.is_dir() {
        return Err(MarketError::PathNotFound(plugins_dir.display().to_string()));
    }
    for asset_type in AssetType::all() {
        io::ensure_dir(&paths::registry_type_dir(root, *asset_type))?;
    }

    let mut plugin_dirs: Vec<PathBuf> = std::fs::read_dir(&plugins_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir() && !is_hidden(p))
        .collect();
    plugin_dirs.sort();

    let mut report = MigrateReport::default();
    for plugin_dir in plugin_dirs {
        let plugin_name = plugin_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        for asset_type in AssetType::all() {
            let type_dir = plugin_dir.join(asset_type.dir_name());
            if !type_dir.is_dir() {
                continue;
            }
            let mut items: Vec<PathBuf> = std::fs::read_dir(&type_dir)?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| !p.is_symlink())
                .collect();
            items.sort();

            for item in items {
                let is_candidate = item.is_dir()
                    || (item.is_file() && item.extension().is_some_and(|e| e == "md"));
                if !is_candidate {
                    continue;
                }
                let Some(name) = paths::asset_name_of(&item) else {
                    continue;
                };

                if registry::exists(root, &name, *asset_type) {
                    io::remove_entry(&item)?;
                    report
                        .duplicates
                        .push(format!("{plugin_name}:{asset_type}/{name}"));
                } else {
                    let dest = if item.is_file() {
                        paths::registry_type_dir(root, *asset_type).join(format!("{name}.md"))
                    } else {
                        paths::registry_type_dir(root, *asset_type).join(&name)
                    };
                    move_entry(&item, &dest)?;
                    report.moved.push(format!("{asset_type}/{name}"));
                }

                let source = registry::locate(root, &name, *asset_type)?;
                let link_path = if source.is_file() {
                    type_dir.join(format!("{name}.md"))
                } else {
                    type_dir.join(&name)
                };
                io::link(&source, &link_path)?;
                report.linked += 1;
            }
        }
    }

    info!(
        moved = report.moved.len(),
        duplicates = report.duplicates.len(),
        "migration complete"
    );
    Ok(report)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Rename, falling back to copy-and-remove across filesystems.
fn move_entry(src: &Path, dst: &Path) -> Result<()> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    io::copy_tree(src, dst)?;
    io::remove_entry(src)
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ExportedAsset {
    pub name: String,
    pub description: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Export {
    pub generated_at: String,
    pub stats: Stats,
    pub registry: BTreeMap<AssetType, Vec<ExportedAsset>>,
    pub plugins: Vec<Plugin>,
}

pub fn export(root: &Path) -> Result<Export> {
    let mut registry_map: BTreeMap<AssetType, Vec<ExportedAsset>> = AssetType::all()
        .iter()
        .map(|t| (*t, Vec::new()))
        .collect();
    for asset in registry::list(root, None)? {
        registry_map
            .entry(asset.asset_type)
            .or_default()
            .push(ExportedAsset {
                name: asset.name,
                description: asset.description,
                size_bytes: asset.size_bytes,
            });
    }

    Ok(Export {
        generated_at: Utc::now().to_rfc3339(),
        stats: stats(root)?,
        registry: registry_map,
        plugins: plugin::list(root)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        io::atomic_write(&root.join(rel), body.as_bytes()).unwrap();
    }

    /// registry: commands/{commit,catchup}, agents/debugger, skills/api-design
    /// plugins: core -> commit, api-design; dx -> commit, debugger
    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "registry/commands/commit.md", "Commit changes");
        write(root, "registry/commands/catchup.md", "Catch up on a branch");
        write(root, "registry/agents/debugger.md", "Debug failures");
        write(root, "registry/skills/api-design/SKILL.md", "---\ndescription: API design\n---\n");

        let cfg = Config::default();
        plugin::create(root, "core", "Core", &cfg).unwrap();
        plugin::create(root, "dx", "DX", &cfg).unwrap();
        plugin::add_asset(root, "core", "commit", AssetType::Command).unwrap();
        plugin::add_asset(root, "core", "api-design", AssetType::Skill).unwrap();
        plugin::add_asset(root, "dx", "commit", AssetType::Command).unwrap();
        plugin::add_asset(root, "dx", "debugger", AssetType::Agent).unwrap();
        dir
    }

    #[test]
    fn usage_orphans_and_shared() {
        let dir = fixture();
        let root = dir.path();

        let orphans = orphans(root).unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].asset_name, "catchup");

        let shared = shared(root).unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].asset_name, "commit");
        assert_eq!(shared[0].plugins, vec!["core", "dx"]);
    }

    #[test]
    fn stats_counts() {
        let dir = fixture();
        let s = stats(dir.path()).unwrap();
        assert_eq!(s.total_assets, 4);
        assert_eq!(s.commands, 2);
        assert_eq!(s.plugins, 2);
        assert_eq!(s.orphans, 1);
        assert_eq!(s.shared, 1);
        assert!((s.avg_assets_per_plugin - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_reports_broken_and_foreign_links() {
        let dir = fixture();
        let root = dir.path();
        assert!(validate(root).unwrap().0);

        std::fs::remove_file(root.join("registry/agents/debugger.md")).unwrap();
        write(root, "elsewhere/notes.md", "outside");
        io::link(
            &root.join("elsewhere/notes.md"),
            &root.join("plugins/core/commands/notes.md"),
        )
        .unwrap();

        let (valid, issues) = validate(root).unwrap();
        assert!(!valid);
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::Broken && i.path.ends_with("debugger.md")));
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::Warning && i.path.ends_with("notes.md")));
    }

    #[test]
    fn repair_relinks_when_registry_has_match() {
        let dir = fixture();
        let root = dir.path();
        // Move the registry entry so the link dangles, then restore under
        // the same name in a fresh location.
        std::fs::rename(
            root.join("registry/agents/debugger.md"),
            root.join("debugger.bak"),
        )
        .unwrap();
        let dry = repair(root, true, false).unwrap();
        assert_eq!(dry.broken, 1);
        assert_eq!(dry.removed.len(), 1);

        std::fs::create_dir_all(root.join("registry/agents/debugger")).unwrap();
        write(root, "registry/agents/debugger/README.md", "Debug dir");
        let report = repair(root, false, false).unwrap();
        assert_eq!(report.fixed.len(), 1);
        assert!(validate(root).unwrap().0);
    }

    #[test]
    fn repair_remove_only_deletes_links() {
        let dir = fixture();
        let root = dir.path();
        std::fs::remove_file(root.join("registry/agents/debugger.md")).unwrap();
        let report = repair(root, false, true).unwrap();
        assert_eq!(report.removed.len(), 1);
        assert!(!root.join("plugins/dx/agents/debugger.md").is_symlink());
    }

    #[test]
    fn rebuild_unknown_plugin_fails() {
        let dir = fixture();
        assert!(matches!(
            rebuild(dir.path(), Some("ghost")),
            Err(MarketError::PluginNotFound(_))
        ));
        assert_eq!(rebuild(dir.path(), Some("core")).unwrap(), 2);
    }

    #[test]
    fn rename_asset_repoints_links() {
        let dir = fixture();
        let root = dir.path();
        let relinked = rename_asset(root, "commit", "git-commit", AssetType::Command).unwrap();
        assert_eq!(relinked, 2);
        let link = root.join("plugins/dx/commands/git-commit.md");
        assert_eq!(std::fs::read_to_string(link).unwrap(), "Commit changes");
        assert!(!root.join("plugins/dx/commands/commit.md").is_symlink());
        assert!(validate(root).unwrap().0);
    }

    #[test]
    fn delete_asset_requires_force_when_used() {
        let dir = fixture();
        let root = dir.path();
        assert!(matches!(
            delete_asset(root, "commit", AssetType::Command, false),
            Err(MarketError::AssetInUse { .. })
        ));
        delete_asset(root, "commit", AssetType::Command, true).unwrap();
        assert!(!root.join("registry/commands/commit.md").exists());
        assert!(!root.join("plugins/core/commands/commit.md").is_symlink());
        assert!(validate(root).unwrap().0);

        delete_asset(root, "catchup", AssetType::Command, false).unwrap();
    }

    #[test]
    fn link_manifest_creates_plugins_and_reports_missing() {
        let dir = fixture();
        let root = dir.path();
        let yaml = "research-tools:\n  commands: [catchup]\n  agents: [researcher]\n  skills: [api-design]\n";
        let manifest: LinkManifest = serde_yaml::from_str(yaml).unwrap();

        let report = link_manifest(root, &manifest, &Config::default()).unwrap();
        assert_eq!(report.created, vec!["research-tools"]);
        assert_eq!(report.linked.len(), 2);
        assert_eq!(report.missing, vec!["agents/researcher"]);
        let p = plugin::load(root, "research-tools").unwrap();
        assert_eq!(p.commands, vec!["catchup"]);
    }

    #[test]
    fn migrate_moves_originals_and_links_duplicates() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let cfg = Config::default();
        plugin::create(root, "alpha", "", &cfg).unwrap();
        plugin::create(root, "beta", "", &cfg).unwrap();
        write(root, "plugins/alpha/commands/commit.md", "alpha commit");
        write(root, "plugins/beta/commands/commit.md", "beta commit");
        write(root, "plugins/beta/skills/flags/SKILL.md", "flags");

        let report = migrate(root).unwrap();
        assert_eq!(report.moved, vec!["commands/commit", "skills/flags"]);
        assert_eq!(report.duplicates, vec!["beta:commands/commit"]);
        assert_eq!(report.linked, 3);

        assert_eq!(
            std::fs::read_to_string(root.join("registry/commands/commit.md")).unwrap(),
            "alpha commit"
        );
        let beta_link = root.join("plugins/beta/commands/commit.md");
        assert!(beta_link.is_symlink());
        assert_eq!(std::fs::read_to_string(beta_link).unwrap(), "alpha commit");
        assert!(validate(root).unwrap().0);
    }

    #[test]
    fn export_groups_registry_by_type() {
        let dir = fixture();
        let export = export(dir.path()).unwrap();
        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["registry"]["commands"].as_array().unwrap().len(), 2);
        assert_eq!(json["plugins"].as_array().unwrap().len(), 2);
        assert_eq!(json["stats"]["total_assets"], 4);
    }
}
