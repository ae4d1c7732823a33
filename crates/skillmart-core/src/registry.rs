//! The central asset registry.
//!
//! Layout:
//!   registry/
//!     commands/<name>.md
//!     agents/<name>.md
//!     skills/<name>/SKILL.md   (directory assets carry their own resources)
//!
//! Plugins never own content: they link into this tree.

use crate::error::{MarketError, Result};
use crate::io;
use crate::paths;
use crate::types::AssetType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DESCRIPTION_MAX_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub asset_type: AssetType,
    pub path: PathBuf,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl Asset {
    fn from_entry(path: PathBuf, name: String, asset_type: AssetType) -> Self {
        let modified = path
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        Self {
            description: describe(&path),
            size_bytes: io::tree_size(&path),
            name,
            asset_type,
            path,
            modified,
        }
    }

    /// Location relative to the marketplace root, e.g. `registry/skills/api-design`.
    pub fn registry_path(&self) -> PathBuf {
        Path::new(paths::REGISTRY_DIR)
            .join(self.asset_type.dir_name())
            .join(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Description extraction
// ---------------------------------------------------------------------------

/// Best-effort one-line description of an asset file or directory.
///
/// Uses the frontmatter `description:` when present, else the first line of
/// prose. Unreadable assets describe as the empty string.
pub fn describe(path: &Path) -> String {
    let content = if path.is_file() {
        std::fs::read_to_string(path).ok()
    } else if path.is_dir() {
        paths::DESCRIPTION_FILES
            .iter()
            .map(|f| path.join(f))
            .find(|p| p.is_file())
            .and_then(|p| std::fs::read_to_string(p).ok())
    } else {
        None
    };
    content.map(|c| describe_text(&c)).unwrap_or_default()
}

pub fn describe_text(content: &str) -> String {
    let lines: Vec<&str> = content.trim().lines().collect();
    let mut body_start = 0;

    if lines.first().map(|l| l.trim_end()) == Some("---") {
        for (i, line) in lines.iter().enumerate().skip(1) {
            let line = line.trim_end();
            if line == "---" {
                body_start = i + 1;
                break;
            }
            if let Some(rest) = line.strip_prefix("description:") {
                return rest
                    .trim()
                    .trim_matches(|c| c == '"' || c == '\'')
                    .to_string();
            }
        }
    }

    lines
        .iter()
        .skip(body_start)
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with("---"))
        .map(|l| l.chars().take(DESCRIPTION_MAX_CHARS).collect())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// All registry assets, optionally filtered by type, sorted by (type, name).
pub fn list(root: &Path, filter: Option<AssetType>) -> Result<Vec<Asset>> {
    let types: Vec<AssetType> = match filter {
        Some(t) => vec![t],
        None => AssetType::all().to_vec(),
    };

    let mut assets = Vec::new();
    for asset_type in types {
        let dir = paths::registry_type_dir(root, asset_type);
        if !dir.is_dir() {
            continue;
        }
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_asset = path.is_dir()
                || (path.is_file() && path.extension().is_some_and(|e| e == "md"));
            if !is_asset {
                continue;
            }
            if let Some(name) = paths::asset_name_of(&path) {
                assets.push(Asset::from_entry(path, name, asset_type));
            }
        }
    }

    assets.sort_by(|a, b| (a.asset_type, &a.name).cmp(&(b.asset_type, &b.name)));
    Ok(assets)
}

/// Path of a registry asset, directory form preferred over `<name>.md`.
pub fn locate(root: &Path, name: &str, asset_type: AssetType) -> Result<PathBuf> {
    paths::find_asset_entry(&paths::registry_type_dir(root, asset_type), name).ok_or_else(|| {
        MarketError::AssetNotFound {
            asset_type: asset_type.to_string(),
            name: name.to_string(),
        }
    })
}

pub fn exists(root: &Path, name: &str, asset_type: AssetType) -> bool {
    locate(root, name, asset_type).is_ok()
}

/// Case-insensitive substring search over names and descriptions.
pub fn search(root: &Path, query: &str) -> Result<Vec<Asset>> {
    let q = query.to_lowercase();
    Ok(list(root, None)?
        .into_iter()
        .filter(|a| a.name.to_lowercase().contains(&q) || a.description.to_lowercase().contains(&q))
        .collect())
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Copy a file or directory into the registry.
///
/// The asset name defaults to the file stem or directory name. File assets
/// are stored as `<name>.md`.
pub fn add(root: &Path, source: &Path, asset_type: AssetType, name: Option<&str>) -> Result<Asset> {
    if !source.exists() {
        return Err(MarketError::PathNotFound(source.display().to_string()));
    }

    let name = match name {
        Some(n) => n.to_string(),
        None if source.is_file() => source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string(),
        None => source
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string(),
    };
    paths::validate_name(&name)?;

    if exists(root, &name, asset_type) {
        return Err(MarketError::AssetExists(format!("{asset_type}/{name}")));
    }

    let type_dir = paths::registry_type_dir(root, asset_type);
    io::ensure_dir(&type_dir)?;
    let target = if source.is_file() {
        type_dir.join(format!("{name}.md"))
    } else {
        type_dir.join(&name)
    };

    io::copy_tree(source, &target)?;
    debug!(asset = %name, asset_type = %asset_type, "added asset to registry");
    Ok(Asset::from_entry(target, name, asset_type))
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
    pub dry_run: bool,
}

/// Import every markdown file or directory from `source` that the registry
/// does not already hold.
pub fn sync(root: &Path, source: &Path, asset_type: AssetType, dry_run: bool) -> Result<SyncReport> {
    if !source.is_dir() {
        return Err(MarketError::PathNotFound(source.display().to_string()));
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(source)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    let mut report = SyncReport {
        dry_run,
        ..SyncReport::default()
    };

    for path in entries {
        let is_candidate = path.is_dir()
            || (path.is_file() && path.extension().is_some_and(|e| e == "md"));
        if !is_candidate {
            continue;
        }
        let Some(name) = paths::asset_name_of(&path) else {
            continue;
        };
        if exists(root, &name, asset_type) {
            report.skipped.push(name);
            continue;
        }
        if !dry_run {
            add(root, &path, asset_type, Some(&name))?;
        }
        report.added.push(name);
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        io::atomic_write(&root.join(rel), body.as_bytes()).unwrap();
    }

    #[test]
    fn describe_prefers_frontmatter() {
        let text = "---\nname: api-design\ndescription: \"Design REST APIs\"\n---\n# Title\nBody";
        assert_eq!(describe_text(text), "Design REST APIs");
    }

    #[test]
    fn describe_falls_back_to_first_prose_line() {
        let text = "---\nname: commit\n---\n\n# Commit\n\nCreate a conventional commit.\n";
        assert_eq!(describe_text(text), "Create a conventional commit.");
    }

    #[test]
    fn describe_truncates_long_lines() {
        let text = "x".repeat(250);
        assert_eq!(describe_text(&text).len(), 100);
    }

    #[test]
    fn list_sorts_by_type_then_name() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "registry/skills/zeta/SKILL.md", "---\ndescription: z\n---\n");
        write(root, "registry/commands/commit.md", "Commit things");
        write(root, "registry/commands/catchup.md", "Catch up");
        write(root, "registry/commands/notes.txt", "ignored");
        write(root, "registry/agents/.hidden.md", "ignored");

        let assets = list(root, None).unwrap();
        let names: Vec<_> = assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["catchup", "commit", "zeta"]);
        assert_eq!(assets[2].description, "z");
        assert!(assets[2].size_bytes > 0);

        let only_skills = list(root, Some(AssetType::Skill)).unwrap();
        assert_eq!(only_skills.len(), 1);
    }

    #[test]
    fn add_copies_file_and_rejects_duplicate() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let src = root.join("incoming/review.md");
        io::atomic_write(&src, b"Review code").unwrap();

        let asset = add(root, &src, AssetType::Command, None).unwrap();
        assert_eq!(asset.name, "review");
        assert!(root.join("registry/commands/review.md").is_file());
        assert_eq!(asset.description, "Review code");

        assert!(matches!(
            add(root, &src, AssetType::Command, None),
            Err(MarketError::AssetExists(_))
        ));
    }

    #[test]
    fn add_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let err = add(dir.path(), &dir.path().join("nope.md"), AssetType::Agent, None);
        assert!(matches!(err, Err(MarketError::PathNotFound(_))));
    }

    #[test]
    fn search_matches_name_and_description() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "registry/agents/python-expert.md", "Writes idiomatic code");
        write(root, "registry/agents/sql-expert.md", "Tunes Python-backed queries");
        write(root, "registry/agents/debugger.md", "Finds bugs");

        let hits = search(root, "PYTHON").unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn sync_adds_new_and_skips_existing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "registry/skills/api-design/SKILL.md", "existing");
        write(root, "external/api-design/SKILL.md", "incoming duplicate");
        write(root, "external/feature-flags/SKILL.md", "new skill");
        write(root, "external/readme.txt", "ignored");

        let preview = sync(root, &root.join("external"), AssetType::Skill, true).unwrap();
        assert_eq!(preview.added, vec!["feature-flags"]);
        assert!(!root.join("registry/skills/feature-flags").exists());

        let report = sync(root, &root.join("external"), AssetType::Skill, false).unwrap();
        assert_eq!(report.added, vec!["feature-flags"]);
        assert_eq!(report.skipped, vec!["api-design"]);
        assert!(root.join("registry/skills/feature-flags/SKILL.md").is_file());
    }
}
