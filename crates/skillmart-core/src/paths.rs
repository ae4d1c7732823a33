use crate::error::{MarketError, Result};
use crate::types::AssetType;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const REGISTRY_DIR: &str = "registry";
pub const PLUGINS_DIR: &str = "plugins";
pub const PLUGIN_META_DIR: &str = ".claude-plugin";
pub const PLUGIN_MANIFEST: &str = "plugin.json";

pub const CONFIG_FILE: &str = ".skillmart.yaml";

/// Files consulted, in order, for a directory asset's description.
pub const DESCRIPTION_FILES: &[&str] = &["SKILL.md", "README.md"];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn registry_dir(root: &Path) -> PathBuf {
    root.join(REGISTRY_DIR)
}

pub fn registry_type_dir(root: &Path, asset_type: AssetType) -> PathBuf {
    registry_dir(root).join(asset_type.dir_name())
}

pub fn plugins_dir(root: &Path) -> PathBuf {
    root.join(PLUGINS_DIR)
}

pub fn plugin_dir(root: &Path, name: &str) -> PathBuf {
    plugins_dir(root).join(name)
}

pub fn plugin_type_dir(root: &Path, name: &str, asset_type: AssetType) -> PathBuf {
    plugin_dir(root, name).join(asset_type.dir_name())
}

pub fn plugin_manifest(root: &Path, name: &str) -> PathBuf {
    plugin_dir(root, name)
        .join(PLUGIN_META_DIR)
        .join(PLUGIN_MANIFEST)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Locate an asset inside `dir`: a directory named `name` first, then
/// `name.md`. Returns `None` when neither exists.
pub fn find_asset_entry(dir: &Path, name: &str) -> Option<PathBuf> {
    let bare = dir.join(name);
    if bare.exists() {
        return Some(bare);
    }
    let md = dir.join(format!("{name}.md"));
    if md.exists() {
        return Some(md);
    }
    None
}

/// Asset name for a directory entry: `foo.md` -> `foo`, directories (and
/// symlinks, even dangling ones) keep their name. Hidden entries and
/// non-markdown files yield `None`.
pub fn asset_name_of(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    if file_name.starts_with('.') {
        return None;
    }
    if let Some(stem) = file_name.strip_suffix(".md") {
        return Some(stem.to_string());
    }
    if path.is_dir() || path.is_symlink() {
        return Some(file_name.to_string());
    }
    None
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9\-_.]*[a-z0-9]$|^[a-z0-9]$").expect("valid name regex")
    })
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) || name.contains("..") {
        return Err(MarketError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn valid_names() {
        for name in ["api-design", "a", "review.api", "code_analysis", "x1"] {
            validate_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_names() {
        for name in [
            "",
            "-starts-with-dash",
            "ends-with-dash-",
            "has spaces",
            "UPPER",
            "../escape",
            "a..b",
        ] {
            assert!(validate_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/mkt");
        assert_eq!(
            plugin_manifest(root, "dx-tools"),
            PathBuf::from("/tmp/mkt/plugins/dx-tools/.claude-plugin/plugin.json")
        );
        assert_eq!(
            registry_type_dir(root, AssetType::Skill),
            PathBuf::from("/tmp/mkt/registry/skills")
        );
        assert_eq!(config_path(root), PathBuf::from("/tmp/mkt/.skillmart.yaml"));
    }

    #[test]
    fn find_asset_entry_prefers_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("api-design")).unwrap();
        std::fs::write(dir.path().join("commit.md"), "# commit").unwrap();

        assert_eq!(
            find_asset_entry(dir.path(), "api-design"),
            Some(dir.path().join("api-design"))
        );
        assert_eq!(
            find_asset_entry(dir.path(), "commit"),
            Some(dir.path().join("commit.md"))
        );
        assert_eq!(find_asset_entry(dir.path(), "missing"), None);
    }

    #[test]
    fn asset_name_of_skips_hidden_and_non_markdown() {
        let dir = TempDir::new().unwrap();
        let hidden = dir.path().join(".DS_Store");
        let txt = dir.path().join("notes.txt");
        let md = dir.path().join("catchup.md");
        for p in [&hidden, &txt, &md] {
            std::fs::write(p, "x").unwrap();
        }
        assert_eq!(asset_name_of(&hidden), None);
        assert_eq!(asset_name_of(&txt), None);
        assert_eq!(asset_name_of(&md), Some("catchup".to_string()));
    }
}
