use std::path::{Path, PathBuf};

/// Resolve the marketplace root directory.
///
/// Priority:
/// 1. `--root` flag / `SKILLMART_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `registry/` or `plugins/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, is_marketplace)
        .or_else(|| find_upward(&cwd, |d| d.join(".git").is_dir()))
        .unwrap_or(cwd)
}

fn is_marketplace(dir: &Path) -> bool {
    dir.join(skillmart_core::paths::REGISTRY_DIR).is_dir()
        || dir.join(skillmart_core::paths::PLUGINS_DIR).is_dir()
}

fn find_upward(start: &Path, matches: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    start.ancestors().find(|d| matches(d)).map(Path::to_path_buf)
}
