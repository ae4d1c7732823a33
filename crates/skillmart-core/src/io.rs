use crate::error::{MarketError, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting manifests and generated files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Recursively copy a file or directory tree.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    if src.is_file() {
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(src, dst)?;
        return Ok(());
    }
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        copy_tree(&entry.path(), &dst.join(entry.file_name()))?;
    }
    Ok(())
}

/// Remove a file, symlink, or directory tree. Missing paths are ignored.
pub fn remove_entry(path: &Path) -> Result<()> {
    if path.is_symlink() || path.is_file() {
        std::fs::remove_file(path)?;
    } else if path.is_dir() {
        std::fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// Total size in bytes of a file, or of every file under a directory.
pub fn tree_size(path: &Path) -> u64 {
    if path.is_file() {
        return path.metadata().map(|m| m.len()).unwrap_or(0);
    }
    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

// ---------------------------------------------------------------------------
// Symlinks
// ---------------------------------------------------------------------------

/// Make `path` absolute against the current directory and fold `.`/`..`
/// components lexically. The path does not need to exist.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(path)
    };
    let mut out = PathBuf::new();
    for comp in joined.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Relative path that leads from directory `from_dir` to `to`.
pub fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from = absolutize(from_dir);
    let to = absolutize(to);
    let from_parts: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from_parts.len() {
        rel.push("..");
    }
    for comp in &to_parts[common..] {
        rel.push(comp.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

/// Point `link_path` at `target` with a relative symlink, replacing any file
/// or symlink already there. A real directory at `link_path` is left alone
/// and reported as an error.
pub fn link(target: &Path, link_path: &Path) -> Result<()> {
    if link_path.is_symlink() || link_path.is_file() {
        std::fs::remove_file(link_path)?;
    } else if link_path.is_dir() {
        return Err(MarketError::PathExists(link_path.display().to_string()));
    }
    let parent = link_path.parent().unwrap_or(Path::new("."));
    ensure_dir(parent)?;
    // Compare physical locations so symlinked ancestors of the root do not
    // skew the `..` count.
    let from = std::fs::canonicalize(parent).unwrap_or_else(|_| absolutize(parent));
    let to = std::fs::canonicalize(target).unwrap_or_else(|_| absolutize(target));
    let rel = relative_path(&from, &to);
    symlink(&rel, target.is_dir(), link_path)?;
    Ok(())
}

#[cfg(unix)]
fn symlink(rel: &Path, _is_dir: bool, link_path: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(rel, link_path)
}

#[cfg(windows)]
fn symlink(rel: &Path, is_dir: bool, link_path: &Path) -> std::io::Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(rel, link_path)
    } else {
        std::os::windows::fs::symlink_file(rel, link_path)
    }
}

/// Resolve a symlink to an absolute target path without requiring the
/// target to exist.
pub fn link_target(link_path: &Path) -> Result<PathBuf> {
    let raw = std::fs::read_link(link_path)?;
    if raw.is_absolute() {
        return Ok(absolutize(&raw));
    }
    let parent = link_path.parent().unwrap_or(Path::new("."));
    Ok(absolutize(&parent.join(raw)))
}
