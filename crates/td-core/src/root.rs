//! Store-root resolution: worktree redirection.
//!
//! Uses a `find_repo_local_config`-style walk-up-to-`.git` pattern,
//! retargeted at resolving the directory that
//! contains (or should contain) `.todos/`.
//!
//! Resolution order:
//! 1. `.td-root` file in the current directory (its contents are a path,
//!    absolute or relative to the file's directory, to the real root).
//! 2. An existing `.todos/` directory in the current directory.
//! 3. `.td-root` at the git top-level.
//! 4. An existing `.todos/` directory at the git top-level.
//! 5. A user-global associations file mapping cwd → store root (lower
//!    precedence than any `.td-root`).
//! 6. The current directory, unchanged.

use std::path::{Path, PathBuf};

fn git_top_level(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

fn read_td_root_file(dir: &Path) -> Option<PathBuf> {
    let marker = dir.join(".td-root");
    if !marker.exists() {
        return None;
    }
    let contents = std::fs::read_to_string(&marker).ok()?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return None;
    }
    let target = PathBuf::from(trimmed);
    if target.is_absolute() {
        Some(target)
    } else {
        Some(dir.join(target))
    }
}

fn has_todos_dir(dir: &Path) -> bool {
    dir.join(".todos").is_dir()
}

/// Look up `cwd` in the user-global associations file
/// (`<home>/.config/td/associations.toml`, `{ "<cwd>" = "<root>" }`).
fn lookup_global_association(home_dir: &Path, cwd: &Path) -> Option<PathBuf> {
    let path = home_dir.join(".config/td/associations.toml");
    let contents = std::fs::read_to_string(path).ok()?;
    let table: toml::Table = toml::from_str(&contents).ok()?;
    let key = cwd.to_string_lossy().to_string();
    table.get(&key)?.as_str().map(PathBuf::from)
}

/// Resolve the effective store root for `cwd`, following the worktree
/// redirection precedence chain. Never fails: falls back to `cwd` unchanged.
pub fn resolve_store_root(cwd: &Path, home_dir: &Path) -> PathBuf {
    if let Some(root) = read_td_root_file(cwd) {
        return root;
    }
    if has_todos_dir(cwd) {
        return cwd.to_path_buf();
    }
    if let Some(top) = git_top_level(cwd) {
        if let Some(root) = read_td_root_file(&top) {
            return root;
        }
        if has_todos_dir(&top) {
            return top;
        }
    }
    if let Some(root) = lookup_global_association(home_dir, cwd) {
        return root;
    }
    cwd.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_to_cwd_when_nothing_present() {
        let cwd = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let resolved = resolve_store_root(cwd.path(), home.path());
        assert_eq!(resolved, cwd.path());
    }

    #[test]
    fn prefers_existing_todos_dir_in_cwd() {
        let cwd = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        std::fs::create_dir(cwd.path().join(".todos")).unwrap();
        let resolved = resolve_store_root(cwd.path(), home.path());
        assert_eq!(resolved, cwd.path());
    }

    #[test]
    fn td_root_file_redirects() {
        let cwd = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        std::fs::write(cwd.path().join(".td-root"), target.path().to_str().unwrap()).unwrap();
        let resolved = resolve_store_root(cwd.path(), home.path());
        assert_eq!(resolved, target.path());
    }

    #[test]
    fn td_root_file_takes_precedence_over_local_todos_dir() {
        let cwd = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        std::fs::create_dir(cwd.path().join(".todos")).unwrap();
        std::fs::write(cwd.path().join(".td-root"), target.path().to_str().unwrap()).unwrap();
        let resolved = resolve_store_root(cwd.path(), home.path());
        assert_eq!(resolved, target.path());
    }

    #[test]
    fn falls_back_to_git_top_level_todos_dir() {
        let cwd = TempDir::new().unwrap();
        std::fs::create_dir(cwd.path().join(".git")).unwrap();
        std::fs::create_dir(cwd.path().join(".todos")).unwrap();
        let sub = cwd.path().join("a/b/c");
        std::fs::create_dir_all(&sub).unwrap();
        let home = TempDir::new().unwrap();
        let resolved = resolve_store_root(&sub, home.path());
        assert_eq!(resolved, cwd.path());
    }
}
