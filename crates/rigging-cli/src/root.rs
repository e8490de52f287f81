use rigging_core::paths::RIGGING_DIR;
use std::path::{Path, PathBuf};

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

/// Resolve the project root.
///
/// `--root` / `RIGGING_ROOT` wins; otherwise the nearest ancestor holding
/// `.rigging/`, then `.git/`, then the working directory.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(&cwd)
}

fn resolve_from(cwd: &Path) -> PathBuf {
    find_upward(cwd, RIGGING_DIR)
        .or_else(|| find_upward(cwd, ".git"))
        .unwrap_or_else(|| cwd.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn finds_rigging_dir_above_cwd() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".rigging")).unwrap();
        let deep = dir.path().join("blueprints/web");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(resolve_from(&deep), dir.path());
    }

    #[test]
    fn rigging_dir_beats_git_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let project = dir.path().join("project");
        std::fs::create_dir_all(project.join(".rigging")).unwrap();
        assert_eq!(resolve_from(&project), project);
    }
}
