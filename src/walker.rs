//! # Directory Walker Module
//!
//! Produce una sequenza lazy di path assoluti per tutti i file regolari
//! sotto una o più root, visitate nell'ordine dato. FIFO, socket e device
//! vengono scartati: aprirli potrebbe bloccare la discovery.
//!
//! L'ordine dentro una root dipende dal filesystem. Con `follow_symlinks` i link
//! vengono seguiti e `walkdir` rileva i cicli; gli errori di traversal vengono
//! loggati e saltati.

use std::path::{Component, Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Recursive walk over several roots
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    roots: Vec<PathBuf>,
    follow_symlinks: bool,
}

impl DirectoryWalker {
    /// Relative roots are resolved against the current working directory
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            roots: roots.into_iter().map(|root| absolutize(root.as_ref())).collect(),
            follow_symlinks: false,
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Lazily yield every regular file. Each call starts a fresh walk.
    pub fn files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.roots.iter().flat_map(move |root| {
            WalkDir::new(root)
                .follow_links(self.follow_symlinks)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("Skipping unreadable entry: {}", e);
                        None
                    }
                })
                .filter(is_regular_file)
                .map(|entry| entry.into_path())
        })
    }
}

/// Unfollowed symlinks count when their target is a regular file
fn is_regular_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        return std::fs::metadata(entry.path())
            .map(|meta| meta.is_file())
            .unwrap_or(false);
    }
    file_type.is_file()
}

/// Resolve `path` against the current directory, dropping `.` components
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    joined
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("css/vendor")).unwrap();
        fs::write(root.join("index.html"), "<html></html>").unwrap();
        fs::write(root.join("css/site.css"), "body {}").unwrap();
        fs::write(root.join("css/vendor/reset.css"), "* {}").unwrap();
        temp_dir
    }

    #[test]
    fn test_walk_yields_nested_files_only() {
        let temp_dir = tree();
        let walker = DirectoryWalker::new([temp_dir.path()]);

        let files: BTreeSet<PathBuf> = walker.files().collect();
        let expected: BTreeSet<PathBuf> = [
            temp_dir.path().join("index.html"),
            temp_dir.path().join("css/site.css"),
            temp_dir.path().join("css/vendor/reset.css"),
        ]
        .into_iter()
        .collect();
        assert_eq!(files, expected);
        assert!(files.iter().all(|f| f.is_absolute()));
    }

    #[test]
    fn test_walk_is_restartable() {
        let temp_dir = tree();
        let walker = DirectoryWalker::new([temp_dir.path()]);
        assert_eq!(walker.files().count(), 3);
        assert_eq!(walker.files().count(), 3);
    }

    #[test]
    fn test_multiple_roots_are_concatenated_in_order() {
        let first = tree();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("app.js"), "let a = 1;").unwrap();

        let walker = DirectoryWalker::new([second.path(), first.path()]);
        let files: Vec<PathBuf> = walker.files().collect();
        assert_eq!(files.len(), 4);
        assert_eq!(files[0], second.path().join("app.js"));
        assert!(files[1..].iter().all(|f| f.starts_with(first.path())));
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let walker = DirectoryWalker::new(["/nonexistent/precompress-root"]);
        assert_eq!(walker.files().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let temp_dir = tree();
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("css/loop")).unwrap();

        let walker = DirectoryWalker::new([temp_dir.path()]).follow_symlinks(true);
        assert_eq!(walker.files().count(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_special_files_are_skipped() {
        let temp_dir = tree();
        let fifo = temp_dir.path().join("events");
        let status = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success());

        let walker = DirectoryWalker::new([temp_dir.path()]);
        let files: Vec<PathBuf> = walker.files().collect();
        assert_eq!(files.len(), 3);
        assert!(!files.contains(&fifo));
    }

    #[cfg(unix)]
    #[test]
    fn test_unfollowed_symlink_to_file_is_yielded() {
        let temp_dir = tree();
        let link = temp_dir.path().join("home.html");
        std::os::unix::fs::symlink(temp_dir.path().join("index.html"), &link).unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("css"), temp_dir.path().join("styles")).unwrap();

        let files: Vec<PathBuf> = DirectoryWalker::new([temp_dir.path()]).files().collect();
        assert_eq!(files.len(), 4);
        assert!(files.contains(&link));
    }

    #[test]
    fn test_absolutize_drops_current_dir_components() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolutize(Path::new(".")), cwd);
        assert_eq!(absolutize(Path::new("./dist/./assets")), cwd.join("dist/assets"));
        assert_eq!(absolutize(Path::new("/srv/./www")), PathBuf::from("/srv/www"));
    }
}
