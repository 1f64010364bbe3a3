//! Recursive watch registration.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::roots::OverrideRoot;

use super::registry::WatchRegistry;

/// Watch `dir` and every directory below it, following symbolic links.
///
/// Walk errors (permissions, races with deletion, link loops) and directories
/// that cannot be watched are logged and skipped. Returns how many directories
/// were newly registered.
pub fn register_tree(registry: &mut WatchRegistry, dir: &Path) -> usize {
    let mut registered = 0;

    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry while registering watches");
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        match registry.register(entry.path()) {
            Ok(true) => registered += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(dir = %entry.path().display(), error = %e, "Failed to watch directory");
            }
        }
    }

    debug!(dir = %dir.display(), registered, "Registered directory tree");
    registered
}

/// Watch every override root's directory tree.
///
/// Returns the total number of directories registered.
pub fn register_all(registry: &mut WatchRegistry, roots: &[OverrideRoot]) -> usize {
    let total: usize = roots
        .iter()
        .map(|root| register_tree(registry, &root.path))
        .sum();

    info!(roots = roots.len(), directories = total, "Registered overlay watches");
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn root_with_dirs(temp: &TempDir, name: &str, dirs: &[&str]) -> OverrideRoot {
        let base = temp.path().canonicalize().unwrap().join(name);
        let path = base.join("src/main/resources");
        std::fs::create_dir_all(&path).unwrap();
        for dir in dirs {
            std::fs::create_dir_all(path.join(dir)).unwrap();
        }
        std::fs::write(path.join("file.txt"), "x").unwrap();
        OverrideRoot::new(name, base, path)
    }

    #[test]
    fn test_register_tree_watches_every_directory() {
        let temp = TempDir::new().unwrap();
        let root = root_with_dirs(&temp, "a", &["templates/mail", "static"]);
        let (mut registry, _rx) = WatchRegistry::with_channel().unwrap();

        let registered = register_tree(&mut registry, &root.path);

        // root, templates, templates/mail, static
        assert_eq!(registered, 4);
        assert!(registry.contains(&root.path.join("templates/mail")));
        assert!(!registry.contains(&root.path.join("file.txt")));
    }

    #[test]
    fn test_register_tree_twice_registers_nothing_new() {
        let temp = TempDir::new().unwrap();
        let root = root_with_dirs(&temp, "a", &["x"]);
        let (mut registry, _rx) = WatchRegistry::with_channel().unwrap();

        register_tree(&mut registry, &root.path);
        assert_eq!(register_tree(&mut registry, &root.path), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_all_covers_every_root() {
        let temp = TempDir::new().unwrap();
        let roots = vec![
            root_with_dirs(&temp, "a", &["x"]),
            root_with_dirs(&temp, "b", &["y", "z"]),
        ];
        let (mut registry, _rx) = WatchRegistry::with_channel().unwrap();

        assert_eq!(register_all(&mut registry, &roots), 5);
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let (mut registry, _rx) = WatchRegistry::with_channel().unwrap();
        assert_eq!(
            register_tree(&mut registry, Path::new("/nonexistent/devoverlay/root")),
            0
        );
        assert!(registry.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_followed() {
        let temp = TempDir::new().unwrap();
        let root = root_with_dirs(&temp, "a", &[]);
        let shared = temp.path().canonicalize().unwrap().join("shared");
        std::fs::create_dir_all(shared.join("inner")).unwrap();
        std::os::unix::fs::symlink(&shared, root.path.join("linked")).unwrap();
        let (mut registry, _rx) = WatchRegistry::with_channel().unwrap();

        register_tree(&mut registry, &root.path);

        assert!(registry.contains(&root.path.join("linked")));
        assert!(registry.contains(&root.path.join("linked/inner")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_watched_directory_is_an_alias() {
        let temp = TempDir::new().unwrap();
        let root = root_with_dirs(&temp, "a", &["sub/inner"]);
        let alias = root.path.join("alias");
        std::os::unix::fs::symlink(root.path.join("sub"), &alias).unwrap();
        let (mut registry, _rx) = WatchRegistry::with_channel().unwrap();

        assert_eq!(register_tree(&mut registry, &root.path), 5);

        std::fs::remove_file(&alias).unwrap();
        let id = registry.handle_for(&alias).unwrap();
        let removed = registry.remove_tree(id);

        assert_eq!(removed, vec![alias.clone(), alias.join("inner")]);
        assert_eq!(
            registry.paths(),
            vec![
                root.path.clone(),
                root.path.join("sub"),
                root.path.join("sub/inner"),
            ]
        );
    }
}
