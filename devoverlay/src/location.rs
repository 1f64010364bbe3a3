//! Resource locations.
//!
//! Locations are URLs, as hosts hand them out: plain `file:` URLs for loose
//! files and directories, and `jar:`/`zip:` URLs for entries packaged inside an
//! archive (`jar:file:/repo/lib/app.jar!/templates/page.ftl`).

use std::path::{Path, PathBuf};

use url::Url;

/// URL schemes that address an entry inside a packaged archive.
pub const ARCHIVE_SCHEMES: &[&str] = &["jar", "zip"];

/// Separator between the archive location and the entry inside it.
const ENTRY_SEPARATOR: &str = "!/";

/// Build a `file:` URL for a file path.
///
/// Returns `None` if the path cannot be expressed as a URL (e.g. it is
/// relative).
pub fn file_url(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}

/// Build a `file:` URL for a directory path (with a trailing slash).
pub fn dir_url(path: &Path) -> Option<Url> {
    Url::from_directory_path(path).ok()
}

/// Check whether a URL addresses an entry inside an archive.
pub fn is_archive_entry(url: &Url) -> bool {
    ARCHIVE_SCHEMES.contains(&url.scheme())
}

/// Extract the on-disk location of the archive containing `url`.
///
/// Returns `None` when the URL is not archive-contained or when the archive
/// itself is not a local file.
///
/// # Example
///
/// ```
/// use devoverlay::location::archive_path;
/// use std::path::PathBuf;
/// use url::Url;
///
/// let url = Url::parse("jar:file:/repo/lib/app.jar!/templates/page.ftl").unwrap();
/// assert_eq!(archive_path(&url), Some(PathBuf::from("/repo/lib/app.jar")));
/// ```
pub fn archive_path(url: &Url) -> Option<PathBuf> {
    if !is_archive_entry(url) {
        return None;
    }

    let inner = url.path();
    let archive = inner
        .split_once(ENTRY_SEPARATOR)
        .map(|(archive, _)| archive)
        .unwrap_or(inner);

    let archive_url = Url::parse(archive).ok()?;
    if archive_url.scheme() != "file" {
        return None;
    }
    archive_url.to_file_path().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url_for_absolute_path() {
        let url = file_url(Path::new("/proj/a/src/main/resources/x.txt")).unwrap();
        assert_eq!(url.scheme(), "file");
        assert_eq!(url.path(), "/proj/a/src/main/resources/x.txt");
    }

    #[test]
    fn test_file_url_rejects_relative_path() {
        assert!(file_url(Path::new("relative/x.txt")).is_none());
    }

    #[test]
    fn test_dir_url_has_trailing_slash() {
        let url = dir_url(Path::new("/proj/a/src/main/resources")).unwrap();
        assert!(url.as_str().ends_with("/resources/"));
    }

    #[test]
    fn test_archive_path_from_jar_url() {
        let url = Url::parse("jar:file:/repo/lib/app-1.0.jar!/META-INF/x.properties").unwrap();
        assert!(is_archive_entry(&url));
        assert_eq!(
            archive_path(&url),
            Some(PathBuf::from("/repo/lib/app-1.0.jar"))
        );
    }

    #[test]
    fn test_archive_path_nested_entry_uses_outer_archive() {
        let url = Url::parse("jar:file:/repo/app.war!/WEB-INF/lib/core.jar!/a.txt").unwrap();
        assert_eq!(archive_path(&url), Some(PathBuf::from("/repo/app.war")));
    }

    #[test]
    fn test_archive_path_decodes_escapes() {
        let url = Url::parse("zip:file:/my%20repo/lib.zip!/a.txt").unwrap();
        assert_eq!(archive_path(&url), Some(PathBuf::from("/my repo/lib.zip")));
    }

    #[test]
    fn test_archive_path_ignores_plain_files_and_remote_archives() {
        let file = Url::parse("file:///repo/a.txt").unwrap();
        assert!(!is_archive_entry(&file));
        assert_eq!(archive_path(&file), None);

        let remote = Url::parse("jar:http://example.com/app.jar!/a.txt").unwrap();
        assert_eq!(archive_path(&remote), None);
    }
}
