//! File discovery.
//!
//! Stage 1 of the pipeline. Walks the input root recursively and returns every
//! regular file whose extension (case-insensitive) is in the requested set.
//! The same walk, with derivative extensions, feeds manifest emission.
//!
//! Walk order is deterministic: entries are visited sorted by file name, so
//! the result is sorted by path. Symbolic links are followed; a link that
//! points back at one of its own ancestors is reported as
//! [`DiscoverError::SymlinkLoop`]. A dangling link with a matching extension
//! is still returned, so it fails on its own when opened. Any other
//! unreadable directory or entry aborts the walk.

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("cannot resolve {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("symlink loop at {path} (points back to {ancestor})")]
    SymlinkLoop { path: PathBuf, ancestor: PathBuf },
    #[error("cannot read {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// A discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the root it was discovered under.
    pub relative: PathBuf,
}

/// Discover every supported source image under `root`.
pub fn discover_images(root: &Path) -> Result<Vec<ImageFile>, DiscoverError> {
    discover_files(root, supported_input_extensions())
}

/// Discover every file under `root` whose lowercased extension is in
/// `extensions`. Extensions are given lowercase and without the dot.
pub fn discover_files(root: &Path, extensions: &[&str]) -> Result<Vec<ImageFile>, DiscoverError> {
    let root = std::path::absolute(root).map_err(|source| DiscoverError::Root {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => match dangling_link(&err) {
                Some(path) => {
                    if has_extension(&path, extensions) {
                        tracing::warn!(path = %path.display(), "dangling symlink");
                        files.push(image_file(&root, path));
                    }
                    continue;
                }
                None => return Err(walk_error(&root, err)),
            },
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
            continue;
        }
        files.push(image_file(&root, entry.into_path()));
    }

    tracing::debug!(root = %root.display(), count = files.len(), "discovery finished");
    Ok(files)
}

fn image_file(root: &Path, path: PathBuf) -> ImageFile {
    let relative = path
        .strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.clone());
    ImageFile { path, relative }
}

/// Path of a symlink below the root whose target does not exist.
fn dangling_link(err: &walkdir::Error) -> Option<PathBuf> {
    if err.depth() == 0 || err.loop_ancestor().is_some() {
        return None;
    }
    let path = err.path()?;
    let is_link = std::fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink());
    (is_link && std::fs::metadata(path).is_err()).then(|| path.to_path_buf())
}

fn walk_error(root: &Path, err: walkdir::Error) -> DiscoverError {
    let path = err.path().unwrap_or(root).to_path_buf();
    if let Some(ancestor) = err.loop_ancestor() {
        return DiscoverError::SymlinkLoop {
            ancestor: ancestor.to_path_buf(),
            path,
        };
    }
    DiscoverError::Walk { path, source: err }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn relatives(files: &[ImageFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| crate::naming::to_slash_path(&f.relative))
            .collect()
    }

    #[test]
    fn finds_every_supported_extension_in_any_case() {
        let tmp = TempDir::new().unwrap();
        for name in [
            "a.jpg", "b.JPEG", "c.Png", "d.gif", "e.TIFF", "f.bmp", "g.JpG",
        ] {
            touch(tmp.path(), name);
        }

        let files = discover_images(tmp.path()).unwrap();
        assert_eq!(files.len(), 7);
    }

    #[test]
    fn skips_unsupported_files() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "photo.jpg");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "vector.svg");
        touch(tmp.path(), "modern.webp");
        touch(tmp.path(), "already.avif");
        touch(tmp.path(), "noextension");

        let files = discover_images(tmp.path()).unwrap();
        assert_eq!(relatives(&files), vec!["photo.jpg"]);
    }

    #[test]
    fn recurses_and_sorts_by_path() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "work/2024/z.jpg");
        touch(tmp.path(), "work/a.png");
        touch(tmp.path(), "b.gif");
        touch(tmp.path(), "about/me.jpg");

        let files = discover_images(tmp.path()).unwrap();
        assert_eq!(
            relatives(&files),
            vec!["about/me.jpg", "b.gif", "work/2024/z.jpg", "work/a.png"]
        );
    }

    #[test]
    fn paths_are_absolute() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "x/y.jpg");

        let files = discover_images(tmp.path()).unwrap();
        assert!(files[0].path.is_absolute());
        assert!(files[0].path.ends_with("x/y.jpg"));
    }

    #[test]
    fn directory_named_like_image_is_not_a_file() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("folder.jpg")).unwrap();

        assert!(discover_images(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn custom_extension_filter() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "hero.avif");
        touch(tmp.path(), "hero-small.jpg");
        touch(tmp.path(), "hero.gif");

        let files = discover_files(tmp.path(), &["avif", "jpg"]).unwrap();
        assert_eq!(relatives(&files), vec!["hero-small.jpg", "hero.avif"]);
    }

    #[test]
    fn empty_root_finds_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(discover_images(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = discover_images(&tmp.path().join("missing"));
        assert!(matches!(result, Err(DiscoverError::Walk { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinked_directories() {
        let tmp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        touch(elsewhere.path(), "linked.jpg");
        std::os::unix::fs::symlink(elsewhere.path(), tmp.path().join("shared")).unwrap();

        let files = discover_images(tmp.path()).unwrap();
        assert_eq!(relatives(&files), vec!["shared/linked.jpg"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_error() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a/photo.jpg");
        std::os::unix::fs::symlink(tmp.path().join("a"), tmp.path().join("a/back")).unwrap();

        let result = discover_images(tmp.path());
        assert!(matches!(result, Err(DiscoverError::SymlinkLoop { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_kept_as_candidate() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "ok.jpg");
        std::os::unix::fs::symlink(tmp.path().join("gone.jpg"), tmp.path().join("stale.jpg"))
            .unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.txt"), tmp.path().join("stale.txt"))
            .unwrap();

        let files = discover_images(tmp.path()).unwrap();
        assert_eq!(relatives(&files), vec!["ok.jpg", "stale.jpg"]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_in_subdirectory_does_not_stop_the_walk() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a/first.png");
        touch(tmp.path(), "b/last.png");
        std::os::unix::fs::symlink(tmp.path().join("nowhere"), tmp.path().join("a/link.png"))
            .unwrap();

        let files = discover_images(tmp.path()).unwrap();
        assert_eq!(
            relatives(&files),
            vec!["a/first.png", "a/link.png", "b/last.png"]
        );
    }
}
