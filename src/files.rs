//! Working-directory handling for one account's in-flight images.
//!
//! The directory is scratch space: populated by the download stage, rewritten
//! by the convert/normalize stages, drained by cleanup. It is never held in
//! memory; every stage re-enumerates, so files left behind by a failed
//! cleanup are simply picked up again next cycle.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{NormalizeError, SetupError};

pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Creates the directory if missing. A failure here is a setup error:
    /// the account cannot run without its scratch space.
    pub fn setup(root: PathBuf) -> Result<Self, SetupError> {
        fs::create_dir_all(&root).map_err(|source| SetupError::WorkDir {
            path: root.clone(),
            source,
        })?;
        debug!(path = %root.display(), "working directory ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All files currently in the directory, sorted for a stable stage order.
    pub fn files(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    /// The `.png` files currently in the directory.
    pub fn png_files(&self) -> std::io::Result<Vec<PathBuf>> {
        Ok(self
            .files()?
            .into_iter()
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect())
    }

    /// Re-encodes a `.png` as `.jpg` next to it and deletes the original.
    /// Returns the path of the new file.
    pub fn convert_png_to_jpg(&self, path: &Path) -> Result<PathBuf, NormalizeError> {
        let img = image::open(path).map_err(|source| NormalizeError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let jpg_path = path.with_extension("jpg");
        // JPEG has no alpha channel; drop it before encoding.
        img.to_rgb8()
            .save(&jpg_path)
            .map_err(|source| NormalizeError::Image {
                path: jpg_path.clone(),
                source,
            })?;
        fs::remove_file(path).map_err(|source| NormalizeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(from = %path.display(), to = %jpg_path.display(), "converted png to jpg");
        Ok(jpg_path)
    }

    /// Deletes every file in the directory. A failed deletion is logged and
    /// does not stop the rest; the leftover is retried next cycle. Returns
    /// how many files were removed.
    pub fn clear(&self) -> std::io::Result<usize> {
        Ok(remove_files(&self.files()?))
    }
}

/// Removes each path in turn. One failure is logged and skipped; the rest
/// are still attempted. Returns the number of successful deletions.
fn remove_files(paths: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not delete file during cleanup")
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
            .save(&path)
            .expect("write test png");
        path
    }

    #[test]
    fn setup_creates_missing_directory() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("nested").join("scratch");
        let workdir = WorkDir::setup(root.clone()).expect("setup succeeds");
        assert!(root.is_dir());
        assert!(workdir.files().unwrap().is_empty());
    }

    #[test]
    fn png_enumeration_only_lists_pngs() {
        let tmp = tempdir().unwrap();
        let workdir = WorkDir::setup(tmp.path().to_path_buf()).unwrap();
        write_png(tmp.path(), "a.png", 4, 4);
        std::fs::write(tmp.path().join("b.jpg"), b"not a real jpg").unwrap();
        let pngs = workdir.png_files().unwrap();
        assert_eq!(pngs.len(), 1);
        assert!(pngs[0].ends_with("a.png"));
    }

    #[test]
    fn convert_replaces_png_with_jpg() {
        let tmp = tempdir().unwrap();
        let workdir = WorkDir::setup(tmp.path().to_path_buf()).unwrap();
        let png = write_png(tmp.path(), "shot.png", 8, 6);
        let jpg = workdir.convert_png_to_jpg(&png).expect("conversion succeeds");
        assert!(!png.exists());
        assert!(jpg.exists());
        let (w, h) = image::image_dimensions(&jpg).unwrap();
        assert_eq!((w, h), (8, 6));
    }

    #[test]
    fn clear_empties_the_directory() {
        let tmp = tempdir().unwrap();
        let workdir = WorkDir::setup(tmp.path().to_path_buf()).unwrap();
        write_png(tmp.path(), "a.png", 4, 4);
        write_png(tmp.path(), "b.png", 4, 4);
        let removed = workdir.clear().unwrap();
        assert_eq!(removed, 2);
        assert!(workdir.files().unwrap().is_empty());
    }

    #[test]
    fn one_failed_deletion_does_not_stop_the_rest() {
        let tmp = tempdir().unwrap();
        let a = write_png(tmp.path(), "a.png", 4, 4);
        let gone = tmp.path().join("already-gone.png");
        let b = write_png(tmp.path(), "b.png", 4, 4);

        let removed = remove_files(&[a.clone(), gone, b.clone()]);

        // The undeletable entry is skipped; both real files are removed and
        // only successes are counted.
        assert_eq!(removed, 2);
        assert!(!a.exists());
        assert!(!b.exists());
    }
}
