//! Folder scanning for supported images.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions picked up from a folder (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// Returns true if the path has a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// Image files directly inside `folder`, sorted by file name.
///
/// Subdirectories (including a previous output directory) are not entered.
pub fn image_files(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", folder.display()),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            files.push(entry.into_path());
        }
    }

    tracing::debug!(folder = %folder.display(), count = files.len(), "Scanned folder");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("a.png", true)]
    #[case("a.JPG", true)]
    #[case("a.Jpeg", true)]
    #[case("a.bmp", true)]
    #[case("a.gif", true)]
    #[case("a.webp", true)]
    #[case("a.tiff", false)]
    #[case("a.txt", false)]
    #[case("noext", false)]
    fn test_is_supported_image(#[case] name: &str, #[case] supported: bool) {
        assert_eq!(is_supported_image(Path::new(name)), supported);
    }

    #[test]
    fn test_image_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["c.jpg", "a.PNG", "b.txt", "d.webp"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let nested = dir.path().join("Watermarked_Images");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("e.jpg"), b"x").unwrap();

        let files = image_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "c.jpg", "d.webp"]);
    }

    #[test]
    fn test_image_files_missing_folder() {
        let dir = TempDir::new().unwrap();
        assert!(image_files(&dir.path().join("missing")).is_err());
    }
}
