use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::errors::{AimError, Result};

/// Collect the image files under `input_path`, sorted by file name.
///
/// A directory is listed one level deep unless `recursive` is set. A single file is
/// accepted as long as it has a supported extension.
pub fn collect_image_files(input_path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !input_path.exists() {
        return Err(AimError::PathNotFound {
            path: input_path.to_path_buf(),
        });
    }

    if input_path.is_file() {
        if !is_supported_image_format(input_path) {
            return Err(AimError::Validation {
                field: "input_path".to_string(),
                reason: format!("{} is not a supported image file", input_path.display()),
            });
        }
        return Ok(vec![input_path.to_path_buf()]);
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut image_files = Vec::new();

    let walker = WalkDir::new(input_path)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_file() && is_supported_image_format(path) {
            image_files.push(path.to_path_buf());
        }
    }

    debug!(
        "found {} image file(s) in {}",
        image_files.len(),
        input_path.display()
    );
    Ok(image_files)
}

/// Formats exiftool can write IPTC/XMP/EXIF caption fields into.
pub fn is_supported_image_format(path: &Path) -> bool {
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        matches!(
            extension.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "tif" | "tiff" | "webp"
        )
    } else {
        false
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_supported_formats() {
        let test_cases = vec![
            ("test.jpg", true),
            ("test.JPEG", true),
            ("test.png", true),
            ("test.tif", true),
            ("test.webp", true),
            ("test.txt", false),
            ("test.jpg.xmp", false),
            ("test", false),
        ];

        for (filename, expected) in test_cases {
            assert_eq!(
                is_supported_image_format(Path::new(filename)),
                expected,
                "{}",
                filename
            );
        }
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let result = collect_image_files(&missing, false);
        assert!(matches!(result, Err(AimError::PathNotFound { .. })));
    }

    #[test]
    fn test_empty_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        assert!(collect_image_files(temp_dir.path(), false)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_filtering_and_recursion() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        let nested = root.join("nested");
        fs::create_dir_all(&nested)?;

        fs::write(root.join("b.jpg"), b"")?;
        fs::write(root.join("a.PNG"), b"")?;
        fs::write(root.join("notes.txt"), b"")?;
        fs::write(root.join("._a.jpg"), b"")?;
        fs::write(nested.join("c.jpeg"), b"")?;

        let flat = collect_image_files(root, false)?;
        assert_eq!(flat, vec![root.join("a.PNG"), root.join("b.jpg")]);

        let deep = collect_image_files(root, true)?;
        assert_eq!(
            deep,
            vec![root.join("a.PNG"), root.join("b.jpg"), nested.join("c.jpeg")]
        );
        Ok(())
    }

    #[test]
    fn test_single_file_input() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let image = temp_dir.path().join("photo.jpg");
        let text = temp_dir.path().join("photo.txt");
        fs::write(&image, b"")?;
        fs::write(&text, b"")?;

        assert_eq!(collect_image_files(&image, false)?, vec![image.clone()]);
        assert!(matches!(
            collect_image_files(&text, false),
            Err(AimError::Validation { .. })
        ));
        Ok(())
    }
}
