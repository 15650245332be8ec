//! Local file access for the shell

use anyhow::{Context, Result};
use pixlab_document::BinaryRef;
use std::path::{Path, PathBuf};

/// Extensions accepted as image inputs
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];

pub(crate) fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Read a file into a named payload; the name is the final path component
pub(crate) fn read_image(path: &Path) -> Result<BinaryRef> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.png".to_string());
    Ok(BinaryRef::new(name, bytes))
}

/// Expand directories one level and keep image files, in sorted order
///
/// Explicit file arguments that are not images are skipped too.
pub(crate) fn collect_images(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries = std::fs::read_dir(path)
                .with_context(|| format!("cannot list {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image(p))
                .collect::<Vec<_>>();
            entries.sort();
            found.extend(entries);
        } else if is_image(path) {
            found.push(path.clone());
        } else {
            tracing::warn!(path = %path.display(), "skipping non-image file");
        }
    }
    Ok(found)
}

/// Write a payload, creating parent directories
pub(crate) fn write_payload(path: &Path, payload: &BinaryRef) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(path, payload.bytes())
        .with_context(|| format!("cannot write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn image_extensions_ignore_case() {
        assert!(is_image(Path::new("a/photo.PNG")));
        assert!(is_image(Path::new("scan.jpeg")));
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("README")));
    }

    #[test]
    fn directories_expand_to_sorted_images() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        let loose = dir.path().join("loose.txt");

        let found = collect_images(&[dir.path().to_path_buf(), loose]).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn read_and_write_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.png");
        std::fs::write(&source, b"pixels").unwrap();

        let payload = read_image(&source).unwrap();
        assert_eq!(payload.name(), "in.png");

        let target = dir.path().join("nested/out.png");
        write_payload(&target, &payload).unwrap();
        assert_eq!(std::fs::read(target).unwrap(), b"pixels");

        assert!(read_image(&dir.path().join("missing.png")).is_err());
    }
}
