use std::path::Path;

use crate::{Error, Result};

pub fn create_directory_for_file(p: &Path) -> Result {
    if let Some(parent_dir) = p.parent() {
        if parent_dir.as_os_str().is_empty() {
            return Ok(());
        }

        std::fs::create_dir_all(parent_dir).map_err(|e| {
            Error::Runtime(format!(
                "Failed to create output directory for file '{}' ({e})",
                p.to_string_lossy()
            ))
        })?;
    }

    Ok(())
}

/// Removes the file at the given path, a missing file is not an error
pub fn remove_file_if_exists(p: &Path) -> Result {
    match std::fs::remove_file(p) {
        Ok(()) => {
            log::debug!("Removed existing file '{}'", p.to_string_lossy());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Runtime(format!(
            "Failed to remove existing file '{}' ({e})",
            p.to_string_lossy()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_nested_output_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a").join("b").join("out.tif");
        create_directory_for_file(&file).unwrap();
        assert!(tmp.path().join("a").join("b").is_dir());
    }

    #[test]
    fn relative_file_without_parent() {
        assert!(create_directory_for_file(Path::new("out.tif")).is_ok());
    }

    #[test]
    fn remove_missing_file_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(remove_file_if_exists(&tmp.path().join("missing.tif")).is_ok());
    }

    #[test]
    fn remove_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("existing.tif");
        std::fs::write(&file, b"stale").unwrap();
        remove_file_if_exists(&file).unwrap();
        assert!(!file.exists());
    }
}
