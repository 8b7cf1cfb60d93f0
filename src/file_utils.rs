use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::errors::AppError;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<(), AppError> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .map_err(|e| AppError::File(format!("Failed to create directory {}: {}", path.display(), e)))?;
        }
        Ok(())
    }

    /// Read a UTF-8 file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String, AppError> {
        let path = path.as_ref();
        fs::read_to_string(path)
            .map_err(|e| AppError::File(format!("Failed to read file {}: {}", path.display(), e)))
    }

    /// Write a string to a file without ever exposing a partial file
    ///
    /// Content goes to a temporary file in the destination directory which is
    /// then renamed over the target. On error the target is left untouched.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> Result<(), AppError> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Self::ensure_dir(parent)?;

        let mut temp = NamedTempFile::new_in(parent)
            .map_err(|e| AppError::File(format!("Failed to create temporary file in {}: {}", parent.display(), e)))?;
        temp.write_all(content.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| AppError::File(format!("Failed to write temporary file for {}: {}", path.display(), e)))?;
        temp.persist(path)
            .map_err(|e| AppError::File(format!("Failed to write to file {}: {}", path.display(), e.error)))?;

        Ok(())
    }
}
