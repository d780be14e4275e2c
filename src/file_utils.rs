use std::fs;
use std::path::Path;

use anyhow::Result;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Case-insensitive extension check, used by the fatal input validation
    pub fn extension_matches<P: AsRef<Path>>(path: P, extension: &str) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false)
    }

    /// The extension of a path as displayed in validation messages,
    /// e.g. ".TXT", or "no extension"
    pub fn describe_extension<P: AsRef<Path>>(path: P) -> String {
        match path.as_ref().extension() {
            Some(ext) => format!(".{}", ext.to_string_lossy().to_uppercase()),
            None => "no extension".to_string(),
        }
    }
}
