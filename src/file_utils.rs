use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::document::DocumentKind;

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

    /// Read a whole file, e.g. a glossary CSV
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    // @checks: File name ends with `-{target_language}` before the extension
    pub fn is_translated_output<P: AsRef<Path>>(path: P, target_language: &str) -> bool {
        let suffix = format!("-{}", target_language).to_lowercase();
        path.as_ref()
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase().ends_with(&suffix))
            .unwrap_or(false)
    }

    /// Find supported documents in a directory tree, sorted by path
    ///
    /// Files that already look like outputs for `target_language` and Office
    /// lock files (`~$name.xlsx`) are skipped.
    pub fn find_documents<P: AsRef<Path>>(dir: P, target_language: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() || DocumentKind::from_path(path).is_none() {
                continue;
            }
            let is_lock_file = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("~$"))
                .unwrap_or(false);
            if is_lock_file || Self::is_translated_output(path, target_language) {
                continue;
            }
            result.push(path.to_path_buf());
        }

        result.sort();
        Ok(result)
    }
}
