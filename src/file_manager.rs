//! # File Management Module
//!
//! Questo modulo gestisce la discovery delle immagini e le utilità sui file.
//!
//! ## Responsabilità:
//! - Discovery (ricorsiva o solo primo livello) di immagini in una directory
//! - Filtro per estensione, case-insensitive
//! - Utilità per calcoli dimensioni e percentuali
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati supportati:
//! - **Immagini**: JPG, JPEG, PNG, BMP, TIFF, TIF
//!
//! ## Ordine:
//! L'ordine di traversal è stabile: le entry di ogni directory sono ordinate per
//! nome, così due run sullo stesso albero producono la stessa sequenza.
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::find_images(Path::new("/path/to/photos"), true)?;
//! ```

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Extensions accepted as conversion inputs (lowercase, no dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Find all supported images under `root`.
    ///
    /// With `recursive = false` only the immediate children of `root` are
    /// considered. Directories and non-matching files are skipped.
    pub fn find_images(root: &Path, recursive: bool) -> Result<Vec<PathBuf>, ConvertError> {
        if !root.is_dir() {
            return Err(ConvertError::NotFound(root.to_path_buf()));
        }

        let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();

        for entry in walker.into_iter().filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("Skipping unreadable entry: {}", err);
                None
            }
        }) {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if Self::is_supported_format(path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Check if a file extension is in the supported set
    pub fn is_supported_format(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext_lower.as_str())
        } else {
            false
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction, `None` when there is nothing to compare
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> Option<f64> {
        if original_size == 0 {
            None
        } else {
            Some((1.0 - new_size as f64 / original_size as f64) * 100.0)
        }
    }
}
