//! # Path Resolution Module
//!
//! Centralizza tutta la logica di calcolo dei path di output.
//! - Mirror della struttura di sottodirectory dell'input sotto la directory di output
//! - Path unici: due input con lo stesso stem nella stessa directory
//!   (es. `a.jpg` e `a.png`) non possono scrivere lo stesso file
//! - Creazione lazy, una sola volta, delle directory di output

use crate::error::ConvertError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver {
    input_base_dir: PathBuf,
    output_dir: PathBuf,
    extension: &'static str,
    assigned: HashSet<PathBuf>,
}

impl PathResolver {
    pub fn new(input_base_dir: &Path, output_dir: &Path, extension: &'static str) -> Self {
        Self {
            input_base_dir: input_base_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            extension,
            assigned: HashSet::new(),
        }
    }

    /// Calcola il path di output per un file dato, unico tra quelli già assegnati
    pub fn get_output_path(&mut self, input_path: &Path) -> Result<PathBuf, ConvertError> {
        let file_stem = input_path
            .file_stem()
            .ok_or_else(|| {
                ConvertError::Other(format!("Invalid file name: {}", input_path.display()))
            })?
            .to_string_lossy()
            .into_owned();

        let relative_dir = match input_path.strip_prefix(&self.input_base_dir) {
            Ok(rel) => rel.parent().unwrap_or(Path::new("")).to_path_buf(),
            Err(e) => {
                // Fuori dalla base: finisce direttamente nella directory di output
                debug!("[WARN] Strip prefix failed for {}: {}", input_path.display(), e);
                PathBuf::new()
            }
        };
        let target_dir = self.output_dir.join(relative_dir);

        let mut candidate = target_dir.join(format!("{}.{}", file_stem, self.extension));

        if self.assigned.contains(&candidate) {
            let source_ext = input_path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let base = format!("{}_{}", file_stem, source_ext);
            candidate = target_dir.join(format!("{}.{}", base, self.extension));

            let mut counter = 2;
            while self.assigned.contains(&candidate) {
                candidate = target_dir.join(format!("{}_{}.{}", base, counter, self.extension));
                counter += 1;
            }
            debug!(
                "Output name collision for {}, using {}",
                input_path.display(),
                candidate.display()
            );
        }

        self.assigned.insert(candidate.clone());
        Ok(candidate)
    }
}

/// Registro thread-safe delle directory di output già create
#[derive(Debug, Default)]
pub struct OutputDirs {
    created: Mutex<HashSet<PathBuf>>,
}

impl OutputDirs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crea la directory parent di `output_path` se non già fatto in questo batch
    pub fn ensure_parent(&self, output_path: &Path) -> Result<(), ConvertError> {
        let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        // Il lock resta preso durante la creazione: ogni directory viene creata una volta
        let mut created = self.created.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if created.contains(parent) {
            return Ok(());
        }

        std::fs::create_dir_all(parent).map_err(|e| {
            ConvertError::Other(format!(
                "Failed to create output directory {}: {}",
                parent.display(),
                e
            ))
        })?;
        debug!("Created output directory: {}", parent.display());
        created.insert(parent.to_path_buf());
        Ok(())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.created.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
