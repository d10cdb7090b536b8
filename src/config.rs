//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione della conversione batch.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di conversione
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `quality`: Qualità WebP (1-100, default: 80)
//! - `workers`: Numero di worker paralleli (default: 4)
//! - `recursive`: Scansione ricorsiva delle sottodirectory (default: true)
//! - `output_path`: Directory di output (default: None = `<input>/webp_converted`)
//! - `resize`: Limite massimo `larghezza x altezza` (default: None = nessun resize)
//! - `json_output`: Output JSON su stdout invece della progress bar (default: false)
//!
//! ## Validazione:
//! - Controlla che quality sia 1-100
//! - Controlla che workers sia > 0
//! - Controlla che i limiti di resize siano > 0
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     quality: 75,
//!     workers: 8,
//!     resize: Some(ResizeBounds::new(1920, 1080)),
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the output subdirectory used when no output path is configured
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "webp_converted";

/// Maximum output dimensions; images are shrunk to fit, never enlarged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeBounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl ResizeBounds {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self { max_width, max_height }
    }
}

impl FromStr for ResizeBounds {
    type Err = anyhow::Error;

    /// Parses `WIDTHxHEIGHT`, e.g. `1920x1080`
    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| {
                anyhow::anyhow!("Resize bounds must look like WIDTHxHEIGHT, got '{}'", s)
            })?;

        let max_width: u32 = w.trim().parse()
            .map_err(|e| anyhow::anyhow!("Invalid resize width '{}': {}", w, e))?;
        let max_height: u32 = h.trim().parse()
            .map_err(|e| anyhow::anyhow!("Invalid resize height '{}': {}", h, e))?;

        if max_width == 0 || max_height == 0 {
            return Err(anyhow::anyhow!("Resize bounds must be greater than 0"));
        }

        Ok(Self::new(max_width, max_height))
    }
}

/// Configuration for batch conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// WebP quality (1-100)
    pub quality: u8,
    /// Number of parallel workers
    pub workers: usize,
    /// Walk subdirectories of the input directory
    pub recursive: bool,
    /// Output directory for converted files (None = `<input>/webp_converted`)
    pub output_path: Option<PathBuf>,
    /// Shrink images to fit within these bounds
    pub resize: Option<ResizeBounds>,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quality: 80,
            workers: 4,
            recursive: true,
            output_path: None,
            resize: None,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(anyhow::anyhow!("WebP quality must be between 1 and 100"));
        }

        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if let Some(bounds) = self.resize {
            if bounds.max_width == 0 || bounds.max_height == 0 {
                return Err(anyhow::anyhow!("Resize bounds must be greater than 0"));
            }
        }

        // La directory di output può non esistere ancora, ma non deve essere un file
        if let Some(ref output_path) = self.output_path {
            if output_path.exists() && !output_path.is_dir() {
                return Err(anyhow::anyhow!(
                    "Output path is not a directory: {}",
                    output_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Output directory for a given input root
    pub fn resolve_output_dir(&self, input_dir: &Path) -> PathBuf {
        match self.output_path {
            Some(ref output_dir) => output_dir.clone(),
            None => input_dir.join(DEFAULT_OUTPUT_DIR_NAME),
        }
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
