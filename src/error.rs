//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore della conversione batch.
//!
//! ## Responsabilità:
//! - Definisce `ConvertError` enum per categorizzare tutti gli errori possibili
//! - Definisce `FailureKind`, la classificazione per-file riportata nei risultati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `NotFound`: Directory di input inesistente (fatale, blocca il batch)
//! - `Decode`: File illeggibile o corrotto (per-file)
//! - `InvalidInput`: Input degenere, es. file di zero byte (per-file)
//! - `Io` / `Encode` / `Other`: Errori durante normalize/resize/encode (per-file)
//!
//! ## Propagazione:
//! Solo `NotFound` interrompe l'intero run. Tutti gli altri errori vengono
//! catturati al confine della `ConversionPolicy` e trasformati in un
//! `ConversionOutcome::Failure`, senza mai uscire da un worker.
//!
//! ## Esempio:
//! ```rust,ignore
//! if !root.is_dir() {
//!     return Err(ConvertError::NotFound(root.to_path_buf()));
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Custom error types for batch conversion
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Input directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebP encoding error: {0}")]
    Encode(String),

    #[error("{0}")]
    Other(String),
}

impl ConvertError {
    /// Classificazione per-file dell'errore
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Decode(_) => FailureKind::Decode,
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            // NotFound non arriva mai qui da un singolo file, ma se succede non è fatale
            Self::NotFound(_) | Self::Io(_) | Self::Encode(_) | Self::Other(_) => {
                FailureKind::Other
            }
        }
    }
}

/// Per-file failure classification carried by a failed conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Decode,
    InvalidInput,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Decode => "decode error",
            Self::InvalidInput => "invalid input",
            Self::Other => "error",
        };
        f.write_str(label)
    }
}
