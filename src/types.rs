//! # Conversion Data Model
//!
//! Tipi condivisi tra policy, scheduler e aggregatore:
//! - `ConversionRequest`: cosa convertire, dove scrivere, con che qualità
//! - `ConversionResult`: esito di una singola richiesta (prodotto una sola volta)
//! - `ConversionOutcome`: variante `Success` / `Failure`

use crate::config::ResizeBounds;
use crate::error::{ConvertError, FailureKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single file conversion, immutable once built
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    input_path: PathBuf,
    output_path: PathBuf,
    resize: Option<ResizeBounds>,
    quality: u8,
}

impl ConversionRequest {
    pub fn new(
        input_path: PathBuf,
        output_path: PathBuf,
        resize: Option<ResizeBounds>,
        quality: u8,
    ) -> Self {
        Self {
            input_path,
            output_path,
            resize,
            quality: quality.clamp(1, 100),
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn resize(&self) -> Option<ResizeBounds> {
        self.resize
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// File name used in reports
    pub fn file_name(&self) -> String {
        self.input_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }
}

/// Outcome of one conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    Success {
        original_bytes: u64,
        new_bytes: u64,
        /// `(1 - new/original) * 100`, negative when the output grew
        compression_ratio: f64,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

/// Result for one request, tagged with the originating file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub file_name: String,
    pub input_path: PathBuf,
    pub outcome: ConversionOutcome,
}

impl ConversionResult {
    /// Successful conversion. `original_bytes` must be non-zero.
    pub fn success(request: &ConversionRequest, original_bytes: u64, new_bytes: u64) -> Self {
        let compression_ratio = (1.0 - new_bytes as f64 / original_bytes as f64) * 100.0;
        Self {
            file_name: request.file_name(),
            input_path: request.input_path().to_path_buf(),
            outcome: ConversionOutcome::Success {
                original_bytes,
                new_bytes,
                compression_ratio,
            },
        }
    }

    pub fn failure(request: &ConversionRequest, error: &ConvertError) -> Self {
        Self {
            file_name: request.file_name(),
            input_path: request.input_path().to_path_buf(),
            outcome: ConversionOutcome::Failure {
                kind: error.kind(),
                message: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ConversionOutcome::Success { .. })
    }

    /// One-line human readable summary
    pub fn describe(&self) -> String {
        match &self.outcome {
            ConversionOutcome::Success { compression_ratio, .. } => {
                format!("[OK] {} - {:.1}% smaller", self.file_name, compression_ratio)
            }
            ConversionOutcome::Failure { message, .. } => {
                format!("[ERROR] {} - {}", self.file_name, message)
            }
        }
    }
}
