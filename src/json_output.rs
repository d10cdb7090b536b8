//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso programmatico.
//!
//! ## Responsabilità:
//! - Emette messaggi JSON (uno per riga) su stdout per eventi di progresso
//! - Riutilizza `ConversionResult` e `BatchReport` come payload
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio della conversione batch
//! - `file_complete`: Fine elaborazione di un file (successo o errore)
//! - `progress`: Progresso corrente
//! - `complete`: Fine del batch con statistiche finali
//! - `error`: Errore fatale (es. directory di input inesistente)

use crate::{
    config::{Config, ResizeBounds},
    report::BatchReport,
    types::{ConversionOutcome, ConversionResult},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del processo di conversione
    Start {
        input_dir: PathBuf,
        output_dir: PathBuf,
        total_files: usize,
        config: JsonConfig,
    },

    /// Fine elaborazione di un file specifico
    FileComplete {
        index: usize,
        path: PathBuf,
        #[serde(flatten)]
        outcome: ConversionOutcome,
    },

    /// Progresso corrente
    Progress {
        current: usize,
        total: usize,
        percentage: f64,
        succeeded: usize,
        failed: usize,
    },

    /// Batch completato
    Complete {
        total_requested: usize,
        succeeded: usize,
        failed: usize,
        total_original_bytes: u64,
        total_new_bytes: u64,
        overall_ratio: Option<f64>,
        duration_seconds: f64,
    },

    /// Errore generale
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Configurazione per output JSON
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonConfig {
    pub quality: u8,
    pub workers: usize,
    pub recursive: bool,
    pub resize: Option<ResizeBounds>,
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(
        input_dir: PathBuf,
        output_dir: PathBuf,
        total_files: usize,
        config: JsonConfig,
    ) -> Self {
        Self::Start {
            input_dir,
            output_dir,
            total_files,
            config,
        }
    }

    pub fn file_complete(index: usize, result: &ConversionResult) -> Self {
        Self::FileComplete {
            index,
            path: result.input_path.clone(),
            outcome: result.outcome.clone(),
        }
    }

    pub fn progress(current: usize, total: usize, succeeded: usize, failed: usize) -> Self {
        let percentage = if total > 0 {
            (current as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Self::Progress {
            current,
            total,
            percentage,
            succeeded,
            failed,
        }
    }

    pub fn complete(report: &BatchReport) -> Self {
        Self::Complete {
            total_requested: report.total_requested,
            succeeded: report.succeeded,
            failed: report.failed,
            total_original_bytes: report.total_original_bytes,
            total_new_bytes: report.total_new_bytes,
            overall_ratio: report.overall_ratio,
            duration_seconds: report.elapsed.as_secs_f64(),
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            quality: config.quality,
            workers: config.workers,
            recursive: config.recursive,
            resize: config.resize,
        }
    }
}
