//! # Batch Report Module
//!
//! Riduzione pura della lista di `ConversionResult` in un `BatchReport`.
//!
//! ## Regole:
//! - Successi e fallimenti si contano partizionando sulla variante dell'esito
//! - Totali in byte e ratio complessivo solo sui `Success`
//! - Zero successi → `overall_ratio = None` (nessuna divisione per zero)
//! - Nessun I/O, nessuna mutazione degli input

use crate::file_manager::FileManager;
use crate::types::{ConversionOutcome, ConversionResult};
use serde::Serialize;
use std::time::Duration;

/// Aggregated totals for one batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub total_requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_original_bytes: u64,
    pub total_new_bytes: u64,
    /// `None` when nothing converted successfully
    pub overall_ratio: Option<f64>,
    pub elapsed: Duration,
}

impl BatchReport {
    /// Reduce per-file results into totals
    pub fn summarize(results: &[ConversionResult], elapsed: Duration) -> Self {
        let mut succeeded = 0;
        let mut failed = 0;
        let mut total_original_bytes = 0u64;
        let mut total_new_bytes = 0u64;

        for result in results {
            match result.outcome {
                ConversionOutcome::Success { original_bytes, new_bytes, .. } => {
                    succeeded += 1;
                    total_original_bytes += original_bytes;
                    total_new_bytes += new_bytes;
                }
                ConversionOutcome::Failure { .. } => failed += 1,
            }
        }

        let overall_ratio = if succeeded > 0 {
            FileManager::calculate_reduction(total_original_bytes, total_new_bytes)
        } else {
            None
        };

        Self {
            total_requested: results.len(),
            succeeded,
            failed,
            total_original_bytes,
            total_new_bytes,
            overall_ratio,
            elapsed,
        }
    }

    /// Multi-line summary for the console
    pub fn format_summary(&self) -> String {
        let ratio = match self.overall_ratio {
            Some(ratio) => format!("{:.1}%", ratio),
            None => "n/a".to_string(),
        };

        format!(
            "Conversion completed in {:.1}s\n\
             Results: {}/{} successful ({} failed)\n\
             Total size: {} -> {}\n\
             Overall compression: {}",
            self.elapsed.as_secs_f64(),
            self.succeeded,
            self.total_requested,
            self.failed,
            FileManager::format_size(self.total_original_bytes),
            FileManager::format_size(self.total_new_bytes),
            ratio
        )
    }
}
