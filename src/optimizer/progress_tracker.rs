//! # Progress Tracking Module
//!
//! Unifica progress bar e output JSON in un singolo tracker.
//! Riceve gli esiti dallo scheduler in ordine di completamento.

use crate::{
    json_output::JsonMessage,
    progress::ProgressManager,
    report::BatchReport,
    types::ConversionResult,
};
use tracing::{info, warn};

/// Tracker progress unificato: progress bar oppure eventi JSON
pub struct ProgressTracker {
    total_files: usize,
    completed: usize,
    succeeded: usize,
    failed: usize,
    json_output: bool,
    progress_manager: ProgressManager,
}

impl ProgressTracker {
    /// Crea un nuovo tracker
    pub fn new(total_files: usize, json_output: bool) -> Self {
        let progress_manager = if json_output {
            ProgressManager::hidden(total_files as u64)
        } else {
            ProgressManager::new(total_files as u64)
        };

        Self {
            total_files,
            completed: 0,
            succeeded: 0,
            failed: 0,
            json_output,
            progress_manager,
        }
    }

    /// Tracker con barra nascosta, per i test
    #[cfg(test)]
    fn silent(total_files: usize) -> Self {
        Self {
            total_files,
            completed: 0,
            succeeded: 0,
            failed: 0,
            json_output: false,
            progress_manager: ProgressManager::hidden(total_files as u64),
        }
    }

    /// Gestisce completamento file con eventi JSON automatici
    pub fn handle_file_completion(&mut self, index: usize, result: &ConversionResult) {
        self.completed += 1;
        if result.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }

        if self.json_output {
            JsonMessage::file_complete(index, result).emit();
            JsonMessage::progress(self.completed, self.total_files, self.succeeded, self.failed)
                .emit();
            return;
        }

        // Senza terminale la barra non stampa nulla: la riga passa dal logger
        if self.progress_manager.is_hidden() {
            log_result(result);
        } else {
            self.progress_manager.println(&result.describe());
        }
        self.progress_manager.update(&result.file_name);
    }

    /// Finalizza progress bar e stampa il riepilogo
    pub fn finish(&self, report: &BatchReport) {
        if self.json_output {
            JsonMessage::complete(report).emit();
            return;
        }

        self.progress_manager.finish("done");
        for line in report.format_summary().lines() {
            info!("{}", line);
        }
        if report.failed > 0 {
            warn!("{} of {} files failed to convert", report.failed, report.total_requested);
        }
    }

}

fn log_result(result: &ConversionResult) {
    if result.is_success() {
        info!("{}", result.describe());
    } else {
        warn!("{}", result.describe());
    }
}
