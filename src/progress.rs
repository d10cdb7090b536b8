//! # Progress Bar Module
//!
//! Feedback visuale real-time con `indicatif` durante la conversione batch.
//!
//! ## Responsabilità:
//! - Progress bar con percentuale completamento, tempo elapsed
//! - Una riga per file sopra la barra (successo con % o errore con messaggio)
//! - Spinner per la fase di discovery
//!
//! ## Visual feedback:
//! ```text
//! [OK] photo.jpg - 45.2% smaller
//! [ERROR] broken.png - Decode error: ...
//! ⠋ [00:00:12] [========================>---------------] 30/50 (60%) photo.jpg
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for batch conversion
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template(concat!(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] ",
                    "{pos}/{len} ({percent}%) {msg}"
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Progress manager that draws nothing (JSON mode, tests)
    pub fn hidden(total_files: u64) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total_files);
        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Print a full line above the bar. Dropped by indicatif when the bar is hidden.
    pub fn println(&self, line: &str) {
        self.bar.println(line);
    }

    /// True when nothing is drawn (JSON mode, or stderr is not a terminal)
    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();

        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        spinner
    }
}
