//! # Optimizer Module
//!
//! Separa le responsabilità in sottomoduli:
//! - `batch_converter`: Orchestratore principale
//! - `batch_scheduler`: Worker pool a concorrenza limitata
//! - `progress_tracker`: Gestione progress unificata
//! - `path_resolver`: Logica di calcolo path centralizzata

pub mod batch_converter;
pub mod batch_scheduler;
pub mod path_resolver;
pub mod progress_tracker;

pub use batch_converter::{quick_convert, BatchConverter};
pub use batch_scheduler::{BatchScheduler, Converter};
pub use path_resolver::{OutputDirs, PathResolver};
pub use progress_tracker::ProgressTracker;
