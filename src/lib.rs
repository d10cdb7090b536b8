//! # WebP Batch Converter Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore e classificazione dei fallimenti per-file
//! - `types`: Richieste e risultati di conversione
//! - `file_manager`: Discovery delle immagini e utilità sui file
//! - `codec`: Confine verso le librerie di decode/encode
//! - `image_processor`: Policy di conversione del singolo file
//! - `optimizer`: Scheduler a worker pool e orchestratore del batch
//! - `report`: Aggregazione dei risultati
//! - `progress` / `json_output`: Output su console o JSON
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use webp_batch_converter::{BatchConverter, Config};
//!
//! let converter = BatchConverter::new(&path, Config::default())?;
//! let report = converter.run().await?;
//! println!("{}", report.format_summary());
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod json_output;
pub mod optimizer;
pub mod progress;
pub mod report;
pub mod types;

pub use codec::{ImageCodec, WebpCodec};
pub use config::{Config, ResizeBounds};
pub use error::{ConvertError, FailureKind};
pub use file_manager::FileManager;
pub use image_processor::ConversionPolicy;
pub use json_output::JsonMessage;
pub use optimizer::{quick_convert, BatchConverter, BatchScheduler, Converter};
pub use report::BatchReport;
pub use types::{ConversionOutcome, ConversionRequest, ConversionResult};
