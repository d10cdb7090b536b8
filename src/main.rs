//! # WebP Batch Converter - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Merge tra file di configurazione opzionale e flag CLI
//! - Avvio del `BatchConverter`
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (directory, quality, workers, resize, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Carica la configurazione base (se `--config`) e applica i flag
//! 4. Esegue il batch; un errore per-file non cambia l'exit code
//!
//! ## Esempio di utilizzo:
//! ```bash
//! webp-converter ./photos --output ./photos_webp --quality 75 --resize 1920x1080 --workers 8
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use webp_batch_converter::{BatchConverter, Config, JsonMessage, ResizeBounds};

#[derive(Parser)]
#[command(name = "webp-converter")]
#[command(about = "Batch-convert images to WebP with bounded parallelism")]
struct Args {
    /// Directory containing images to convert
    input_directory: PathBuf,

    /// Output directory (default: <input>/webp_converted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// WebP quality (1-100) [default: 80]
    #[arg(short, long)]
    quality: Option<u8>,

    /// Number of parallel workers [default: 4]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Shrink images to fit within WIDTHxHEIGHT (never upscales)
    #[arg(short, long)]
    resize: Option<ResizeBounds>,

    /// Only convert images directly inside the input directory
    #[arg(long)]
    no_recursive: bool,

    /// Load base configuration from a JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Save the effective configuration to a JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Output progress and status as JSON for programmatic use
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    async fn to_config(&self) -> Result<Config> {
        let mut config = match self.config {
            Some(ref path) => Config::from_file(path).await?,
            None => Config::default(),
        };

        if let Some(ref output) = self.output {
            config.output_path = Some(output.clone());
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.resize.is_some() {
            config.resize = self.resize;
        }
        if self.no_recursive {
            config.recursive = false;
        }
        if self.json {
            config.json_output = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --verbose. Stdout is reserved for JSON events
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.to_config().await?;

    if let Some(ref path) = args.save_config {
        config.save_to_file(path).await?;
        info!("Saved configuration to {}", path.display());
    }

    let json_output = config.json_output;
    let outcome = async {
        let converter = BatchConverter::new(&args.input_directory, config)?;
        info!(
            "Converting {} -> {}",
            args.input_directory.display(),
            converter.output_dir().display()
        );
        converter.run().await
    }
    .await;

    match outcome {
        Ok(_) => Ok(()),
        Err(e) => {
            if json_output {
                JsonMessage::error(e.to_string(), e.chain().nth(1).map(|s| s.to_string())).emit();
            }
            Err(e)
        }
    }
}
