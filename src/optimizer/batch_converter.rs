//! # Batch Converter Orchestrator
//!
//! Orchestratore principale che delega responsabilità ai moduli specializzati:
//! discovery → path di output → scheduler → report.

use crate::{
    config::{Config, ResizeBounds},
    file_manager::FileManager,
    image_processor::ConversionPolicy,
    json_output::{JsonConfig, JsonMessage},
    optimizer::{
        batch_scheduler::BatchScheduler, path_resolver::PathResolver,
        progress_tracker::ProgressTracker,
    },
    progress::ProgressManager,
    report::BatchReport,
    types::ConversionRequest,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Converts every supported image under a directory to WebP
pub struct BatchConverter {
    config: Config,
    input_base_dir: PathBuf,
    output_dir: PathBuf,
}

impl BatchConverter {
    pub fn new(input_dir: &Path, config: Config) -> Result<Self> {
        config.validate()?;
        let output_dir = config.resolve_output_dir(input_dir);

        Ok(Self {
            config,
            input_base_dir: input_dir.to_path_buf(),
            output_dir,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the whole batch. Only a missing input directory is fatal.
    pub async fn run(&self) -> Result<BatchReport> {
        let start_time = Instant::now();

        let files = self.discover()?;
        info!("Found {} images to convert...", files.len());

        let policy = Arc::new(ConversionPolicy::new());
        let requests = self.plan_requests(&files, policy.output_extension())?;

        if self.config.json_output {
            JsonMessage::start(
                self.input_base_dir.clone(),
                self.output_dir.clone(),
                requests.len(),
                JsonConfig::from(&self.config),
            )
            .emit();
        }

        let mut tracker = ProgressTracker::new(requests.len(), self.config.json_output);
        let scheduler = BatchScheduler::new(self.config.workers);

        let results = scheduler
            .run_with_observer(policy, requests, |index, result| {
                tracker.handle_file_completion(index, result)
            })
            .await;

        let report = BatchReport::summarize(&results, start_time.elapsed());
        tracker.finish(&report);

        Ok(report)
    }

    fn discover(&self) -> Result<Vec<PathBuf>> {
        let spinner = (!self.config.json_output)
            .then(|| ProgressManager::spinner("Scanning for images..."));

        let found = FileManager::find_images(&self.input_base_dir, self.config.recursive);

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        let mut files = found?;

        // Solo una directory di output annidata nell'input va esclusa dalla scansione:
        // se coincide con l'input o lo contiene, tutti i file restano da convertire
        if is_nested_output(&self.input_base_dir, &self.output_dir) {
            let before = files.len();
            files.retain(|file| !is_within(file, &self.output_dir));
            if files.len() != before {
                debug!(
                    "Excluded {} files inside output directory {}",
                    before - files.len(),
                    self.output_dir.display()
                );
            }
        }

        Ok(files)
    }

    fn plan_requests(
        &self,
        files: &[PathBuf],
        extension: &'static str,
    ) -> Result<Vec<ConversionRequest>> {
        let mut resolver = PathResolver::new(&self.input_base_dir, &self.output_dir, extension);

        files
            .iter()
            .map(|input_path| {
                let output_path = resolver
                    .get_output_path(input_path)
                    .with_context(|| format!("Cannot plan output for {}", input_path.display()))?;
                Ok(ConversionRequest::new(
                    input_path.clone(),
                    output_path,
                    self.config.resize,
                    self.config.quality,
                ))
            })
            .collect()
    }
}

/// `output_dir` sta strettamente dentro `input_dir` (confronto su path canonici)
fn is_nested_output(input_dir: &Path, output_dir: &Path) -> bool {
    match (input_dir.canonicalize(), output_dir.canonicalize()) {
        (Ok(input), Ok(output)) => output != input && output.starts_with(&input),
        // Output non ancora creato: confronto sui path così come sono
        _ => output_dir != input_dir && output_dir.starts_with(input_dir),
    }
}

fn is_within(path: &Path, dir: &Path) -> bool {
    if path.starts_with(dir) {
        return true;
    }
    match (path.canonicalize(), dir.canonicalize()) {
        (Ok(path), Ok(dir)) => path.starts_with(dir),
        _ => false,
    }
}

/// One-call conversion with the common defaults: recursive discovery and
/// `<input>/webp_converted` when no output directory is given
pub async fn quick_convert(
    input_dir: &Path,
    output_dir: Option<&Path>,
    quality: u8,
    resize: Option<ResizeBounds>,
) -> Result<BatchReport> {
    let config = Config {
        quality,
        output_path: output_dir.map(Path::to_path_buf),
        resize,
        ..Default::default()
    };

    BatchConverter::new(input_dir, config)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConvertError, FailureKind};
    use crate::types::{ConversionOutcome, ConversionResult};
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_jpeg(path: &Path, seed: u8) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        RgbImage::from_fn(48, 32, |x, y| {
            Rgb([seed.wrapping_add(x as u8), (y * 4) as u8, seed.wrapping_mul(3)])
        })
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
    }

    fn write_png(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        RgbImage::from_pixel(20, 20, Rgb([0, 128, 255])).save(path).unwrap();
    }

    fn silent_config(output: &Path) -> Config {
        Config {
            output_path: Some(output.to_path_buf()),
            json_output: true,
            ..Default::default()
        }
    }

    /// 3 JPEG validi + 1 corrotto al primo livello, un PNG in sottodirectory
    fn scenario(root: &Path) {
        write_jpeg(&root.join("a.jpg"), 10);
        write_jpeg(&root.join("b.jpg"), 80);
        write_jpeg(&root.join("c.jpg"), 160);
        std::fs::write(root.join("corrupt.jpg"), b"not really a jpeg").unwrap();
        write_png(&root.join("nested/d.png"));
    }

    #[tokio::test]
    async fn test_non_recursive_scenario() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        scenario(input.path());

        let files = FileManager::find_images(input.path(), false).unwrap();
        assert_eq!(files.len(), 4);
        assert!(files.iter().all(|f| f.extension().unwrap() == "jpg"));

        let config = Config {
            recursive: false,
            ..silent_config(output.path())
        };
        let report = BatchConverter::new(input.path(), config).unwrap().run().await.unwrap();

        assert_eq!(report.total_requested, 4);
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 1);
        assert!(report.overall_ratio.is_some());
        assert!(output.path().join("a.webp").exists());
        assert!(output.path().join("c.webp").exists());
        assert!(!output.path().join("corrupt.webp").exists());
        assert!(!output.path().join("nested").exists());
    }

    #[tokio::test]
    async fn test_recursive_mirrors_subtree() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        scenario(input.path());

        let report = BatchConverter::new(input.path(), silent_config(output.path()))
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.total_requested, 5);
        assert_eq!(report.succeeded, 4);
        assert!(output.path().join("nested/d.webp").exists());
    }

    #[tokio::test]
    async fn test_missing_input_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let err = BatchConverter::new(&missing, silent_config(temp_dir.path()))
            .unwrap()
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<ConvertError>(), Some(ConvertError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            quality: 0,
            ..Default::default()
        };
        assert!(BatchConverter::new(temp_dir.path(), config).is_err());
    }

    #[tokio::test]
    async fn test_zero_byte_file_is_reported_not_fatal() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_jpeg(&input.path().join("ok.jpg"), 3);
        std::fs::write(input.path().join("empty.png"), b"").unwrap();

        let report = BatchConverter::new(input.path(), silent_config(output.path()))
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.total_requested, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_default_output_dir_is_not_rescanned() {
        let input = TempDir::new().unwrap();
        write_jpeg(&input.path().join("a.jpg"), 1);
        // Un file supportato già dentro la directory di output di default
        write_png(&input.path().join("webp_converted/leftover.png"));

        let converter = BatchConverter::new(
            input.path(),
            Config { json_output: true, ..Default::default() },
        )
        .unwrap();
        assert_eq!(converter.output_dir(), input.path().join("webp_converted"));

        let report = converter.run().await.unwrap();
        assert_eq!(report.total_requested, 1);
        assert!(input.path().join("webp_converted/a.webp").exists());
    }

    #[tokio::test]
    async fn test_output_dir_equal_to_input_converts_everything() {
        let input = TempDir::new().unwrap();
        write_jpeg(&input.path().join("a.jpg"), 5);
        write_jpeg(&input.path().join("b.jpg"), 50);

        let report = BatchConverter::new(input.path(), silent_config(input.path()))
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.total_requested, 2);
        assert_eq!(report.succeeded, 2);
        assert!(input.path().join("a.webp").exists());
        assert!(input.path().join("b.webp").exists());
    }

    #[tokio::test]
    async fn test_output_dir_above_input_converts_everything() {
        let site = TempDir::new().unwrap();
        let input = site.path().join("public/personal");
        write_jpeg(&input.join("a.jpg"), 5);
        write_jpeg(&input.join("b.jpg"), 50);

        let report = BatchConverter::new(&input, silent_config(site.path()))
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.total_requested, 2);
        assert_eq!(report.succeeded, 2);
        assert!(site.path().join("a.webp").exists());
        assert!(site.path().join("b.webp").exists());
    }

    #[test]
    fn test_is_nested_output() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("in/out")).unwrap();

        assert!(is_nested_output(&root.join("in"), &root.join("in/out")));
        assert!(is_nested_output(&root.join("in"), &root.join("in/not_yet_created")));
        assert!(!is_nested_output(&root.join("in"), &root.join("in")));
        assert!(!is_nested_output(&root.join("in"), root));
        assert!(!is_nested_output(&root.join("in"), &root.join("elsewhere")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_does_not_change_results() {
        let input = TempDir::new().unwrap();
        for i in 0..10u8 {
            write_jpeg(&input.path().join(format!("img{:02}.jpg", i)), i * 20);
        }
        std::fs::write(input.path().join("broken.png"), b"nope").unwrap();
        std::fs::write(input.path().join("zero.bmp"), b"").unwrap();

        let files = FileManager::find_images(input.path(), true).unwrap();

        let mut runs: Vec<Vec<ConversionResult>> = Vec::new();
        for workers in [1usize, 8] {
            let output = TempDir::new().unwrap();
            let mut resolver = PathResolver::new(input.path(), output.path(), "webp");
            let requests = files
                .iter()
                .map(|f| {
                    let output_path = resolver.get_output_path(f).unwrap();
                    ConversionRequest::new(f.clone(), output_path, None, 75)
                })
                .collect();

            let results = BatchScheduler::new(workers)
                .run(Arc::new(ConversionPolicy::new()), requests)
                .await;
            runs.push(results);
        }

        assert_eq!(runs[0].len(), files.len());
        assert_eq!(runs[0], runs[1]);

        let kinds: Vec<Option<FailureKind>> = runs[0]
            .iter()
            .map(|r| match r.outcome {
                ConversionOutcome::Failure { kind, .. } => Some(kind),
                ConversionOutcome::Success { .. } => None,
            })
            .collect();
        assert!(kinds.contains(&Some(FailureKind::Decode)));
        assert!(kinds.contains(&Some(FailureKind::InvalidInput)));
        assert_eq!(kinds.iter().filter(|k| k.is_none()).count(), 10);
    }

    #[tokio::test]
    async fn test_quick_convert_defaults() {
        let input = TempDir::new().unwrap();
        write_jpeg(&input.path().join("deep/x/photo.jpg"), 42);

        let report = quick_convert(input.path(), None, 75, Some(ResizeBounds::new(16, 16)))
            .await
            .unwrap();

        assert_eq!(report.succeeded, 1);
        let out = input.path().join("webp_converted/deep/x/photo.webp");
        let bytes = std::fs::read(out).unwrap();
        let decoded = webp::Decoder::new(&bytes).decode().unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 11));
    }
}
