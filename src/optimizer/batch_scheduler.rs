//! # Batch Scheduler Module
//!
//! Pool di worker a dimensione fissa che esegue una conversione per richiesta.
//!
//! ## Garanzie:
//! - Al massimo `max_concurrency` conversioni in esecuzione contemporaneamente
//! - Un risultato per richiesta, nell'ordine di sottomissione (non di completamento)
//! - Nessuna richiesta persa, saltata o eseguita due volte
//! - Un panic dentro una conversione diventa un `Failure` di quel file
//! - Tutti i worker sono terminati prima che `run` ritorni
//!
//! ## Modello:
//! I worker (task tokio) prelevano `(indice, richiesta)` da una coda condivisa ed
//! eseguono la conversione, bloccante, su `spawn_blocking`. Ogni esito torna allo
//! scheduler via canale mpsc e viene scritto nello slot con lo stesso indice.

use crate::{
    error::ConvertError,
    optimizer::path_resolver::OutputDirs,
    types::{ConversionRequest, ConversionResult},
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Something that turns one request into exactly one result, blocking
pub trait Converter: Send + Sync + 'static {
    fn convert(&self, request: &ConversionRequest) -> ConversionResult;
}

type SharedQueue = Arc<Mutex<VecDeque<(usize, ConversionRequest)>>>;

/// Bounded, order-preserving worker pool for one or more batches
pub struct BatchScheduler {
    max_concurrency: usize,
}

impl BatchScheduler {
    /// `max_concurrency` is fixed for the scheduler's lifetime; 0 is treated as 1
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run every request, returning results in submission order
    pub async fn run<C: Converter>(
        &self,
        converter: Arc<C>,
        requests: Vec<ConversionRequest>,
    ) -> Vec<ConversionResult> {
        self.run_with_observer(converter, requests, |_, _| {}).await
    }

    /// Like `run`, calling `on_result(index, result)` as each conversion finishes
    /// (completion order)
    pub async fn run_with_observer<C, F>(
        &self,
        converter: Arc<C>,
        requests: Vec<ConversionRequest>,
        mut on_result: F,
    ) -> Vec<ConversionResult>
    where
        C: Converter,
        F: FnMut(usize, &ConversionResult),
    {
        let total = requests.len();
        if total == 0 {
            return Vec::new();
        }

        let worker_count = self.max_concurrency.min(total);
        info!("Scheduling {} conversions on {} workers", total, worker_count);

        // Copia per poter rendere conto di ogni richiesta anche se un worker muore
        let submitted = requests.clone();
        let queue: SharedQueue = Arc::new(Mutex::new(requests.into_iter().enumerate().collect()));
        let output_dirs = Arc::new(OutputDirs::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            workers.spawn(worker_loop(
                worker_id,
                queue.clone(),
                converter.clone(),
                output_dirs.clone(),
                tx.clone(),
            ));
        }
        // Il canale si chiude quando l'ultimo worker termina
        drop(tx);

        let mut slots: Vec<Option<ConversionResult>> = (0..total).map(|_| None).collect();
        while let Some((index, result)) = rx.recv().await {
            on_result(index, &result);
            slots[index] = Some(result);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Worker task failed: {}", e);
            }
        }

        slots
            .into_iter()
            .zip(submitted.iter())
            .map(|(slot, request)| {
                slot.unwrap_or_else(|| {
                    error!("No result for {}, recording as failed", request.input_path().display());
                    ConversionResult::failure(
                        request,
                        &ConvertError::Other("worker exited before producing a result".to_string()),
                    )
                })
            })
            .collect()
    }
}

fn next_request(queue: &SharedQueue) -> Option<(usize, ConversionRequest)> {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .pop_front()
}

async fn worker_loop<C: Converter>(
    worker_id: usize,
    queue: SharedQueue,
    converter: Arc<C>,
    output_dirs: Arc<OutputDirs>,
    tx: mpsc::UnboundedSender<(usize, ConversionResult)>,
) {
    debug!("Worker {} started", worker_id);
    let mut handled = 0usize;

    while let Some((index, request)) = next_request(&queue) {
        let converter = converter.clone();
        let output_dirs = output_dirs.clone();
        let task_request = request.clone();

        // Conversione bloccante: CPU + I/O, fuori dai thread del runtime
        let joined = tokio::task::spawn_blocking(move || {
            match output_dirs.ensure_parent(task_request.output_path()) {
                Ok(()) => converter.convert(&task_request),
                Err(e) => ConversionResult::failure(&task_request, &e),
            }
        })
        .await;

        let result = joined.unwrap_or_else(|e| {
            error!("Conversion of {} panicked: {}", request.input_path().display(), e);
            ConversionResult::failure(
                &request,
                &ConvertError::Other(format!("conversion aborted: {}", e)),
            )
        });

        handled += 1;
        if tx.send((index, result)).is_err() {
            // Lo scheduler non ascolta più (run cancellato)
            break;
        }
    }

    debug!("Worker {} finished after {} conversions", worker_id, handled);
}
