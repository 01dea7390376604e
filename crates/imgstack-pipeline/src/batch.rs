//! Ordered parallel processing of independent inputs.
//!
//! Every source is handled on its own by a rayon worker. Results are
//! collected by original position, never by completion order, so the
//! same inputs always produce the same output order. A failing item is
//! recorded and the rest carry on.

use std::num::NonZeroUsize;

use rayon::prelude::*;

use crate::decode::decode;
use crate::types::{PipelineError, RasterImage};

/// One named input: typically an uploaded or on-disk file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Original file name, used for reporting and output naming.
    pub name: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

impl SourceImage {
    /// Create a named source.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Number of worker threads. `None` uses rayon's global pool.
    pub workers: Option<NonZeroUsize>,
}

/// A successfully processed input.
#[derive(Debug, Clone)]
pub struct BatchItem<T> {
    /// Position of the source in the input slice.
    pub index: usize,
    /// Source name.
    pub name: String,
    /// Processing result.
    pub value: T,
}

/// An input that could not be processed.
#[derive(Debug)]
pub struct ItemFailure {
    /// Position of the source in the input slice.
    pub index: usize,
    /// Source name.
    pub name: String,
    /// Why processing failed.
    pub error: PipelineError,
}

/// Per-item results of a batch, both lists in input order.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Items that processed successfully.
    pub succeeded: Vec<BatchItem<T>>,
    /// Items that failed.
    pub failures: Vec<ItemFailure>,
}

impl<T> BatchOutcome<T> {
    /// Returns `true` if no item failed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The successful values, in input order.
    #[must_use]
    pub fn into_values(self) -> Vec<T> {
        self.succeeded.into_iter().map(|item| item.value).collect()
    }
}

/// Run `process` on every source in parallel.
///
/// # Errors
///
/// Returns [`PipelineError::ThreadPool`] if a dedicated pool was
/// requested and could not be built. Per-item errors are never returned
/// here; they are listed in [`BatchOutcome::failures`].
pub fn run_batch<T, F>(
    sources: &[SourceImage],
    options: BatchOptions,
    process: F,
) -> Result<BatchOutcome<T>, PipelineError>
where
    T: Send,
    F: Fn(&SourceImage) -> Result<T, PipelineError> + Sync,
{
    let run = || -> Vec<Result<T, PipelineError>> {
        sources
            .par_iter()
            .map(|source| {
                tracing::debug!(name = %source.name, bytes = source.bytes.len(), "processing");
                process(source)
            })
            .collect()
    };

    let results = match options.workers {
        Some(workers) => rayon::ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .build()
            .map_err(|e| PipelineError::ThreadPool(e.to_string()))?
            .install(run),
        None => run(),
    };

    let mut outcome = BatchOutcome {
        succeeded: Vec::with_capacity(results.len()),
        failures: Vec::new(),
    };
    for (index, (source, result)) in sources.iter().zip(results).enumerate() {
        match result {
            Ok(value) => outcome.succeeded.push(BatchItem {
                index,
                name: source.name.clone(),
                value,
            }),
            Err(error) => {
                tracing::warn!(name = %source.name, %error, "item failed");
                outcome.failures.push(ItemFailure {
                    index,
                    name: source.name.clone(),
                    error,
                });
            }
        }
    }

    tracing::info!(
        succeeded = outcome.succeeded.len(),
        failed = outcome.failures.len(),
        "batch finished",
    );
    Ok(outcome)
}

/// Decode every source in parallel.
///
/// # Errors
///
/// Returns [`PipelineError::ThreadPool`] if the pool could not be built.
pub fn decode_batch(
    sources: &[SourceImage],
    options: BatchOptions,
) -> Result<BatchOutcome<RasterImage>, PipelineError> {
    run_batch(sources, options, |source| decode(&source.bytes))
}
