//! The annotation run: records → batches → cache ∘ remote client → rows.
//!
//! Strictly sequential. Each batch is fully resolved (cache lookup, remote
//! call on a miss, projection) before the next one is pulled from the input.
//!
//! Records keep their raw text throughout. The cache key is computed from
//! that raw text; only the copy sent to the service is truncated.

use std::io::Write;

use ticketlens_comprehend::{AnnotationClient, AnnotationService};
use ticketlens_core::{
    ApiResult, BatchExt, BatchItemError, MAX_BATCH_SIZE, MAX_TEXT_BYTES, Record, ResultItem,
    truncated_text,
};
use ticketlens_store::{
    CacheBackend, CacheKey, CacheOutcome, CacheStore, FsBackend, RowWriter, StoreError,
};
use tracing::{info, warn};

use crate::AnnotateError;
use crate::mode::Mode;

/// Batch count interval between progress log lines.
const PROGRESS_INTERVAL: u64 = 100;

/// Remote service limits applied before batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub batch_size: usize,
    pub max_text_bytes: usize,
}

impl Limits {
    /// Reject a batch size outside `1..=MAX_BATCH_SIZE` or a zero text limit.
    pub fn validate(&self) -> Result<(), AnnotateError> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(AnnotateError::BatchSize(self.batch_size));
        }
        if self.max_text_bytes == 0 {
            return Err(AnnotateError::TextLimit);
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            max_text_bytes: MAX_TEXT_BYTES,
        }
    }
}

/// Counters for progress reporting. Start at zero with each pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    pub batches: u64,
    pub remote_calls: u64,
    pub cache_hits: u64,
    /// Texts shortened before being sent.
    pub truncated: u64,
}

/// Outcome of one [`Pipeline::run`].
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub state: RunState,
    /// Data rows written, header excluded.
    pub rows_written: u64,
    pub skipped_empty: u64,
    /// Per-item errors reported by the service, in arrival order. Not matched
    /// back to the records they belong to.
    pub errors: Vec<BatchItemError>,
}

pub struct Pipeline<S, B = FsBackend> {
    mode: Mode,
    client: AnnotationClient<S>,
    cache: Option<CacheStore<B>>,
    limits: Limits,
    state: RunState,
}

impl<S: AnnotationService, B: CacheBackend> Pipeline<S, B> {
    /// Uncached pipeline for `mode`. `language_code` is passed to entity
    /// detection and ignored by language detection.
    pub fn new(mode: Mode, service: S, language_code: &str) -> Self {
        Self {
            mode,
            client: AnnotationClient::new(service, mode.operation(language_code)),
            cache: None,
            limits: Limits::default(),
            state: RunState::default(),
        }
    }

    /// Memoize remote calls in `backend`.
    pub fn with_cache(mut self, backend: B) -> Self {
        self.cache = Some(CacheStore::new(backend));
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Result<Self, AnnotateError> {
        limits.validate()?;
        self.limits = limits;
        Ok(self)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn client(&self) -> &AnnotationClient<S> {
        &self.client
    }

    pub fn cache(&self) -> Option<&CacheStore<B>> {
        self.cache.as_ref()
    }

    /// Annotate `records` and write the header plus one row per annotated
    /// record to `out`.
    ///
    /// Empty-text records are skipped and oversized text is truncated before
    /// sending, both with a warning. The first input error aborts the run
    /// before the batch containing it is sent.
    pub fn run<I, W>(
        &mut self,
        records: I,
        out: &mut RowWriter<W>,
    ) -> Result<RunSummary, AnnotateError>
    where
        I: IntoIterator<Item = Result<Record, StoreError>>,
        W: Write,
    {
        let spec = self.mode.spec();
        let mut skipped_empty = 0u64;
        let mut rows_written = 0u64;
        let mut errors = Vec::new();

        out.write_row((spec.header)())?;

        let batches = records
            .into_iter()
            .filter_map(|item| match item {
                Ok(record) if !record.has_text() => {
                    warn!(
                        id = %record.id,
                        line = record.line_number,
                        "skipping question with empty text"
                    );
                    skipped_empty += 1;
                    None
                }
                item => Some(item),
            })
            .batches(self.limits.batch_size);

        for batch in batches {
            let batch = batch.into_iter().collect::<Result<Vec<Record>, StoreError>>()?;
            let result = self.resolve(&batch)?;

            errors.extend(result.error_list);
            for (record, item) in pair_results(&batch, &result.result_list) {
                if let Some(row) = (spec.project)(record, item)? {
                    out.write_row(&row)?;
                    rows_written += 1;
                }
            }
        }

        Ok(RunSummary {
            state: self.state.clone(),
            rows_written,
            skipped_empty,
            errors,
        })
    }

    /// One batch through the cache (when configured) and the remote client.
    fn resolve(&mut self, batch: &[Record]) -> Result<ApiResult, AnnotateError> {
        let max_text_bytes = self.limits.max_text_bytes;
        let client = &mut self.client;
        let state = &mut self.state;
        let mut send = || -> Result<ApiResult, AnnotateError> {
            let texts: Vec<&str> = batch
                .iter()
                .map(|r| truncated_text(r, max_text_bytes))
                .collect();
            state.truncated += batch
                .iter()
                .zip(&texts)
                .filter(|(r, text)| r.text.len() != text.len())
                .count() as u64;
            let result = client.call(&texts)?;
            state.remote_calls += 1;
            Ok(result)
        };

        let result = match &mut self.cache {
            Some(cache) => {
                let key = CacheKey::for_texts(batch.iter().map(|r| r.text.as_str()));
                let (result, outcome) = cache.get_or_compute(&key, send)?;
                if outcome == CacheOutcome::Reused {
                    self.state.cache_hits += 1;
                }
                result
            }
            None => send()?,
        };

        self.state.batches += 1;
        if self.state.batches % PROGRESS_INTERVAL == 0 {
            info!(
                batches = self.state.batches,
                remote_calls = self.state.remote_calls,
                cache_hits = self.state.cache_hits,
                "progress"
            );
        }
        Ok(result)
    }

    /// Log the client's and the cache's totals.
    pub fn log_summary(&self) {
        self.client.summary();
        if let Some(cache) = &self.cache {
            cache.summary();
        }
    }
}

/// Pair each result with the record it annotates: by the item's `Index`
/// when the service supplies one, by position otherwise. Records the service
/// reported as failed have no result item and so get no pair.
fn pair_results<'a>(
    batch: &'a [Record],
    results: &'a [ResultItem],
) -> impl Iterator<Item = (&'a Record, &'a ResultItem)> {
    results
        .iter()
        .enumerate()
        .filter_map(move |(pos, item)| batch.get(item.index.unwrap_or(pos)).map(|r| (r, item)))
}
