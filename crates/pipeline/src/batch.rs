//! Batch Processor: turns tracks into processed tracks, a few at a time.
//!
//! Tracks are split into fixed-size batches. Every track in a batch is
//! loaded and extracted concurrently; the next batch starts only when the
//! whole batch has joined. Each track gets `item_timeout` for load plus
//! extraction. Any per-track failure (no artwork URL, load error, decode
//! error, timeout, panicked task) becomes a fallback color and a `warn!`
//! line; it never fails the batch.
//!
//! Results are written only at batch joins, in input order, so there is no
//! shared mutable state between in-flight extractions.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::loader::ArtworkLoader;
use futures::future::join_all;
use hueify_core::{ColorExtraction, ColorExtractor, FallbackReason, ProcessedTrack, Track};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Snapshot handed to the progress callback after each batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress<'a> {
    /// Tracks finished so far.
    pub processed: usize,
    /// Tracks in the whole run.
    pub total: usize,
    /// How many of `results` carry the fallback color.
    pub fallbacks: usize,
    /// Every result so far, in input order.
    pub results: &'a [ProcessedTrack],
}

impl BatchProgress<'_> {
    pub fn is_complete(&self) -> bool {
        self.processed == self.total
    }

    /// True when every processed track fell back; a UI can show a
    /// processing-failed state.
    pub fn all_failed(&self) -> bool {
        self.processed > 0 && self.fallbacks == self.processed
    }
}

/// Runs load plus extraction for many tracks with bounded concurrency.
pub struct BatchProcessor {
    extractor: Arc<dyn ColorExtractor>,
    loader: Arc<dyn ArtworkLoader>,
    config: PipelineConfig,
}

impl BatchProcessor {
    pub fn new(
        extractor: Arc<dyn ColorExtractor>,
        loader: Arc<dyn ArtworkLoader>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extractor,
            loader,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes every track. Always returns one result per input track, in
    /// input order.
    pub async fn process_all(&self, tracks: Vec<Track>) -> Vec<ProcessedTrack> {
        self.run(tracks, || false, |_| {}).await
    }

    /// Like [`process_all`](Self::process_all), reporting after each batch
    /// and checking `cancel` before starting the next one. A batch already
    /// in flight always completes.
    ///
    /// Returns `PipelineError::Cancelled` if the token stopped the run early.
    pub async fn process_with_progress<F>(
        &self,
        tracks: Vec<Track>,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<Vec<ProcessedTrack>, PipelineError>
    where
        F: FnMut(&BatchProgress<'_>),
    {
        let total = tracks.len();
        let results = self.run(tracks, || cancel.is_cancelled(), on_progress).await;
        if results.len() < total {
            return Err(PipelineError::Cancelled {
                processed: results.len(),
                total,
            });
        }
        Ok(results)
    }

    async fn run<S, F>(
        &self,
        tracks: Vec<Track>,
        should_stop: S,
        mut on_progress: F,
    ) -> Vec<ProcessedTrack>
    where
        S: Fn() -> bool,
        F: FnMut(&BatchProgress<'_>),
    {
        let total = tracks.len();
        let batch_size = self.config.batch_size.max(1);
        let mut results: Vec<ProcessedTrack> = Vec::with_capacity(total);
        let mut fallbacks = 0;
        let mut pending = tracks.into_iter().peekable();
        let mut batch_number = 0;

        while pending.peek().is_some() {
            if should_stop() {
                info!(processed = results.len(), total, "processing cancelled");
                break;
            }
            batch_number += 1;
            let batch: Vec<Track> = pending.by_ref().take(batch_size).collect();
            let done = join_all(batch.into_iter().map(|track| self.process_one(track))).await;

            fallbacks += done.iter().filter(|p| p.is_fallback()).count();
            results.extend(done);
            info!(
                batch = batch_number,
                processed = results.len(),
                total,
                fallbacks,
                "batch complete"
            );
            on_progress(&BatchProgress {
                processed: results.len(),
                total,
                fallbacks,
                results: &results,
            });
        }

        results
    }

    /// Loads and extracts one track, falling back on any failure.
    pub async fn process_one(&self, track: Track) -> ProcessedTrack {
        let url = match track.artwork_url(self.config.artwork_index) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(
                    kind = track.kind(),
                    track = %track.display_name(),
                    error = %e,
                    "no usable artwork; using fallback color"
                );
                return ProcessedTrack::fallback(track, FallbackReason::Artwork);
            }
        };

        let work = self.load_and_extract(&url);
        match tokio::time::timeout(self.config.item_timeout, work).await {
            Ok(Ok(extraction)) => {
                let processed =
                    ProcessedTrack::from_extraction(track, extraction, &self.config.selector);
                debug!(
                    kind = processed.track.kind(),
                    track = %processed.track.display_name(),
                    color = %processed.color.to_hex(),
                    lightness = processed.lch.l,
                    chroma = processed.lch.c,
                    hue = processed.lch.h,
                    "extracted color"
                );
                processed
            }
            Ok(Err(e)) => {
                let reason = fallback_reason(&e);
                warn!(
                    kind = track.kind(),
                    track = %track.display_name(),
                    url = %url,
                    error = %e,
                    "artwork failed; using fallback color"
                );
                ProcessedTrack::fallback(track, reason)
            }
            Err(_) => {
                let e = PipelineError::Timeout(self.config.item_timeout);
                warn!(
                    kind = track.kind(),
                    track = %track.display_name(),
                    url = %url,
                    error = %e,
                    "artwork timed out; using fallback color"
                );
                ProcessedTrack::fallback(track, FallbackReason::Timeout)
            }
        }
    }

    async fn load_and_extract(&self, url: &str) -> Result<ColorExtraction, PipelineError> {
        let bytes = self.loader.load(url).await?;
        let extractor = Arc::clone(&self.extractor);
        // A timeout drops this handle but cannot stop the blocking decode, so
        // after repeated timeouts more than `batch_size` decodes may still be
        // running on the blocking pool.
        let extraction = tokio::task::spawn_blocking(move || extractor.try_extract(&bytes))
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))??;
        Ok(extraction)
    }
}

fn fallback_reason(err: &PipelineError) -> FallbackReason {
    match err {
        PipelineError::Load(_) => FallbackReason::Load,
        PipelineError::Timeout(_) => FallbackReason::Timeout,
        _ => FallbackReason::Extraction,
    }
}
