//! Error types for the hueify pipeline.

use hueify_core::ColorError;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the pipeline.
///
/// `Load`, `Timeout`, `Extraction` and `Task` describe a single track and are
/// absorbed by the batch processor as fallback colors. The rest stop the
/// whole run and reach the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Artwork bytes could not be fetched.
    #[error("artwork load failed: {0}")]
    Load(String),

    /// Loading plus extraction exceeded the per-track budget.
    #[error("artwork processing timed out after {0:?}")]
    Timeout(Duration),

    /// Decoding or quantizing the artwork failed.
    #[error("color extraction failed: {0}")]
    Extraction(#[from] ColorError),

    /// Pipeline settings failed validation.
    #[error("invalid pipeline config: {0}")]
    Config(ColorError),

    /// The track source could not list the playlist.
    #[error("track source failed: {0}")]
    TrackSource(String),

    /// The playlist sink rejected a create or populate call.
    #[error("playlist sink failed: {0}")]
    PlaylistSink(String),

    /// The playlist holds no tracks to sort.
    #[error("playlist is empty")]
    EmptyPlaylist,

    /// The run was cancelled between batches.
    #[error("cancelled after {processed} of {total} tracks")]
    Cancelled { processed: usize, total: usize },

    /// A blocking extraction task panicked or was aborted.
    #[error("extraction task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_error_converts_via_from() {
        let err: PipelineError = ColorError::EmptyImage.into();
        assert!(matches!(err, PipelineError::Extraction(ColorError::EmptyImage)));
        assert!(err.to_string().contains("no usable pixels"));
    }

    #[test]
    fn cancelled_reports_progress() {
        let err = PipelineError::Cancelled {
            processed: 10,
            total: 25,
        };
        assert_eq!(err.to_string(), "cancelled after 10 of 25 tracks");
    }

    #[test]
    fn pipeline_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<PipelineError>();
    }
}
