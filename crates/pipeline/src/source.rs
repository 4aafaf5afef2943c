//! Collaborators at the edge of the pipeline.
//!
//! The pipeline never talks to a streaming service directly. A
//! [`TrackSource`] lists a playlist's tracks with pagination already
//! resolved, and a [`PlaylistSink`] creates and fills the sorted playlist.

use crate::error::PipelineError;
use async_trait::async_trait;
use hueify_core::Track;

/// Most URIs a single populate call accepts.
pub const POPULATE_CHUNK_SIZE: usize = 100;

/// Lists every track of a playlist.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Returns all tracks, in playlist order. Failure is fatal to the run.
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>, PipelineError>;
}

/// Receives the sorted playlist.
#[async_trait]
pub trait PlaylistSink: Send + Sync {
    /// Creates an empty playlist and returns its id.
    async fn create_playlist(&self, name: &str) -> Result<String, PipelineError>;

    /// Appends `uris` to the playlist. Called with at most
    /// [`POPULATE_CHUNK_SIZE`] URIs at a time.
    async fn populate_playlist(&self, playlist_id: &str, uris: &[String])
        -> Result<(), PipelineError>;
}
