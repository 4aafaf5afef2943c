#![deny(unsafe_code)]
//! Async stages of the hueify pipeline.
//!
//! This crate sits between `hueify-core` (pure color math, selection and
//! sorting) and the outside world. It loads artwork, decodes it with the
//! `image` crate, runs extractions in bounded concurrent batches on tokio,
//! and exposes [`Orchestrator`] as the single entry point for sorting a
//! playlist. The streaming service itself stays behind the [`TrackSource`]
//! and [`PlaylistSink`] traits.

pub mod batch;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod loader;
pub mod orchestrator;
pub mod source;

pub use batch::{BatchProcessor, BatchProgress};
pub use config::PipelineConfig;
pub use dedup::{DedupPlan, DuplicateAlbumPolicy};
pub use error::PipelineError;
pub use extract::ImageExtractor;
pub use loader::{ArtworkLoader, HttpLoader};
pub use orchestrator::{Orchestrator, SortedPlaylist};
pub use source::{PlaylistSink, TrackSource, POPULATE_CHUNK_SIZE};
pub use tokio_util::sync::CancellationToken;
