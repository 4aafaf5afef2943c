//! Pipeline Orchestrator: the one entry point callers use.
//!
//! `sort_playlist` runs dedup, the batch processor, and the perceptual sort,
//! then projects the ordered tracks to URIs for a playlist sink. It keeps no
//! state between calls; the same input with the same artwork gives the same
//! order.

use crate::batch::{BatchProcessor, BatchProgress};
use crate::config::PipelineConfig;
use crate::dedup::DedupPlan;
use crate::error::PipelineError;
use crate::extract::ImageExtractor;
use crate::loader::{ArtworkLoader, HttpLoader};
use crate::source::{PlaylistSink, TrackSource, POPULATE_CHUNK_SIZE};
use hueify_core::{sort_tracks, ColorExtractor, ProcessedTrack, Track};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Sorted tracks plus the URIs to write, in the same order.
///
/// Tracks without a playable URI (local files) appear in `ordered_tracks`
/// but not in `ordered_uris`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SortedPlaylist {
    pub ordered_tracks: Vec<ProcessedTrack>,
    pub ordered_uris: Vec<String>,
}

impl SortedPlaylist {
    fn from_sorted(ordered_tracks: Vec<ProcessedTrack>) -> Self {
        let ordered_uris = ordered_tracks
            .iter()
            .filter_map(ProcessedTrack::output_uri)
            .map(str::to_string)
            .collect();
        Self {
            ordered_tracks,
            ordered_uris,
        }
    }

    pub fn len(&self) -> usize {
        self.ordered_tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_tracks.is_empty()
    }

    pub fn fallback_count(&self) -> usize {
        self.ordered_tracks.iter().filter(|t| t.is_fallback()).count()
    }
}

/// Composes dedup, batch processing and sorting.
pub struct Orchestrator {
    processor: BatchProcessor,
}

impl Orchestrator {
    /// Builds an orchestrator from explicit collaborators.
    ///
    /// Returns `PipelineError::Config` if `config` is unusable.
    pub fn new(
        extractor: Arc<dyn ColorExtractor>,
        loader: Arc<dyn ArtworkLoader>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        Ok(Self {
            processor: BatchProcessor::new(extractor, loader, config),
        })
    }

    /// Image-crate extractor and HTTP/filesystem loader.
    pub fn with_loader(loader: HttpLoader, config: PipelineConfig) -> Result<Self, PipelineError> {
        let extractor = ImageExtractor::new(config.extractor);
        Self::new(Arc::new(extractor), Arc::new(loader), config)
    }

    pub fn config(&self) -> &PipelineConfig {
        self.processor.config()
    }

    /// Sorts `tracks` perceptually. An empty list yields an empty result.
    pub async fn sort_playlist(&self, tracks: Vec<Track>) -> Result<SortedPlaylist, PipelineError> {
        self.sort_playlist_with_progress(tracks, &CancellationToken::new(), |_| {})
            .await
    }

    /// [`sort_playlist`](Self::sort_playlist) with per-batch progress and
    /// cooperative cancellation.
    ///
    /// Progress counts the tracks whose artwork is actually processed. Under
    /// [`DuplicateAlbumPolicy::Inherit`] and [`DuplicateAlbumPolicy::Exclude`]
    /// the later tracks of an album are held back, so `total` and `results`
    /// cover the first track of each album rather than the whole playlist.
    ///
    /// [`DuplicateAlbumPolicy::Inherit`]: crate::dedup::DuplicateAlbumPolicy::Inherit
    /// [`DuplicateAlbumPolicy::Exclude`]: crate::dedup::DuplicateAlbumPolicy::Exclude
    pub async fn sort_playlist_with_progress<F>(
        &self,
        tracks: Vec<Track>,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<SortedPlaylist, PipelineError>
    where
        F: FnMut(&BatchProgress<'_>),
    {
        let config = self.processor.config();
        let total = tracks.len();
        let (unique, plan) = DedupPlan::split(tracks, config.duplicate_albums);
        info!(
            tracks = total,
            unique = unique.len(),
            duplicates = plan.duplicate_count(),
            policy = config.duplicate_albums.name(),
            "sorting playlist"
        );

        let processed = self
            .processor
            .process_with_progress(unique, cancel, on_progress)
            .await?;
        let ordered = sort_tracks(plan.expand(processed), &config.sort);
        let sorted = SortedPlaylist::from_sorted(ordered);
        info!(
            tracks = sorted.len(),
            uris = sorted.ordered_uris.len(),
            fallbacks = sorted.fallback_count(),
            "playlist sorted"
        );
        Ok(sorted)
    }

    /// Fetches a playlist from `source` and sorts it.
    ///
    /// Source failures propagate unchanged; a playlist with no tracks is
    /// `PipelineError::EmptyPlaylist`.
    pub async fn sort_from_source(
        &self,
        source: &dyn TrackSource,
        playlist_id: &str,
    ) -> Result<SortedPlaylist, PipelineError> {
        self.sort_from_source_with_progress(source, playlist_id, &CancellationToken::new(), |_| {})
            .await
    }

    /// [`sort_from_source`](Self::sort_from_source) with per-batch progress
    /// and cooperative cancellation.
    pub async fn sort_from_source_with_progress<F>(
        &self,
        source: &dyn TrackSource,
        playlist_id: &str,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<SortedPlaylist, PipelineError>
    where
        F: FnMut(&BatchProgress<'_>),
    {
        let tracks = source.playlist_tracks(playlist_id).await?;
        if tracks.is_empty() {
            return Err(PipelineError::EmptyPlaylist);
        }
        info!(playlist = %playlist_id, tracks = tracks.len(), "fetched playlist");
        self.sort_playlist_with_progress(tracks, cancel, on_progress).await
    }

    /// Creates playlist `name` on `sink` and fills it with the sorted URIs,
    /// [`POPULATE_CHUNK_SIZE`] at a time. Returns the new playlist id.
    pub async fn save_sorted(
        &self,
        sink: &dyn PlaylistSink,
        name: &str,
        sorted: &SortedPlaylist,
    ) -> Result<String, PipelineError> {
        let playlist_id = sink.create_playlist(name).await?;
        for chunk in sorted.ordered_uris.chunks(POPULATE_CHUNK_SIZE) {
            sink.populate_playlist(&playlist_id, chunk).await?;
        }
        info!(playlist = %playlist_id, uris = sorted.ordered_uris.len(), "sorted playlist saved");
        Ok(playlist_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::DuplicateAlbumPolicy;
    use crate::extract::fixtures::solid_png;
    use crate::testing::{song, FailingLoader, MapLoader, MemorySource, RecordingSink};
    use hueify_core::{ColorSource, Lch, FALLBACK_COLOR};

    fn orchestrator(loader: impl ArtworkLoader + 'static, config: PipelineConfig) -> Orchestrator {
        Orchestrator::new(Arc::new(ImageExtractor::default()), Arc::new(loader), config).unwrap()
    }

    fn colored_loader() -> MapLoader {
        MapLoader::new()
            .with_bytes("https://img/blue", solid_png(16, [20, 40, 220]))
            .with_bytes("https://img/red", solid_png(16, [220, 20, 20]))
            .with_bytes("https://img/green", solid_png(16, [20, 180, 40]))
            .with_bytes("https://img/gray", solid_png(16, [120, 120, 120]))
    }

    fn ids(sorted: &SortedPlaylist) -> Vec<&str> {
        sorted.ordered_tracks.iter().map(|t| t.track.id()).collect()
    }

    #[tokio::test]
    async fn failing_decodes_keep_original_order() {
        let tracks = vec![
            song("one", "A", "https://img/broken1"),
            song("two", "B", "https://img/broken2"),
            song("three", "C", "https://img/broken3"),
        ];
        let loader = MapLoader::new()
            .with_bytes("https://img/broken1", b"not a png".to_vec())
            .with_bytes("https://img/broken2", b"still not".to_vec())
            .with_bytes("https://img/broken3", Vec::new());
        let sorted = orchestrator(loader, PipelineConfig::default())
            .sort_playlist(tracks)
            .await
            .unwrap();

        assert_eq!(ids(&sorted), vec!["one", "two", "three"]);
        assert_eq!(
            sorted.ordered_uris,
            vec!["spotify:track:one", "spotify:track:two", "spotify:track:three"]
        );
        for t in &sorted.ordered_tracks {
            assert_eq!(t.color, FALLBACK_COLOR);
            assert_eq!(t.lch, Lch::FALLBACK);
        }
        assert_eq!(sorted.fallback_count(), 3);
    }

    #[tokio::test]
    async fn sorts_by_hue_with_grays_last() {
        let tracks = vec![
            song("gray", "G", "https://img/gray"),
            song("blue", "B", "https://img/blue"),
            song("green", "N", "https://img/green"),
            song("red", "R", "https://img/red"),
        ];
        let sorted = orchestrator(colored_loader(), PipelineConfig::default())
            .sort_playlist(tracks)
            .await
            .unwrap();
        assert_eq!(ids(&sorted), vec!["red", "green", "blue", "gray"]);
        assert_eq!(sorted.ordered_uris[0], "spotify:track:red");
    }

    #[tokio::test]
    async fn repeated_runs_are_identical() {
        let tracks = vec![
            song("blue", "B", "https://img/blue"),
            song("red", "R", "https://img/red"),
            song("broken", "X", "https://img/missing"),
        ];
        let o = orchestrator(colored_loader(), PipelineConfig::default());
        let first = o.sort_playlist(tracks.clone()).await.unwrap();
        let second = o.sort_playlist(tracks).await.unwrap();
        assert_eq!(first.ordered_uris, second.ordered_uris);
    }

    #[tokio::test]
    async fn duplicate_albums_inherit_by_default() {
        let tracks = vec![
            song("red1", "R", "https://img/red"),
            song("blue", "B", "https://img/blue"),
            song("red2", "R", "https://img/unreachable"),
        ];
        let sorted = orchestrator(colored_loader(), PipelineConfig::default())
            .sort_playlist(tracks)
            .await
            .unwrap();
        assert_eq!(ids(&sorted), vec!["red1", "red2", "blue"]);
        assert_eq!(
            sorted.ordered_tracks[1].source,
            ColorSource::Inherited {
                from: "red1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn duplicate_albums_can_be_excluded() {
        let tracks = vec![
            song("red1", "R", "https://img/red"),
            song("red2", "R", "https://img/red"),
        ];
        let config = PipelineConfig {
            duplicate_albums: DuplicateAlbumPolicy::Exclude,
            ..PipelineConfig::default()
        };
        let sorted = orchestrator(colored_loader(), config)
            .sort_playlist(tracks)
            .await
            .unwrap();
        assert_eq!(ids(&sorted), vec!["red1"]);
        assert_eq!(sorted.ordered_uris.len(), 1);
    }

    #[tokio::test]
    async fn tracks_without_uri_are_not_emitted() {
        let mut local = song("local", "L", "https://img/red");
        if let Track::Song(s) = &mut local {
            s.uri.clear();
        }
        let tracks = vec![local, song("blue", "B", "https://img/blue")];
        let sorted = orchestrator(colored_loader(), PipelineConfig::default())
            .sort_playlist(tracks)
            .await
            .unwrap();
        assert_eq!(sorted.len(), 2);
        assert_eq!(sorted.ordered_uris, vec!["spotify:track:blue"]);
    }

    #[tokio::test]
    async fn empty_tracks_sort_to_empty() {
        let sorted = orchestrator(FailingLoader, PipelineConfig::default())
            .sort_playlist(Vec::new())
            .await
            .unwrap();
        assert!(sorted.is_empty());
        assert!(sorted.ordered_uris.is_empty());
    }

    #[tokio::test]
    async fn cancellation_surfaces_as_error() {
        let o = orchestrator(FailingLoader, PipelineConfig::default());
        let token = CancellationToken::new();
        token.cancel();
        let tracks = vec![song("a", "A", "https://img/a")];
        let err = o
            .sort_playlist_with_progress(tracks, &token, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled { processed: 0, total: 1 }));
    }

    #[tokio::test]
    async fn sort_from_source_fetches_then_sorts() {
        let source = MemorySource::with_playlist(
            "pl1",
            vec![
                song("blue", "B", "https://img/blue"),
                song("red", "R", "https://img/red"),
            ],
        );
        let sorted = orchestrator(colored_loader(), PipelineConfig::default())
            .sort_from_source(&source, "pl1")
            .await
            .unwrap();
        assert_eq!(ids(&sorted), vec!["red", "blue"]);
    }

    #[tokio::test]
    async fn sort_from_source_reports_progress_and_honors_cancel() {
        let tracks = vec![
            song("blue", "B", "https://img/blue"),
            song("red", "R", "https://img/red"),
        ];
        let source = MemorySource::with_playlist("pl1", tracks);
        let o = orchestrator(colored_loader(), PipelineConfig::default());

        let mut seen = Vec::new();
        let sorted = o
            .sort_from_source_with_progress(&source, "pl1", &CancellationToken::new(), |p| {
                seen.push((p.processed, p.total));
            })
            .await
            .unwrap();
        assert_eq!(ids(&sorted), vec!["red", "blue"]);
        assert_eq!(seen, vec![(2, 2)]);

        let token = CancellationToken::new();
        token.cancel();
        let err = o
            .sort_from_source_with_progress(&source, "pl1", &token, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled { processed: 0, total: 2 }));
    }

    #[tokio::test]
    async fn progress_counts_unique_albums_only() {
        let tracks = vec![
            song("red1", "R", "https://img/red"),
            song("red2", "R", "https://img/red"),
            song("red3", "R", "https://img/red"),
            song("blue", "B", "https://img/blue"),
        ];
        let mut last = None;
        let sorted = orchestrator(colored_loader(), PipelineConfig::default())
            .sort_playlist_with_progress(tracks, &CancellationToken::new(), |p| {
                last = Some((p.processed, p.total, p.results.len()));
            })
            .await
            .unwrap();
        assert_eq!(last, Some((2, 2, 2)));
        assert_eq!(sorted.len(), 4);
    }

    #[tokio::test]
    async fn duplicates_of_a_failed_album_count_as_fallbacks() {
        let tracks = vec![
            song("a1", "A", "https://img/missing"),
            song("a2", "A", "https://img/missing"),
            song("blue", "B", "https://img/blue"),
        ];
        let sorted = orchestrator(colored_loader(), PipelineConfig::default())
            .sort_playlist(tracks)
            .await
            .unwrap();
        assert_eq!(sorted.fallback_count(), 2);
        assert_eq!(ids(&sorted), vec!["blue", "a1", "a2"]);
    }

    #[tokio::test]
    async fn source_failure_is_fatal() {
        let source = MemorySource::default();
        let err = orchestrator(FailingLoader, PipelineConfig::default())
            .sort_from_source(&source, "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::TrackSource(_)));
    }

    #[tokio::test]
    async fn empty_source_playlist_is_an_error() {
        let source = MemorySource::with_playlist("empty", Vec::new());
        let err = orchestrator(FailingLoader, PipelineConfig::default())
            .sort_from_source(&source, "empty")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyPlaylist));
    }

    #[tokio::test]
    async fn save_sorted_populates_in_chunks_of_100() {
        let sorted = SortedPlaylist {
            ordered_tracks: Vec::new(),
            ordered_uris: (0..250).map(|i| format!("spotify:track:{i}")).collect(),
        };
        let sink = RecordingSink::default();
        let id = orchestrator(FailingLoader, PipelineConfig::default())
            .save_sorted(&sink, "Sorted by color", &sorted)
            .await
            .unwrap();

        assert_eq!(id, "playlist-1");
        assert_eq!(sink.created(), vec!["Sorted by color".to_string()]);
        let calls = sink.populated();
        let sizes: Vec<usize> = calls.iter().map(|(_, uris)| uris.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert!(calls.iter().all(|(pid, _)| pid == "playlist-1"));
        let flattened: Vec<String> = calls.into_iter().flat_map(|(_, uris)| uris).collect();
        assert_eq!(flattened, sorted.ordered_uris);
    }

    #[tokio::test]
    async fn sink_failure_propagates() {
        let sorted = SortedPlaylist {
            ordered_tracks: Vec::new(),
            ordered_uris: vec!["spotify:track:a".to_string()],
        };
        let sink = RecordingSink::failing();
        let err = orchestrator(FailingLoader, PipelineConfig::default())
            .save_sorted(&sink, "x", &sorted)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::PlaylistSink(_)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            batch_size: 0,
            ..PipelineConfig::default()
        };
        let result = Orchestrator::new(
            Arc::new(ImageExtractor::default()),
            Arc::new(FailingLoader),
            config,
        );
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
