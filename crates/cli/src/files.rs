//! JSON-file track source and playlist sink.
//!
//! The source reads either a bare array of track objects or a playlist
//! items page (`{"items": [{"track": {...}}, ...]}`); `null` tracks are
//! skipped. The sink writes each playlist to `<dir>/<id>.json` as
//! `{"name": ..., "uris": [...]}`.

use async_trait::async_trait;
use hueify_core::Track;
use hueify_pipeline::{PipelineError, PlaylistSink, TrackSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct PlaylistItem {
    track: Option<Track>,
}

/// Parses a track list document.
pub fn parse_tracks(value: Value) -> Result<Vec<Track>, serde_json::Error> {
    match value {
        Value::Object(mut page) if page.contains_key("items") => {
            let items: Vec<PlaylistItem> =
                serde_json::from_value(page.remove("items").unwrap_or(Value::Null))?;
            Ok(items.into_iter().filter_map(|item| item.track).collect())
        }
        other => serde_json::from_value(other),
    }
}

/// Reads playlists from JSON files. A playlist id is a path relative to
/// the source root.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    root: PathBuf,
}

impl JsonFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TrackSource for JsonFileSource {
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>, PipelineError> {
        let path = self.root.join(playlist_id);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| PipelineError::TrackSource(format!("{}: {e}", path.display())))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| PipelineError::TrackSource(format!("{}: {e}", path.display())))?;
        parse_tracks(value)
            .map_err(|e| PipelineError::TrackSource(format!("{}: {e}", path.display())))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedPlaylist {
    name: String,
    uris: Vec<String>,
}

/// Writes playlists as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `playlist_id`.
    pub fn playlist_path(&self, playlist_id: &str) -> PathBuf {
        self.dir.join(format!("{playlist_id}.json"))
    }

    async fn write(&self, path: &Path, playlist: &SavedPlaylist) -> Result<(), PipelineError> {
        let text = serde_json::to_string_pretty(playlist)
            .map_err(|e| PipelineError::PlaylistSink(e.to_string()))?;
        tokio::fs::write(path, text)
            .await
            .map_err(|e| PipelineError::PlaylistSink(format!("{}: {e}", path.display())))
    }
}

/// Lowercase ASCII letters and digits, everything else collapsed to `-`.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "playlist".to_string()
    } else {
        slug.to_string()
    }
}

#[async_trait]
impl PlaylistSink for JsonDirSink {
    async fn create_playlist(&self, name: &str) -> Result<String, PipelineError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PipelineError::PlaylistSink(format!("{}: {e}", self.dir.display())))?;

        let base = slugify(name);
        let mut id = base.clone();
        let mut n = 1;
        while tokio::fs::try_exists(self.playlist_path(&id))
            .await
            .map_err(|e| PipelineError::PlaylistSink(e.to_string()))?
        {
            n += 1;
            id = format!("{base}-{n}");
        }

        let playlist = SavedPlaylist {
            name: name.to_string(),
            uris: Vec::new(),
        };
        self.write(&self.playlist_path(&id), &playlist).await?;
        Ok(id)
    }

    async fn populate_playlist(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), PipelineError> {
        let path = self.playlist_path(playlist_id);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| PipelineError::PlaylistSink(format!("{}: {e}", path.display())))?;
        let mut playlist: SavedPlaylist = serde_json::from_str(&text)
            .map_err(|e| PipelineError::PlaylistSink(format!("{}: {e}", path.display())))?;
        playlist.uris.extend_from_slice(uris);
        self.write(&path, &playlist).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn track_json(id: &str) -> Value {
        json!({
            "type": "track",
            "id": id,
            "name": id,
            "uri": format!("spotify:track:{id}"),
            "album": {"id": "al", "name": "Album", "images": []}
        })
    }

    #[test]
    fn parses_bare_track_array() {
        let tracks = parse_tracks(json!([track_json("a"), track_json("b")])).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].id(), "b");
    }

    #[test]
    fn parses_items_page_and_skips_null_tracks() {
        let page = json!({
            "items": [
                {"added_at": "2024-01-01T00:00:00Z", "track": track_json("a")},
                {"track": null},
                {"track": track_json("c")}
            ],
            "next": null
        });
        let tracks = parse_tracks(page).unwrap();
        let ids: Vec<&str> = tracks.iter().map(Track::id).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn rejects_non_track_documents() {
        assert!(parse_tracks(json!({"name": "no items"})).is_err());
        assert!(parse_tracks(json!([{"type": "track"}])).is_err());
    }

    #[test]
    fn slugify_names() {
        assert_eq!(slugify("Sorted by Color!"), "sorted-by-color");
        assert_eq!(slugify("  Rainbow  Mix "), "rainbow-mix");
        assert_eq!(slugify("???"), "playlist");
    }

    #[tokio::test]
    async fn file_source_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("mix.json"),
            serde_json::to_string(&json!([track_json("x")])).unwrap(),
        )
        .unwrap();
        let source = JsonFileSource::new(dir.path());
        let tracks = source.playlist_tracks("mix.json").await.unwrap();
        assert_eq!(tracks[0].id(), "x");
    }

    #[tokio::test]
    async fn file_source_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{oops").unwrap();
        let source = JsonFileSource::new(dir.path());

        let missing = source.playlist_tracks("missing.json").await.unwrap_err();
        assert!(matches!(missing, PipelineError::TrackSource(ref m) if m.contains("missing.json")));

        let bad = source.playlist_tracks("bad.json").await.unwrap_err();
        assert!(matches!(bad, PipelineError::TrackSource(ref m) if m.contains("bad.json")));
    }

    #[tokio::test]
    async fn dir_sink_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path().join("out"));

        let id = sink.create_playlist("Sorted by Color").await.unwrap();
        assert_eq!(id, "sorted-by-color");
        sink.populate_playlist(&id, &["u1".to_string(), "u2".to_string()])
            .await
            .unwrap();
        sink.populate_playlist(&id, &["u3".to_string()]).await.unwrap();

        let saved: SavedPlaylist =
            serde_json::from_str(&std::fs::read_to_string(sink.playlist_path(&id)).unwrap())
                .unwrap();
        assert_eq!(saved.name, "Sorted by Color");
        assert_eq!(saved.uris, vec!["u1", "u2", "u3"]);
    }

    #[tokio::test]
    async fn dir_sink_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path());
        let first = sink.create_playlist("Mix").await.unwrap();
        let second = sink.create_playlist("Mix").await.unwrap();
        assert_eq!(first, "mix");
        assert_eq!(second, "mix-2");
    }

    #[tokio::test]
    async fn populate_unknown_playlist_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path());
        let err = sink.populate_playlist("ghost", &[]).await.unwrap_err();
        assert!(matches!(err, PipelineError::PlaylistSink(_)));
    }
}
