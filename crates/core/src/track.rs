//! Playlist items as the pipeline sees them.
//!
//! A [`Track`] is either a song or a podcast episode. The variant is fixed
//! when the JSON is parsed (by its `"type"` field) and the pipeline only ever
//! talks to it through the shared accessors: [`Track::id`],
//! [`Track::display_name`], [`Track::artwork_variants`] and
//! [`Track::output_uri`].
//!
//! The serde layout follows the Spotify Web API track and episode objects;
//! unknown fields are ignored.

use crate::error::ColorError;
use serde::{Deserialize, Deserializer, Serialize};

/// Image path used when a track has no artwork at all.
pub const FALLBACK_IMAGE: &str = "/spotify/spotify-green.png";
/// Artwork variant requested by default (the medium-resolution image).
pub const DEFAULT_ARTWORK_INDEX: usize = 1;
/// Highest artwork variant index a caller may request.
pub const MAX_ARTWORK_INDEX: usize = 2;

/// Deserializes a nullable string, mapping `null` to the empty string.
fn string_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One artwork rendition: a URL and its approximate pixel size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl Artwork {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
        }
    }

    pub fn sized(url: impl Into<String>, size: u32) -> Self {
        Self {
            url: url.into(),
            width: Some(size),
            height: Some(size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    #[serde(default, deserialize_with = "string_or_null")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub name: String,
    #[serde(default)]
    pub images: Vec<Artwork>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    #[serde(default, deserialize_with = "string_or_null")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub uri: String,
    pub album: Album,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(default, deserialize_with = "string_or_null")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub uri: String,
    #[serde(default)]
    pub images: Vec<Artwork>,
}

/// A playlist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Track {
    #[serde(rename = "track")]
    Song(Song),
    Episode(Episode),
}

impl Track {
    pub fn id(&self) -> &str {
        match self {
            Track::Song(s) => &s.id,
            Track::Episode(e) => &e.id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Track::Song(s) => &s.name,
            Track::Episode(e) => &e.name,
        }
    }

    /// Artwork renditions, largest first as delivered by the source.
    pub fn artwork_variants(&self) -> &[Artwork] {
        match self {
            Track::Song(s) => &s.album.images,
            Track::Episode(e) => &e.images,
        }
    }

    /// URI for the playlist sink, or `None` when the item has none (local files).
    pub fn output_uri(&self) -> Option<&str> {
        let uri = match self {
            Track::Song(s) => &s.uri,
            Track::Episode(e) => &e.uri,
        };
        (!uri.is_empty()).then_some(uri.as_str())
    }

    /// Album identity used for duplicate-artwork detection. Episodes have none.
    pub fn album_id(&self) -> Option<&str> {
        match self {
            Track::Song(s) if !s.album.id.is_empty() => Some(&s.album.id),
            _ => None,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Track::Song(_) => "track",
            Track::Episode(_) => "episode",
        }
    }

    /// See [`get_artwork_url`].
    pub fn artwork_url(&self, index: usize) -> Result<&str, ColorError> {
        get_artwork_url(self, index)
    }
}

/// Picks the artwork URL to sample for `track`.
///
/// Uses variant `index` when present, otherwise the third variant, otherwise
/// [`FALLBACK_IMAGE`]. A track without any artwork always gets
/// [`FALLBACK_IMAGE`]. Indices above [`MAX_ARTWORK_INDEX`] are rejected with
/// `ColorError::ArtworkIndexOutOfRange`.
pub fn get_artwork_url(track: &Track, index: usize) -> Result<&str, ColorError> {
    if index > MAX_ARTWORK_INDEX {
        return Err(ColorError::ArtworkIndexOutOfRange { index });
    }
    let variants = track.artwork_variants();
    let usable = |i: usize| {
        variants
            .get(i)
            .map(|a| a.url.as_str())
            .filter(|url| !url.is_empty())
    };
    Ok(usable(index)
        .or_else(|| usable(MAX_ARTWORK_INDEX))
        .unwrap_or(FALLBACK_IMAGE))
}
