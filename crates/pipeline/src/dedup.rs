//! Duplicate-album handling.
//!
//! Tracks from the same album share artwork, so only the first track of each
//! album needs its artwork processed. [`DedupPlan::split`] separates those
//! first occurrences from the rest; [`DedupPlan::expand`] puts the processed
//! results back in playlist order, applying the [`DuplicateAlbumPolicy`] to
//! the tracks that were held back. The set of seen albums lives only for the
//! duration of one `split` call.

use hueify_core::{ProcessedTrack, Track};
use std::collections::HashMap;

/// What to do with the second and later tracks of an album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateAlbumPolicy {
    /// Reuse the first track's color; every track stays in the output.
    #[default]
    Inherit,
    /// Drop later tracks of an album from the output.
    Exclude,
    /// Process every track's artwork independently.
    Off,
}

impl DuplicateAlbumPolicy {
    /// Parses `"inherit"`, `"exclude"` or `"off"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "inherit" => Some(DuplicateAlbumPolicy::Inherit),
            "exclude" => Some(DuplicateAlbumPolicy::Exclude),
            "off" => Some(DuplicateAlbumPolicy::Off),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DuplicateAlbumPolicy::Inherit => "inherit",
            DuplicateAlbumPolicy::Exclude => "exclude",
            DuplicateAlbumPolicy::Off => "off",
        }
    }
}

#[derive(Debug)]
enum Slot {
    /// Position in the unique list handed to the batch processor.
    Unique(usize),
    /// A held-back track and the unique position of its album's first track.
    Duplicate { of: usize, track: Track },
}

/// Playlist order, remembered while the unique tracks are processed.
#[derive(Debug)]
pub struct DedupPlan {
    policy: DuplicateAlbumPolicy,
    slots: Vec<Slot>,
}

impl DedupPlan {
    /// Splits `tracks` into the ones whose artwork must be processed and a
    /// plan for restoring the full list afterwards.
    ///
    /// Tracks without an album id (episodes, local files) are always unique.
    pub fn split(tracks: Vec<Track>, policy: DuplicateAlbumPolicy) -> (Vec<Track>, Self) {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut unique = Vec::with_capacity(tracks.len());
        let mut slots = Vec::with_capacity(tracks.len());

        for track in tracks {
            let album = match policy {
                DuplicateAlbumPolicy::Off => None,
                _ => track.album_id().map(str::to_string),
            };
            match album.as_ref().and_then(|id| seen.get(id).copied()) {
                Some(of) => slots.push(Slot::Duplicate { of, track }),
                None => {
                    let position = unique.len();
                    if let Some(id) = album {
                        seen.insert(id, position);
                    }
                    unique.push(track);
                    slots.push(Slot::Unique(position));
                }
            }
        }

        (unique, Self { policy, slots })
    }

    /// Number of tracks held back as duplicates.
    pub fn duplicate_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Duplicate { .. }))
            .count()
    }

    /// Rebuilds playlist order from results aligned with the unique list.
    ///
    /// Under [`DuplicateAlbumPolicy::Exclude`] held-back tracks are dropped;
    /// otherwise they inherit their album's color. Slots whose unique result
    /// is missing (a cancelled run) are skipped.
    pub fn expand(self, processed: Vec<ProcessedTrack>) -> Vec<ProcessedTrack> {
        let mut out = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            match slot {
                Slot::Unique(position) => {
                    if let Some(p) = processed.get(position) {
                        out.push(p.clone());
                    }
                }
                Slot::Duplicate { of, track } => {
                    if self.policy == DuplicateAlbumPolicy::Exclude {
                        continue;
                    }
                    if let Some(origin) = processed.get(of) {
                        out.push(ProcessedTrack::inherit(track, origin));
                    }
                }
            }
        }
        out
    }
}
