//! Track: identity, last known centroid and hit/miss counters.

use crate::types::{Point, TrackId};
use serde::{Deserialize, Serialize};

/// A single tracked object.
///
/// Owned by [`crate::tracker::CentroidTracker`]; everything outside the
/// tracker only ever sees copies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier
    pub id: TrackId,
    /// Last matched centroid (stale while the track is missing)
    #[serde(with = "point_serde")]
    pub centroid: Point,
    /// Frames in which the track was matched, birth included
    pub seen_count: u32,
    /// Consecutive frames without a match
    pub disappeared_count: u32,
}

impl Track {
    /// Create a track from its first detection.
    pub fn new(id: TrackId, centroid: Point) -> Self {
        Self {
            id,
            centroid,
            seen_count: 1,
            disappeared_count: 0,
        }
    }

    /// True when the track was matched in the most recent update.
    pub fn is_visible(&self) -> bool {
        self.disappeared_count == 0
    }
}

/// Serialise a `Point` as `[x, y]`.
mod point_serde {
    use crate::types::Point;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(p: &Point, s: S) -> Result<S::Ok, S::Error> {
        [p.x, p.y].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Point, D::Error> {
        let [x, y] = <[f64; 2]>::deserialize(d)?;
        Ok(Point::new(x, y))
    }
}
