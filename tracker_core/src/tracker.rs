//! Centroid tracker: birth, greedy nearest-neighbour association, deregistration.
//!
//! # Association Policy
//! - **Order**: live tracks are visited in ascending id order.
//! - **Match**: each track claims the closest not-yet-claimed centroid within
//!   `max_distance`. Ties keep the first centroid in input order.
//! - **Miss**: an unmatched track increments `disappeared_count` and is
//!   deregistered once it exceeds `max_disappeared`. Its id is retired.
//! - **Birth**: every centroid left unclaimed starts a new track.
//!
//! Greedy per-track matching is O(tracks × detections) and deterministic
//! frame to frame. It is not a globally optimal assignment.

use crate::{
    geometry::distance,
    track::Track,
    types::{Point, TrackId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for association and track retirement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Consecutive misses tolerated before a track is deregistered
    pub max_disappeared: u32,
    /// Largest centroid jump (pixels) accepted as the same object
    pub max_distance: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_disappeared: 30,
            max_distance: 80.0,
        }
    }
}

/// Result of one tracker update.
#[derive(Clone, Debug, Default)]
pub struct TrackerOutput {
    /// All live tracks after this update, ascending id
    pub tracks: Vec<Track>,
    /// Tracks born this update
    pub registered: Vec<TrackId>,
    /// Tracks retired this update
    pub deregistered: Vec<TrackId>,
}

impl TrackerOutput {
    /// Live tracks as `id → latest centroid`.
    pub fn centroids(&self) -> BTreeMap<TrackId, Point> {
        self.tracks.iter().map(|t| (t.id, t.centroid)).collect()
    }
}

/// Owns the live track table.
pub struct CentroidTracker {
    pub config: TrackerConfig,
    tracks: BTreeMap<TrackId, Track>,
    next_id: u64,
}

impl CentroidTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn next_track_id(&mut self) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Associate this frame's centroids with the live tracks.
    ///
    /// Empty input counts as a miss for every track. With no live tracks every
    /// centroid is born as a new track.
    pub fn update(&mut self, centroids: &[Point]) -> TrackerOutput {
        let mut claimed = vec![false; centroids.len()];
        let mut retired = Vec::new();

        for track in self.tracks.values_mut() {
            match nearest_unclaimed(&track.centroid, centroids, &claimed, self.config.max_distance)
            {
                Some(idx) => {
                    claimed[idx] = true;
                    track.centroid = centroids[idx];
                    track.seen_count = track.seen_count.saturating_add(1);
                    track.disappeared_count = 0;
                }
                None => {
                    track.disappeared_count = track.disappeared_count.saturating_add(1);
                    if track.disappeared_count > self.config.max_disappeared {
                        retired.push(track.id);
                    }
                }
            }
        }

        for id in &retired {
            self.tracks.remove(id);
            tracing::debug!(track = %id, "track deregistered");
        }

        let mut registered = Vec::new();
        for (idx, centroid) in centroids.iter().enumerate() {
            if claimed[idx] {
                continue;
            }
            let id = self.next_track_id();
            self.tracks.insert(id, Track::new(id, *centroid));
            registered.push(id);
        }

        TrackerOutput {
            tracks: self.tracks.values().copied().collect(),
            registered,
            deregistered: retired,
        }
    }

    /// Copy of a live track.
    pub fn get(&self, id: TrackId) -> Option<Track> {
        self.tracks.get(&id).copied()
    }

    pub fn live_count(&self) -> usize {
        self.tracks.len()
    }

    /// Number of ids handed out so far.
    pub fn total_registered(&self) -> u64 {
        self.next_id - 1
    }
}

/// Index of the closest unclaimed centroid within `max_distance`.
fn nearest_unclaimed(
    from: &Point,
    centroids: &[Point],
    claimed: &[bool],
    max_distance: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, c) in centroids.iter().enumerate() {
        if claimed[idx] {
            continue;
        }
        let d = distance(from, c);
        if d > max_distance {
            continue;
        }
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((idx, d));
        }
    }
    best.map(|(idx, _)| idx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn tracker(max_disappeared: u32) -> CentroidTracker {
        CentroidTracker::new(TrackerConfig {
            max_disappeared,
            max_distance: 50.0,
        })
    }

    #[test]
    fn first_frame_registers_everything() {
        let mut t = tracker(5);
        let out = t.update(&[p(10.0, 10.0), p(200.0, 200.0)]);
        assert_eq!(out.registered, vec![TrackId(1), TrackId(2)]);
        assert!(out.tracks.iter().all(|tr| tr.seen_count == 1 && tr.disappeared_count == 0));
    }

    #[test]
    fn matched_track_keeps_id_and_counts_hits() {
        let mut t = tracker(5);
        t.update(&[p(10.0, 10.0)]);
        t.update(&[p(14.0, 12.0)]);
        let out = t.update(&[p(18.0, 13.0)]);
        assert!(out.registered.is_empty());
        assert_eq!(out.tracks.len(), 1);
        let track = out.tracks[0];
        assert_eq!(track.id, TrackId(1));
        assert_eq!(track.seen_count, 3);
        assert_eq!(track.centroid, p(18.0, 13.0));
    }

    #[test]
    fn empty_frame_counts_a_miss_and_keeps_stale_centroid() {
        let mut t = tracker(5);
        t.update(&[p(10.0, 10.0)]);
        let out = t.update(&[]);
        assert_eq!(out.tracks.len(), 1);
        assert_eq!(out.tracks[0].disappeared_count, 1);
        assert_eq!(out.tracks[0].centroid, p(10.0, 10.0));
        assert!(!out.tracks[0].is_visible());
    }

    #[test]
    fn deregistered_after_exceeding_max_disappeared() {
        let mut t = tracker(2);
        t.update(&[p(10.0, 10.0)]);
        assert_eq!(t.update(&[]).tracks.len(), 1); // 1 miss
        assert_eq!(t.update(&[]).tracks.len(), 1); // 2 misses, still at the limit
        let out = t.update(&[]); // 3 > 2
        assert!(out.tracks.is_empty());
        assert_eq!(out.deregistered, vec![TrackId(1)]);
    }

    #[test]
    fn retired_id_is_never_reused() {
        let mut t = tracker(0);
        t.update(&[p(10.0, 10.0)]);
        let out = t.update(&[]);
        assert_eq!(out.deregistered, vec![TrackId(1)]);
        let out = t.update(&[p(10.0, 10.0)]);
        assert_eq!(out.registered, vec![TrackId(2)]);
        assert_eq!(t.total_registered(), 2);
    }

    #[test]
    fn far_detection_starts_new_track() {
        let mut t = tracker(5);
        t.update(&[p(10.0, 10.0)]);
        let out = t.update(&[p(300.0, 300.0)]);
        assert_eq!(out.registered, vec![TrackId(2)]);
        let old = t.get(TrackId(1)).unwrap();
        assert_eq!(old.disappeared_count, 1);
    }

    #[test]
    fn lower_id_claims_first_and_ties_keep_input_order() {
        let mut t = tracker(5);
        t.update(&[p(0.0, 0.0), p(20.0, 0.0)]);
        // Both candidates are 10px from track 1; the first supplied wins.
        // Track 2 then takes the remaining one.
        let out = t.update(&[p(10.0, 0.0), p(-10.0, 0.0)]);
        let c = out.centroids();
        assert_eq!(c[&TrackId(1)], p(10.0, 0.0));
        assert_eq!(c[&TrackId(2)], p(-10.0, 0.0));
        assert!(out.registered.is_empty());
    }

    #[test]
    fn ids_strictly_increase_in_order_of_first_appearance() {
        let mut t = tracker(1);
        let frames: Vec<Vec<Point>> = vec![
            vec![p(0.0, 0.0)],
            vec![p(500.0, 0.0), p(2.0, 0.0)],
            vec![],
            vec![],
            vec![],
            vec![p(0.0, 0.0), p(900.0, 900.0)],
        ];
        let mut seen = Vec::new();
        for f in &frames {
            seen.extend(t.update(f).registered);
        }
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.first(), Some(&TrackId(1)));
        assert_eq!(seen.len(), 4);
    }
}
