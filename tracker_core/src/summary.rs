//! Run statistics accumulated frame by frame by the pipeline.

use crate::events::Event;
use serde::Serialize;

/// Accumulated statistics for one run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunStats {
    /// Number of frames processed
    pub frames_processed: u64,
    /// Vehicle detections above the confidence threshold, zones ignored
    pub vehicle_detections_total: u64,
    /// Largest person count seen in one frame (crowd zone applied if set)
    pub max_people_detected: usize,
    /// Track ids handed out by the tracker
    pub tracks_created: u64,
    /// Per-frame anomalies skipped (tracks with no source box)
    pub skipped_tracks: u64,
    /// Every event emitted, in order
    pub events: Vec<Event>,
}

impl RunStats {
    pub fn record_events(&mut self, events: &[Event]) {
        self.events.extend_from_slice(events);
    }

    pub fn illegal_parking_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_illegal_parking()).count()
    }

    pub fn crowding_event_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_crowding()).count()
    }
}
