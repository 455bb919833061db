//! Safety events emitted by the zone state machines.

use crate::types::{Stamp, TrackId};
use serde::Serialize;
use std::fmt;

/// An emitted event. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    /// Frame index at which the event fired
    pub frame: u64,
    /// Stream time (s) at which the event fired
    pub timestamp: f64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A tracked vehicle stayed still in the parking zone past the threshold.
    IllegalParking {
        track_id: TrackId,
        duration_seconds: f64,
    },
    /// The crowd zone held at least the threshold head count past the threshold.
    StreetCrowding {
        people_count: usize,
        duration_seconds: f64,
    },
    /// Grid mode: a cell of the parking region kept seeing vehicles.
    CellDwell {
        cell_x: i32,
        cell_y: i32,
        seen_frames: u32,
    },
}

impl Event {
    pub fn new(at: Stamp, kind: EventKind) -> Self {
        Self {
            frame: at.frame,
            timestamp: at.timestamp,
            kind,
        }
    }

    /// Both parking flavours count as illegal parking in the run summary.
    pub fn is_illegal_parking(&self) -> bool {
        matches!(
            self.kind,
            EventKind::IllegalParking { .. } | EventKind::CellDwell { .. }
        )
    }

    pub fn is_crowding(&self) -> bool {
        matches!(self.kind, EventKind::StreetCrowding { .. })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EventKind::IllegalParking {
                track_id,
                duration_seconds,
            } => write!(
                f,
                "illegal parking: {track_id} stationary for {duration_seconds:.1}s (frame {})",
                self.frame
            ),
            EventKind::StreetCrowding {
                people_count,
                duration_seconds,
            } => write!(
                f,
                "street crowding: {people_count} people for {duration_seconds:.1}s (frame {})",
                self.frame
            ),
            EventKind::CellDwell {
                cell_x,
                cell_y,
                seen_frames,
            } => write!(
                f,
                "vehicle staying in cell ({cell_x}, {cell_y}) for {seen_frames} frames (frame {})",
                self.frame
            ),
        }
    }
}
