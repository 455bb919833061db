//! Parking dwell state machine: per-track stationary time and one-shot
//! illegal-parking events.
//!
//! # Per-call transition (one tracked vehicle, one frame)
//! 1. `seen_count < min_seen_frames` → ignored (transient tracks)
//! 2. first qualifying call → record created, `Initializing`
//! 3. movement below `movement_threshold` adds the elapsed time to the
//!    stationary clock, any larger movement resets it to zero
//! 4. stationary clock ≥ `parking_time_threshold` on an unflagged record →
//!    flag it and emit `IllegalParking` (once per track id)

use crate::{
    events::{Event, EventKind},
    geometry::distance,
    types::{time_reached, Point, Stamp, TrackId},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Thresholds for the parking dwell machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParkingConfig {
    /// Track must have been matched this many frames before it counts
    pub min_seen_frames: u32,
    /// Per-frame movement (pixels) below which the vehicle counts as still
    pub movement_threshold: f64,
    /// Stationary seconds before the vehicle is illegally parked
    pub parking_time_threshold: f64,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            min_seen_frames: 3,
            movement_threshold: 20.0,
            parking_time_threshold: 2.0,
        }
    }
}

/// Dwell bookkeeping for one track id.
#[derive(Clone, Debug, PartialEq)]
pub struct DwellRecord {
    pub last_update_ts: f64,
    pub last_position: Point,
    pub stationary_time: f64,
    pub flagged: bool,
}

/// Display state of a tracked vehicle after a dwell update.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DwellStatus {
    /// First qualifying frame, no history yet
    Initializing,
    /// Stationary clock at zero
    Moving,
    /// Still, but not for long enough yet
    Pending { stationary_time: f64 },
    /// Still for at least the threshold
    Parked { stationary_time: f64 },
}

/// Outcome of one dwell update.
#[derive(Clone, Debug, PartialEq)]
pub struct DwellOutcome {
    pub status: DwellStatus,
    /// Set only on the frame the track is first flagged
    pub event: Option<Event>,
}

/// Owns every track's [`DwellRecord`].
pub struct ParkingMonitor {
    pub config: ParkingConfig,
    records: HashMap<TrackId, DwellRecord>,
}

impl ParkingMonitor {
    pub fn new(config: ParkingConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
        }
    }

    /// Feed one tracked vehicle's position for this frame.
    ///
    /// Returns `None` while the track has not been seen often enough.
    pub fn update(
        &mut self,
        track_id: TrackId,
        centroid: Point,
        at: Stamp,
        seen_count: u32,
    ) -> Option<DwellOutcome> {
        if seen_count < self.config.min_seen_frames {
            return None;
        }
        let now = at.timestamp;

        let record = match self.records.get_mut(&track_id) {
            Some(record) => record,
            None => {
                self.records.insert(
                    track_id,
                    DwellRecord {
                        last_update_ts: now,
                        last_position: centroid,
                        stationary_time: 0.0,
                        flagged: false,
                    },
                );
                return Some(DwellOutcome {
                    status: DwellStatus::Initializing,
                    event: None,
                });
            }
        };

        let movement = distance(&centroid, &record.last_position);
        let dt = (now - record.last_update_ts).max(0.0);
        if movement < self.config.movement_threshold {
            record.stationary_time += dt;
        } else {
            record.stationary_time = 0.0;
        }
        record.last_update_ts = now;
        record.last_position = centroid;

        let threshold = self.config.parking_time_threshold;
        let mut event = None;
        if time_reached(record.stationary_time, threshold) && !record.flagged {
            record.flagged = true;
            let ev = Event::new(
                at,
                EventKind::IllegalParking {
                    track_id,
                    duration_seconds: record.stationary_time,
                },
            );
            tracing::info!("{ev}");
            event = Some(ev);
        }

        let status = if time_reached(record.stationary_time, threshold) {
            DwellStatus::Parked {
                stationary_time: record.stationary_time,
            }
        } else if record.stationary_time > 0.0 {
            DwellStatus::Pending {
                stationary_time: record.stationary_time,
            }
        } else {
            DwellStatus::Moving
        };

        Some(DwellOutcome { status, event })
    }

    /// Drop the record of a retired track id.
    pub fn forget(&mut self, track_id: TrackId) -> bool {
        self.records.remove(&track_id).is_some()
    }

    pub fn record(&self, track_id: TrackId) -> Option<&DwellRecord> {
        self.records.get(&track_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
