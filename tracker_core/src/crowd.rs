//! Crowd duration state machine: zone-wide head count sustained over time.
//!
//! A window opens on the first frame whose count reaches the threshold and
//! closes on any frame below it. A window open for at least the time
//! threshold reports once; closing it re-arms the machine.

use crate::{
    events::{Event, EventKind},
    types::{time_reached, Stamp},
};
use serde::{Deserialize, Serialize};

/// Thresholds for the crowd machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrowdConfig {
    /// People in the zone at or above which the frame counts as crowded
    pub count_threshold: usize,
    /// Seconds the crowd must persist before it is reported
    pub time_threshold: f64,
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            count_threshold: 5,
            time_threshold: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CrowdState {
    /// Stream time the current crowded window opened, if one is open
    pub window_start_ts: Option<f64>,
    /// Whether the open window has already been reported
    pub reported: bool,
}

pub struct CrowdMonitor {
    pub config: CrowdConfig,
    state: CrowdState,
}

impl CrowdMonitor {
    pub fn new(config: CrowdConfig) -> Self {
        Self {
            config,
            state: CrowdState::default(),
        }
    }

    /// Feed this frame's head count. Returns an event on the reporting frame.
    pub fn update(&mut self, people_count: usize, at: Stamp) -> Option<Event> {
        if people_count < self.config.count_threshold {
            if self.state.window_start_ts.is_some() {
                tracing::debug!(people_count, frame = at.frame, "crowd window closed");
            }
            self.state = CrowdState::default();
            return None;
        }

        let now = at.timestamp;
        let start = match self.state.window_start_ts {
            Some(start) => start,
            None => {
                self.state.window_start_ts = Some(now);
                return None;
            }
        };

        let duration = now - start;
        if time_reached(duration, self.config.time_threshold) && !self.state.reported {
            self.state.reported = true;
            let ev = Event::new(
                at,
                EventKind::StreetCrowding {
                    people_count,
                    duration_seconds: duration,
                },
            );
            tracing::info!("{ev}");
            return Some(ev);
        }
        None
    }

    pub fn state(&self) -> CrowdState {
        self.state
    }

    /// How long the current window has been open at `now`.
    pub fn window_duration(&self, now: f64) -> Option<f64> {
        self.state.window_start_ts.map(|start| (now - start).max(0.0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
