//! Grid dwell counter: the track-free parking heuristic.
//!
//! The parking region is cut into square cells. Every vehicle centroid seen
//! in a cell bumps that cell's counter; a counter reaching
//! `stay_frames_threshold` reports the cell, at most once per cooldown. A
//! periodic decay pass keeps counters from accumulating stale traffic and
//! evicts cells that reach zero.

use crate::{
    events::{Event, EventKind},
    types::{Point, Stamp},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridDwellConfig {
    /// Sightings in one cell before it is reported
    pub stay_frames_threshold: u32,
    /// Minimum stream time (s) between two reports of the same cell
    pub cell_cooldown_seconds: f64,
    /// Run the decay pass every this many frames
    pub decay_interval_frames: u64,
    /// Amount subtracted from every counter by the decay pass
    pub decay_amount: u32,
    /// Without a parking zone, the region is the band below this fraction of the frame height
    pub roi_fraction: f64,
    /// Smallest allowed cell edge (pixels)
    pub min_cell_size: f64,
    /// Cell edge as a fraction of the shorter frame side
    pub cell_fraction: f64,
}

impl Default for GridDwellConfig {
    fn default() -> Self {
        Self {
            stay_frames_threshold: 30,
            cell_cooldown_seconds: 5.0,
            decay_interval_frames: 30,
            decay_amount: 2,
            roi_fraction: 0.6,
            min_cell_size: 40.0,
            cell_fraction: 0.05,
        }
    }
}

/// Grid cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
}

pub struct GridDwellCounter {
    pub config: GridDwellConfig,
    cell_size: f64,
    counts: HashMap<CellKey, u32>,
    last_flagged: HashMap<CellKey, f64>,
}

impl GridDwellCounter {
    /// Size the grid for a `width × height` frame.
    pub fn new(config: GridDwellConfig, width: u32, height: u32) -> Self {
        let short_side = width.min(height) as f64;
        let cell_size = (short_side * config.cell_fraction)
            .floor()
            .max(config.min_cell_size);
        Self {
            config,
            cell_size,
            counts: HashMap::new(),
            last_flagged: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cell_of(&self, p: &Point) -> CellKey {
        CellKey {
            x: (p.x / self.cell_size).floor() as i32,
            y: (p.y / self.cell_size).floor() as i32,
        }
    }

    /// Count one vehicle sighting at `centroid`.
    pub fn observe(&mut self, centroid: &Point, at: Stamp) -> Option<Event> {
        let key = self.cell_of(centroid);
        let count = self.counts.entry(key).or_insert(0);
        *count = count.saturating_add(1);
        if *count < self.config.stay_frames_threshold {
            return None;
        }

        let cooled_down = match self.last_flagged.get(&key) {
            Some(&last) => at.timestamp - last > self.config.cell_cooldown_seconds,
            None => true,
        };
        if !cooled_down {
            return None;
        }
        self.last_flagged.insert(key, at.timestamp);
        let ev = Event::new(
            at,
            EventKind::CellDwell {
                cell_x: key.x,
                cell_y: key.y,
                seen_frames: *count,
            },
        );
        tracing::info!("{ev}");
        Some(ev)
    }

    /// Close a frame; runs the decay pass on its cadence.
    pub fn end_frame(&mut self, frame: u64) {
        let interval = self.config.decay_interval_frames;
        if interval == 0 || frame == 0 || frame % interval != 0 {
            return;
        }
        let amount = self.config.decay_amount;
        self.counts.retain(|_, c| {
            *c = c.saturating_sub(amount);
            *c > 0
        });
    }

    pub fn count(&self, key: CellKey) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn active_cells(&self) -> usize {
        self.counts.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
