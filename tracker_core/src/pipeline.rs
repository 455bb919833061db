//! Pipeline orchestrator: the full zone-event cycle for one frame.
//!
//! # Processing steps per frame (strictly sequential)
//! 1. Drop detections below the confidence threshold
//! 2. Split into vehicles and people
//! 3. Parking, tracked mode: filter vehicles by the parking zone, update the
//!    centroid tracker, forget dwell records of retired ids, look up each
//!    visible track's source box and run the dwell machine
//! 4. Parking, grid mode: count vehicle sightings per cell of the parking region
//! 5. Filter people by the crowd zone and run the crowd machine
//! 6. Accumulate run statistics and build the frame annotation
//!
//! A missing zone disables its logic; the detections it would have scoped are
//! still counted and reported as untracked.

use crate::{
    crowd::{CrowdConfig, CrowdMonitor},
    events::Event,
    geometry::distance,
    grid_dwell::{GridDwellConfig, GridDwellCounter},
    parking::{DwellStatus, ParkingConfig, ParkingMonitor},
    summary::RunStats,
    tracker::{CentroidTracker, TrackerConfig},
    types::{Detection, Frame, FrameSize, ObjectCategory, Point, Stamp, TrackId},
    zone::{filter_detections, Zone},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// How illegal parking is detected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParkingMode {
    /// Per-track dwell time (centroid tracker + dwell machine)
    #[default]
    Tracked,
    /// Per-cell sighting counters, no tracking
    Grid,
}

/// Configuration for the frame pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Detections below this confidence never reach zone/track logic
    pub confidence_threshold: f64,
    /// Max distance (pixels) between a track centroid and its source box centre
    pub box_match_tolerance: f64,
    pub parking_mode: ParkingMode,
    pub tracker: TrackerConfig,
    pub parking: ParkingConfig,
    pub crowd: CrowdConfig,
    pub grid: GridDwellConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            box_match_tolerance: 1.0,
            parking_mode: ParkingMode::Tracked,
            tracker: TrackerConfig::default(),
            parking: ParkingConfig::default(),
            crowd: CrowdConfig::default(),
            grid: GridDwellConfig::default(),
        }
    }
}

/// The two zones of a run. Either may be absent (logic disabled).
#[derive(Clone, Debug, Default)]
pub struct Zones {
    pub parking: Option<Zone>,
    pub crowd: Option<Zone>,
}

// ---------------------------------------------------------------------------
// Per-frame output (annotation record)
// ---------------------------------------------------------------------------

/// A vehicle followed by the tracker this frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackedVehicle {
    pub track_id: TrackId,
    pub bbox: [f64; 4],
    pub seen_count: u32,
    /// `None` while the track is too young for dwell accounting
    pub dwell: Option<DwellStatus>,
}

/// What a renderer needs to annotate one frame.
#[derive(Clone, Debug, Serialize)]
pub struct FrameOutput {
    pub frame: u64,
    pub timestamp: f64,
    pub tracked_vehicles: Vec<TrackedVehicle>,
    /// Vehicle boxes drawn without zone semantics
    pub untracked_vehicles: Vec<[f64; 4]>,
    /// People counted for the crowd logic (whole frame without a crowd zone)
    pub people_in_zone: usize,
    /// Seconds the current crowded window has been open
    pub crowd_window_seconds: Option<f64>,
    pub live_tracks: usize,
    pub events: Vec<Event>,
    /// Wall-clock processing time
    pub process_time_us: u64,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Owns all per-run state: track table, dwell records, crowd state, stats.
pub struct Pipeline {
    pub config: PipelineConfig,
    zones: Zones,
    tracker: CentroidTracker,
    parking: ParkingMonitor,
    crowd: CrowdMonitor,
    grid: Option<GridDwellCounter>,
    frame_size: FrameSize,
    stats: RunStats,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, zones: Zones, frame_size: FrameSize) -> Self {
        let grid = match config.parking_mode {
            ParkingMode::Grid => Some(GridDwellCounter::new(
                config.grid.clone(),
                frame_size.width,
                frame_size.height,
            )),
            ParkingMode::Tracked => None,
        };
        Self {
            tracker: CentroidTracker::new(config.tracker.clone()),
            parking: ParkingMonitor::new(config.parking.clone()),
            crowd: CrowdMonitor::new(config.crowd.clone()),
            grid,
            zones,
            frame_size,
            stats: RunStats::default(),
            config,
        }
    }

    /// Process one frame. Frames must arrive in stream order.
    pub fn process_frame(&mut self, frame: &Frame) -> FrameOutput {
        let start = Instant::now();
        let at = frame.stamp();

        // ----------------------------------------------------------------
        // Step 1-2: confidence filter + class split
        // ----------------------------------------------------------------
        let min_conf = self.config.confidence_threshold;
        let mut vehicles = Vec::new();
        let mut people = Vec::new();
        for det in frame.detections.iter().filter(|d| d.confidence >= min_conf) {
            match det.category {
                ObjectCategory::Vehicle => vehicles.push(det.clone()),
                ObjectCategory::Person => people.push(det.clone()),
                ObjectCategory::Other => {}
            }
        }
        self.stats.frames_processed += 1;
        self.stats.vehicle_detections_total += vehicles.len() as u64;

        let mut events = Vec::new();
        let mut tracked_vehicles = Vec::new();
        let mut untracked_vehicles = Vec::new();

        // ----------------------------------------------------------------
        // Step 3-4: parking
        // ----------------------------------------------------------------
        match self.config.parking_mode {
            ParkingMode::Tracked => self.step_tracked(
                &vehicles,
                at,
                &mut events,
                &mut tracked_vehicles,
                &mut untracked_vehicles,
            ),
            ParkingMode::Grid => {
                self.step_grid(&vehicles, at, &mut events);
                untracked_vehicles.extend(vehicles.iter().map(|d| d.bbox.to_array()));
            }
        }

        // ----------------------------------------------------------------
        // Step 5: crowd
        // ----------------------------------------------------------------
        let in_crowd_zone = filter_detections(&people, self.zones.crowd.as_ref());
        let people_in_zone = in_crowd_zone.len();
        self.stats.max_people_detected = self.stats.max_people_detected.max(people_in_zone);
        if self.zones.crowd.is_some() {
            if let Some(ev) = self.crowd.update(people_in_zone, at) {
                events.push(ev);
            }
        }

        // ----------------------------------------------------------------
        // Step 6: stats + annotation
        // ----------------------------------------------------------------
        self.stats.record_events(&events);

        FrameOutput {
            frame: frame.index,
            timestamp: frame.timestamp,
            tracked_vehicles,
            untracked_vehicles,
            people_in_zone,
            crowd_window_seconds: self.crowd.window_duration(frame.timestamp),
            live_tracks: self.tracker.live_count(),
            events,
            process_time_us: start.elapsed().as_micros() as u64,
        }
    }

    fn step_tracked(
        &mut self,
        vehicles: &[Detection],
        at: Stamp,
        events: &mut Vec<Event>,
        tracked: &mut Vec<TrackedVehicle>,
        untracked: &mut Vec<[f64; 4]>,
    ) {
        let zone = match self.zones.parking.as_ref() {
            Some(zone) => zone,
            None => {
                untracked.extend(vehicles.iter().map(|d| d.bbox.to_array()));
                return;
            }
        };

        let in_zone = filter_detections(vehicles, Some(zone));
        untracked.extend(
            vehicles
                .iter()
                .filter(|d| !zone.contains(&d.centroid))
                .map(|d| d.bbox.to_array()),
        );

        let centroids: Vec<Point> = in_zone.iter().map(|d| d.centroid).collect();
        let update = self.tracker.update(&centroids);
        for id in &update.deregistered {
            self.parking.forget(*id);
        }
        self.stats.tracks_created += update.registered.len() as u64;

        let tolerance = self.config.box_match_tolerance;
        for track in &update.tracks {
            let source = if track.is_visible() {
                nearest_detection(&track.centroid, &in_zone, tolerance)
            } else {
                None
            };
            let det = match source {
                Some(det) => det,
                None => {
                    tracing::debug!(
                        track = %track.id,
                        frame = at.frame,
                        disappeared = track.disappeared_count,
                        "no source box for track this frame, skipped"
                    );
                    self.stats.skipped_tracks += 1;
                    continue;
                }
            };

            let outcome = self
                .parking
                .update(track.id, track.centroid, at, track.seen_count);
            let dwell = outcome.map(|o| {
                events.extend(o.event);
                o.status
            });
            tracked.push(TrackedVehicle {
                track_id: track.id,
                bbox: det.bbox.to_array(),
                seen_count: track.seen_count,
                dwell,
            });
        }
    }

    fn step_grid(&mut self, vehicles: &[Detection], at: Stamp, events: &mut Vec<Event>) {
        let grid = match self.grid.as_mut() {
            Some(grid) => grid,
            None => return,
        };
        let band_start = self.frame_size.height as f64 * grid.config.roi_fraction;
        for det in vehicles {
            let in_region = match self.zones.parking.as_ref() {
                Some(zone) => zone.contains(&det.centroid),
                None => det.centroid.y >= band_start,
            };
            if in_region {
                events.extend(grid.observe(&det.centroid, at));
            }
        }
        grid.end_frame(at.frame);
    }

    /// Statistics accumulated so far.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Consume the pipeline, returning the final statistics.
    pub fn finish(self) -> RunStats {
        self.stats
    }
}

/// The detection whose centre is closest to `centroid`, within `tolerance`.
fn nearest_detection<'a>(
    centroid: &Point,
    detections: &'a [Detection],
    tolerance: f64,
) -> Option<&'a Detection> {
    detections
        .iter()
        .map(|d| (d, distance(centroid, &d.centroid)))
        .filter(|(_, dist)| *dist <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(d, _)| d)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
