//! The run summary printed to stdout.

use serde::Serialize;
use tracker_core::{
    events::Event,
    pipeline::{ParkingMode, PipelineConfig, Zones},
    types::FrameSize,
};

/// Which zones were active for the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ZoneFlags {
    pub parking: bool,
    pub crowd: bool,
}

impl From<&Zones> for ZoneFlags {
    fn from(zones: &Zones) -> Self {
        Self {
            parking: zones.parking.is_some(),
            crowd: zones.crowd.is_some(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub input: String,
    pub output: Option<String>,
    pub frame_count_processed: u64,
    pub fps_used: f64,
    pub resolution: FrameSize,
    pub vehicle_detections_total: u64,
    pub illegal_parking_count: usize,
    pub crowding_event_count: usize,
    pub max_people_detected: usize,
    pub tracks_created: u64,
    pub zones: ZoneFlags,
    pub parking_mode: ParkingMode,
    pub config: PipelineConfig,
    pub issues: Vec<Event>,
    pub processing_time_seconds: f64,
}
