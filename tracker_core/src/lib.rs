//! `tracker_core` — Track association and zone event state machines.
//!
//! # Module layout
//! - [`types`]      — Fundamental types (points, ids, boxes, detections, frames)
//! - [`geometry`]   — Distance and boundary-inclusive point-in-polygon
//! - [`zone`]       — Zone polygons, zone files, membership filter
//! - [`track`]      — Track struct
//! - [`tracker`]    — Centroid tracker (greedy nearest-neighbour association)
//! - [`parking`]    — Parking dwell state machine
//! - [`crowd`]      — Crowd duration state machine
//! - [`grid_dwell`] — Track-free per-cell parking counter
//! - [`events`]     — Emitted safety events
//! - [`pipeline`]   — Per-frame orchestrator
//! - [`summary`]    — Run statistics

pub mod crowd;
pub mod error;
pub mod events;
pub mod geometry;
pub mod grid_dwell;
pub mod parking;
pub mod pipeline;
pub mod summary;
pub mod track;
pub mod tracker;
pub mod types;
pub mod zone;

pub use error::{ZoneError, ZoneResult};
pub use events::{Event, EventKind};
pub use pipeline::{FrameOutput, ParkingMode, Pipeline, PipelineConfig, Zones};
pub use summary::RunStats;
pub use track::Track;
pub use types::{BBox, Detection, Frame, FrameSize, ObjectCategory, Point, Stamp, TrackId};
pub use zone::Zone;
