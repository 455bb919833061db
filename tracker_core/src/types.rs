//! Fundamental types used across the entire workspace.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Scalar type: pixel coordinates are f64 throughout.
// ---------------------------------------------------------------------------

/// A point in frame pixel coordinates (centroids, zone vertices).
pub type Point = Point2<f64>;

// ---------------------------------------------------------------------------
// Identifier types
// ---------------------------------------------------------------------------

/// Track identity. Assigned from 1 upwards and never reused within a run.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Where in the stream something happened: frame index plus stream time (s).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stamp {
    pub frame: u64,
    pub timestamp: f64,
}

impl Stamp {
    pub fn new(frame: u64, timestamp: f64) -> Self {
        Self { frame, timestamp }
    }
}

/// Slack for elapsed-time threshold checks, in seconds.
///
/// Durations are built from differences of frame timestamps
/// (`2.3 - 0.3 == 1.9999999999999998`), so a plain `>=` misses by a frame.
pub const TIME_EPS: f64 = 1e-9;

/// True once `elapsed` seconds have reached `threshold`.
pub fn time_reached(elapsed: f64, threshold: f64) -> bool {
    elapsed >= threshold - TIME_EPS
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Labels the detector uses for vehicles (COCO names).
pub const VEHICLE_LABELS: [&str; 5] = ["car", "bus", "truck", "motorbike", "motorcycle"];

/// Label the detector uses for pedestrians.
pub const PERSON_LABEL: &str = "person";

/// Coarse class used to route a detection to the parking or crowd logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectCategory {
    Vehicle,
    Person,
    Other,
}

impl ObjectCategory {
    pub fn from_label(label: &str) -> Self {
        if VEHICLE_LABELS.contains(&label) {
            ObjectCategory::Vehicle
        } else if label == PERSON_LABEL {
            ObjectCategory::Person
        } else {
            ObjectCategory::Other
        }
    }
}

/// Axis-aligned bounding box `(x1, y1)`–`(x2, y2)` in pixels, `x1 <= x2`, `y1 <= y2`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BBox {
    /// Build a box from two corners given in any order.
    pub fn from_corners(xa: f64, ya: f64, xb: f64, yb: f64) -> Self {
        Self {
            x1: xa.min(xb),
            y1: ya.min(yb),
            x2: xa.max(xb),
            y2: ya.max(yb),
        }
    }

    pub fn centroid(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// One detector box for one frame, already parsed and validated.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub label: String,
    pub category: ObjectCategory,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
    pub bbox: BBox,
    /// Box centre, cached at construction
    pub centroid: Point,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64, bbox: BBox) -> Self {
        let label = label.into();
        Self {
            category: ObjectCategory::from_label(&label),
            centroid: bbox.centroid(),
            label,
            confidence,
            bbox,
        }
    }
}

/// Frame resolution in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl Default for FrameSize {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// All detections of one frame plus its position in the stream.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub index: u64,
    /// Stream time in seconds
    pub timestamp: f64,
    pub detections: Vec<Detection>,
}

impl Frame {
    pub fn stamp(&self) -> Stamp {
        Stamp::new(self.index, self.timestamp)
    }
}
