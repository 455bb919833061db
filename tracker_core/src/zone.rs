//! Zone polygons: loading, saving and membership filtering.
//!
//! Zone files are written by an external authoring tool as
//! `{"points": [[x, y], ...]}` with integer pixel coordinates. A zone that
//! cannot be loaded is not an error for the run: the caller gets `None` and
//! the corresponding zone logic is disabled.

use crate::{
    error::{ZoneError, ZoneResult},
    geometry::point_in_polygon,
    types::{Detection, Point},
};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// On-disk representation of a zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFile {
    pub points: Vec<[i64; 2]>,
}

/// A closed polygon region of the frame. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    vertices: Vec<Point>,
}

impl Zone {
    /// Build a zone from at least 3 finite vertices.
    pub fn new(vertices: Vec<Point>) -> ZoneResult<Self> {
        if vertices.len() < 3 {
            return Err(ZoneError::TooFewVertices(vertices.len()));
        }
        if let Some(v) = vertices.iter().find(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return Err(ZoneError::NonFiniteVertex(v.x, v.y));
        }
        Ok(Self { vertices })
    }

    pub fn from_points(points: &[[i64; 2]]) -> ZoneResult<Self> {
        Self::new(
            points
                .iter()
                .map(|&[x, y]| Point::new(x as f64, y as f64))
                .collect(),
        )
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Boundary-inclusive containment test.
    pub fn contains(&self, point: &Point) -> bool {
        point_in_polygon(point, &self.vertices)
    }

    /// Vertices as integer pairs (rounded), the zone file representation.
    pub fn to_file(&self) -> ZoneFile {
        ZoneFile {
            points: self
                .vertices
                .iter()
                .map(|v| [v.x.round() as i64, v.y.round() as i64])
                .collect(),
        }
    }

    /// Load a zone from a JSON zone file.
    pub fn load(path: &Path) -> ZoneResult<Self> {
        let file = File::open(path).map_err(|source| ZoneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: ZoneFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                ZoneError::Malformed {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        Self::from_points(&parsed.points)
    }

    /// Save the zone as a JSON zone file.
    pub fn save(&self, path: &Path) -> ZoneResult<()> {
        let file = File::create(path).map_err(|source| ZoneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.to_file()).map_err(|source| {
            ZoneError::Malformed {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.flush().map_err(|source| ZoneError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load an optional zone file, degrading every failure to "zone disabled".
pub fn load_optional(path: Option<&Path>, name: &str) -> Option<Zone> {
    let path = match path {
        Some(p) => p,
        None => {
            tracing::info!(zone = name, "no zone file configured, zone logic disabled");
            return None;
        }
    };
    match Zone::load(path) {
        Ok(zone) => {
            tracing::info!(
                zone = name,
                path = %path.display(),
                vertices = zone.vertices().len(),
                "zone loaded"
            );
            Some(zone)
        }
        Err(err) => {
            tracing::warn!(zone = name, "{err}; zone logic disabled");
            None
        }
    }
}

/// Keep only detections whose centroid lies in `zone`. No zone: pass-through.
pub fn filter_detections(detections: &[Detection], zone: Option<&Zone>) -> Vec<Detection> {
    match zone {
        Some(zone) => detections
            .iter()
            .filter(|d| zone.contains(&d.centroid))
            .cloned()
            .collect(),
        None => detections.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
