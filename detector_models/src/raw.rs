//! Raw detector output and its fallible conversion into [`Detection`]s.
//!
//! # Box schema
//! `{"label": "car", "class_id": 2, "confidence": 0.87, "bbox": [x1, y1, x2, y2]}`
//!
//! Every field is optional at the schema level so that one bad box never
//! fails a whole frame. `label` wins over `class_id` when both are given.

use crate::labels::label_for_class;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracker_core::types::{BBox, Detection, Frame};

/// Why a raw box could not be turned into a detection.
#[derive(Debug, Error, PartialEq)]
pub enum BoxError {
    #[error("box has no bbox")]
    MissingBBox,
    #[error("bbox needs 4 coordinates, got {0}")]
    BadBBoxLen(usize),
    #[error("bbox has non-finite coordinates")]
    NonFiniteBBox,
    #[error("box has neither a label nor a class id")]
    MissingLabel,
    #[error("class id {0} is not a known class")]
    UnknownClass(i64),
    #[error("box has no confidence")]
    MissingConfidence,
    #[error("confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

/// One box as reported by the detector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
}

impl RawBox {
    /// Convenience constructor for a well-formed box.
    pub fn labelled(label: &str, confidence: f64, bbox: [f64; 4]) -> Self {
        Self {
            label: Some(label.to_string()),
            class_id: None,
            confidence: Some(confidence),
            bbox: Some(bbox.to_vec()),
        }
    }

    pub fn parse(&self) -> Result<Detection, BoxError> {
        let coords = self.bbox.as_ref().ok_or(BoxError::MissingBBox)?;
        let [x1, y1, x2, y2] = <[f64; 4]>::try_from(coords.as_slice())
            .map_err(|_| BoxError::BadBBoxLen(coords.len()))?;
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(BoxError::NonFiniteBBox);
        }

        let label = match (&self.label, self.class_id) {
            (Some(label), _) => label.clone(),
            (None, Some(id)) => label_for_class(id)
                .ok_or(BoxError::UnknownClass(id))?
                .to_string(),
            (None, None) => return Err(BoxError::MissingLabel),
        };

        let confidence = self.confidence.ok_or(BoxError::MissingConfidence)?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(BoxError::ConfidenceOutOfRange(confidence));
        }

        Ok(Detection::new(
            label,
            confidence,
            BBox::from_corners(x1, y1, x2, y2),
        ))
    }
}

/// All raw boxes of one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    pub index: u64,
    /// Stream time in seconds; derived from the frame rate when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub boxes: Vec<RawBox>,
}

impl RawFrame {
    /// Parse every box, skipping the ones that fail.
    pub fn parse(&self, fps: f64) -> Frame {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| if fps > 0.0 { self.index as f64 / fps } else { 0.0 });
        let detections = self
            .boxes
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| match raw.parse() {
                Ok(det) => Some(det),
                Err(err) => {
                    tracing::debug!(frame = self.index, box_index = i, "skipping box: {err}");
                    None
                }
            })
            .collect();
        Frame {
            index: self.index,
            timestamp,
            detections,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::types::ObjectCategory;

    #[test]
    fn parses_label_and_normalises_box() {
        let det = RawBox::labelled("bus", 0.7, [50.0, 60.0, 10.0, 20.0]).parse().unwrap();
        assert_eq!(det.category, ObjectCategory::Vehicle);
        assert_eq!(det.bbox.to_array(), [10.0, 20.0, 50.0, 60.0]);
        assert_eq!(det.centroid.x, 30.0);
    }

    #[test]
    fn class_id_resolves_through_coco() {
        let raw: RawBox =
            serde_json::from_str(r#"{"class_id": 0, "confidence": 0.5, "bbox": [0, 0, 4, 8]}"#)
                .unwrap();
        assert_eq!(raw.parse().unwrap().label, "person");
    }

    #[test]
    fn malformed_boxes_report_why() {
        let mut raw = RawBox::labelled("car", 0.5, [0.0, 0.0, 1.0, 1.0]);
        raw.bbox = Some(vec![1.0, 2.0, 3.0]);
        assert_eq!(raw.parse(), Err(BoxError::BadBBoxLen(3)));

        let raw = RawBox {
            confidence: Some(0.5),
            bbox: Some(vec![0.0, 0.0, 1.0, 1.0]),
            ..Default::default()
        };
        assert_eq!(raw.parse(), Err(BoxError::MissingLabel));

        let raw = RawBox {
            class_id: Some(99),
            confidence: Some(0.5),
            bbox: Some(vec![0.0, 0.0, 1.0, 1.0]),
            ..Default::default()
        };
        assert_eq!(raw.parse(), Err(BoxError::UnknownClass(99)));

        let raw = RawBox::labelled("car", 1.5, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(raw.parse(), Err(BoxError::ConfidenceOutOfRange(1.5)));
    }

    #[test]
    fn bad_box_is_skipped_not_fatal() {
        let frame: RawFrame = serde_json::from_str(
            r#"{"index": 8, "boxes": [
                {"label": "car", "confidence": 0.9, "bbox": [0, 0, 10, 10]},
                {"label": "car", "confidence": 0.9},
                {"label": "person", "confidence": 0.6, "bbox": [5, 5, 9, 20]}
            ]}"#,
        )
        .unwrap();
        let parsed = frame.parse(4.0);
        assert_eq!(parsed.detections.len(), 2);
        assert_eq!(parsed.timestamp, 2.0);
    }
}
