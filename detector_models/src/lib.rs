//! `detector_models` — Detector collaborator interface: raw boxes, labels, sources.

pub mod labels;
pub mod raw;
pub mod source;

pub use labels::{label_for_class, COCO_NAMES};
pub use raw::{BoxError, RawBox, RawFrame};
pub use source::{DetectionSource, SourceInfo};
