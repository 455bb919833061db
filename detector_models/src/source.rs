//! The detection source seam: where per-frame detector output comes from.

use crate::raw::RawFrame;
use serde::{Deserialize, Serialize};
use tracker_core::types::FrameSize;

/// Stream properties reported by a source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Human-readable source name (file path, scenario name)
    pub name: String,
    /// Frame rate used to derive missing timestamps
    pub fps: f64,
    pub size: FrameSize,
}

/// Trait for anything that yields detector output frame by frame.
pub trait DetectionSource {
    /// Stream properties, available before the first frame
    fn info(&self) -> &SourceInfo;
    /// Next frame in stream order, `None` once exhausted
    fn next_frame(&mut self) -> Option<RawFrame>;
}
