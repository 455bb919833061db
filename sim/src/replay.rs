//! Replay: serialize/deserialize detection logs and play them back as a source.

use anyhow::Context;
use detector_models::{
    raw::RawFrame,
    source::{DetectionSource, SourceInfo},
};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracker_core::types::FrameSize;

/// A full recorded detector run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionLog {
    /// Where the detections came from (video path, scenario name)
    pub source: String,
    /// Simulator seed, for synthesized logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Frame resolution; absent or zero falls back to 640×480
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// All frames in stream order
    pub frames: Vec<RawFrame>,
}

fn default_fps() -> f64 {
    25.0
}

impl DetectionLog {
    /// True when the log states a usable resolution.
    pub fn has_resolution(&self) -> bool {
        matches!((self.width, self.height), (Some(w), Some(h)) if w > 0 && h > 0)
    }

    pub fn size(&self) -> FrameSize {
        let fallback = FrameSize::default();
        FrameSize {
            width: self.width.filter(|&w| w > 0).unwrap_or(fallback.width),
            height: self.height.filter(|&h| h > 0).unwrap_or(fallback.height),
        }
    }

    pub fn info(&self) -> SourceInfo {
        SourceInfo {
            name: self.source.clone(),
            fps: self.fps,
            size: self.size(),
        }
    }
}

/// Save a detection log to a JSON file.
pub fn save_log(log: &DetectionLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, log)?;
    writer
        .flush()
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

/// Load a detection log from a JSON file.
pub fn load_log(path: &Path) -> anyhow::Result<DetectionLog> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    let reader = BufReader::new(file);
    let log: DetectionLog = serde_json::from_reader(reader)
        .with_context(|| format!("{} is not a detection log", path.display()))?;
    Ok(log)
}

/// Plays a [`DetectionLog`] back frame by frame.
pub struct ReplaySource {
    info: SourceInfo,
    frames: std::vec::IntoIter<RawFrame>,
}

impl ReplaySource {
    pub fn new(log: DetectionLog) -> Self {
        Self {
            info: log.info(),
            frames: log.frames.into_iter(),
        }
    }
}

impl DetectionSource for ReplaySource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Option<RawFrame> {
        self.frames.next()
    }
}
