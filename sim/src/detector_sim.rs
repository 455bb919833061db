//! Detector simulator.
//!
//! Turns true actor positions into per-frame raw boxes with:
//! - Uniform centre jitter
//! - Miss probability (1 - p_detection)
//! - Poisson clutter (false boxes)
//! - Occasional malformed boxes, to exercise the per-box skip path

use crate::actor::Actor;
use detector_models::raw::{RawBox, RawFrame};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracker_core::types::FrameSize;

/// Labels drawn for clutter boxes.
const CLUTTER_LABELS: [&str; 4] = ["car", "person", "bench", "traffic light"];

/// Noise characteristics of the simulated detector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Probability an active actor is detected in a frame
    pub p_detection: f64,
    /// Max centre jitter per axis (pixels)
    pub jitter_px: f64,
    /// Confidence range for true detections
    pub confidence: [f64; 2],
    /// Mean number of false boxes per frame
    pub clutter_rate: f64,
    /// Clutter confidences are drawn from [0, clutter_max_confidence]
    pub clutter_max_confidence: f64,
    /// Probability of appending one malformed box to a frame
    pub malformed_rate: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            p_detection: 0.95,
            jitter_px: 3.0,
            confidence: [0.55, 0.95],
            clutter_rate: 0.2,
            clutter_max_confidence: 0.35,
            malformed_rate: 0.01,
        }
    }
}

/// Generates raw detector frames from a set of actors.
pub struct DetectorSimulator {
    pub params: DetectorParams,
    size: FrameSize,
    rng: ChaCha8Rng,
}

impl DetectorSimulator {
    pub fn new(params: DetectorParams, size: FrameSize, seed: u64) -> Self {
        Self {
            params,
            size,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Detector output for one frame at stream time `t`.
    pub fn detect(&mut self, actors: &[Actor], index: u64, t: f64) -> RawFrame {
        let mut boxes = Vec::new();

        for actor in actors {
            if !actor.is_active(t) || !self.in_frame(actor.position) {
                continue;
            }
            // Miss detection?
            if self.rng.gen::<f64>() > self.params.p_detection {
                continue;
            }
            let j = self.params.jitter_px;
            let dx = self.rng.gen::<f64>() * j * 2.0 - j;
            let dy = self.rng.gen::<f64>() * j * 2.0 - j;
            let [x1, y1, x2, y2] = actor.bbox();
            let [c_lo, c_hi] = self.params.confidence;
            let confidence = c_lo + self.rng.gen::<f64>() * (c_hi - c_lo);
            boxes.push(RawBox::labelled(
                &actor.label,
                round2(confidence),
                [x1 + dx, y1 + dy, x2 + dx, y2 + dy].map(f64::round),
            ));
        }

        // Clutter: Poisson sample by multiplying uniforms until below e^{-lambda}
        let lambda = self.params.clutter_rate;
        let n_clutter = if lambda <= 0.0 {
            0usize
        } else {
            let mut n = 0usize;
            let threshold = (-lambda).exp();
            let mut prod = self.rng.gen::<f64>();
            while prod > threshold && n < 20 {
                prod *= self.rng.gen::<f64>();
                n += 1;
            }
            n
        };
        for _ in 0..n_clutter {
            let w = self.size.width as f64;
            let h = self.size.height as f64;
            let cx = self.rng.gen::<f64>() * w;
            let cy = self.rng.gen::<f64>() * h;
            let label = CLUTTER_LABELS[self.rng.gen_range(0..CLUTTER_LABELS.len())];
            let confidence = self.rng.gen::<f64>() * self.params.clutter_max_confidence;
            boxes.push(RawBox::labelled(
                label,
                round2(confidence),
                [cx - 15.0, cy - 15.0, cx + 15.0, cy + 15.0].map(f64::round),
            ));
        }

        if self.rng.gen::<f64>() < self.params.malformed_rate {
            boxes.push(RawBox {
                label: Some("car".to_string()),
                confidence: Some(0.9),
                bbox: Some(vec![10.0, 10.0]),
                ..Default::default()
            });
        }

        RawFrame {
            index,
            timestamp: Some(t),
            boxes,
        }
    }

    fn in_frame(&self, [x, y]: [f64; 2]) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.size.width as f64 && y < self.size.height as f64
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::MotionSpec;

    fn perfect() -> DetectorParams {
        DetectorParams {
            p_detection: 1.0,
            jitter_px: 0.0,
            clutter_rate: 0.0,
            malformed_rate: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn perfect_detector_reports_true_boxes() {
        let actors = vec![Actor::new(0, "car", [100.0, 200.0], [40.0, 20.0], MotionSpec::Stationary)];
        let mut sim = DetectorSimulator::new(perfect(), FrameSize::default(), 1);
        let frame = sim.detect(&actors, 3, 0.12);
        assert_eq!(frame.boxes.len(), 1);
        assert_eq!(frame.boxes[0].bbox, Some(vec![80.0, 190.0, 120.0, 210.0]));
        assert_eq!(frame.timestamp, Some(0.12));
    }

    #[test]
    fn same_seed_same_output() {
        let actors = vec![Actor::new(0, "person", [50.0, 50.0], [20.0, 40.0], MotionSpec::Stationary)];
        let mut a = DetectorSimulator::new(DetectorParams::default(), FrameSize::default(), 7);
        let mut b = DetectorSimulator::new(DetectorParams::default(), FrameSize::default(), 7);
        for i in 0..20 {
            assert_eq!(a.detect(&actors, i, i as f64), b.detect(&actors, i, i as f64));
        }
    }

    #[test]
    fn inactive_actors_are_not_detected() {
        let actors = vec![Actor::new(0, "car", [0.0, 0.0], [10.0, 10.0], MotionSpec::Stationary)
            .active_between(Some(5.0), None)];
        let mut sim = DetectorSimulator::new(perfect(), FrameSize::default(), 1);
        assert!(sim.detect(&actors, 0, 0.0).boxes.is_empty());
        assert_eq!(sim.detect(&actors, 1, 5.0).boxes.len(), 1);
    }
}
