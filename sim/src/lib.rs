//! `sim` — Street scenario simulator: scripted actors, a noisy detector, replay.

pub mod actor;
pub mod detector_sim;
pub mod replay;
pub mod scenarios;

pub use actor::{Actor, MotionSpec};
pub use detector_sim::{DetectorParams, DetectorSimulator};
pub use replay::{load_log, save_log, DetectionLog, ReplaySource};
pub use scenarios::{Scenario, ScenarioKind};
