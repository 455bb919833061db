//! Command-line arguments shared by the subcommands.

use crate::error::FatalError;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use tracker_core::pipeline::{ParkingMode, PipelineConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Per-track dwell time
    Tracked,
    /// Per-cell sighting counts, no tracking
    Grid,
}

impl From<ModeArg> for ParkingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Tracked => ParkingMode::Tracked,
            ModeArg::Grid => ParkingMode::Grid,
        }
    }
}

/// Zone polygon files. A missing or unusable file disables that zone.
#[derive(Clone, Debug, Default, Args)]
pub struct ZoneArgs {
    #[arg(long)]
    pub parking_zone: Option<PathBuf>,
    #[arg(long)]
    pub crowd_zone: Option<PathBuf>,
}

/// Threshold overrides; anything left out keeps its default.
#[derive(Clone, Debug, Default, Args)]
pub struct ThresholdArgs {
    /// Minimum detector confidence
    #[arg(long)]
    pub confidence: Option<f64>,
    /// Frames a track must be seen before dwell accounting starts
    #[arg(long)]
    pub min_seen_frames: Option<u32>,
    /// Stationary seconds before a vehicle counts as illegally parked
    #[arg(long)]
    pub parking_time: Option<f64>,
    /// Per-frame movement (pixels) still counted as stationary
    #[arg(long)]
    pub movement_threshold: Option<f64>,
    /// People in the crowd zone that make a crowd
    #[arg(long)]
    pub crowd_count: Option<usize>,
    /// Seconds a crowd must persist before it is reported
    #[arg(long)]
    pub crowd_time: Option<f64>,
    /// Consecutive missed frames before a track is retired
    #[arg(long)]
    pub max_disappeared: Option<u32>,
    /// Max centroid jump (pixels) for a track match
    #[arg(long)]
    pub max_distance: Option<f64>,
    #[arg(long, value_enum)]
    pub parking_mode: Option<ModeArg>,
    /// Grid mode: band start as a fraction of frame height
    #[arg(long)]
    pub roi_fraction: Option<f64>,
    /// Grid mode: sightings in one cell that make a parked vehicle
    #[arg(long)]
    pub stay_frames: Option<u32>,
}

impl ThresholdArgs {
    /// Apply the overrides to the defaults and validate the result.
    pub fn to_config(&self) -> Result<PipelineConfig, FatalError> {
        let mut config = PipelineConfig::default();
        if let Some(v) = self.confidence {
            config.confidence_threshold = v;
        }
        if let Some(v) = self.min_seen_frames {
            config.parking.min_seen_frames = v;
        }
        if let Some(v) = self.parking_time {
            config.parking.parking_time_threshold = v;
        }
        if let Some(v) = self.movement_threshold {
            config.parking.movement_threshold = v;
        }
        if let Some(v) = self.crowd_count {
            config.crowd.count_threshold = v;
        }
        if let Some(v) = self.crowd_time {
            config.crowd.time_threshold = v;
        }
        if let Some(v) = self.max_disappeared {
            config.tracker.max_disappeared = v;
        }
        if let Some(v) = self.max_distance {
            config.tracker.max_distance = v;
        }
        if let Some(v) = self.parking_mode {
            config.parking_mode = v.into();
        }
        if let Some(v) = self.roi_fraction {
            config.grid.roi_fraction = v;
        }
        if let Some(v) = self.stay_frames {
            config.grid.stay_frames_threshold = v;
        }
        validate(&config).map_err(FatalError::InvalidConfig)?;
        Ok(config)
    }
}

fn validate(config: &PipelineConfig) -> Result<(), String> {
    let unit = |name: &str, v: f64| {
        if (0.0..=1.0).contains(&v) {
            Ok(())
        } else {
            Err(format!("{name} must be within [0, 1], got {v}"))
        }
    };
    let non_negative = |name: &str, v: f64| {
        if v.is_finite() && v >= 0.0 {
            Ok(())
        } else {
            Err(format!("{name} must be a non-negative number, got {v}"))
        }
    };
    unit("confidence", config.confidence_threshold)?;
    unit("roi-fraction", config.grid.roi_fraction)?;
    non_negative("parking-time", config.parking.parking_time_threshold)?;
    non_negative("movement-threshold", config.parking.movement_threshold)?;
    non_negative("crowd-time", config.crowd.time_threshold)?;
    non_negative("max-distance", config.tracker.max_distance)?;
    if config.crowd.count_threshold == 0 {
        return Err("crowd-count must be at least 1".to_string());
    }
    if config.grid.stay_frames_threshold == 0 {
        return Err("stay-frames must be at least 1".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_overrides_gives_defaults() {
        let config = ThresholdArgs::default().to_config().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn overrides_land_in_the_right_component() {
        let args = ThresholdArgs {
            confidence: Some(0.5),
            parking_time: Some(30.0),
            crowd_count: Some(8),
            max_disappeared: Some(10),
            parking_mode: Some(ModeArg::Grid),
            stay_frames: Some(12),
            ..Default::default()
        };
        let config = args.to_config().unwrap();
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.parking.parking_time_threshold, 30.0);
        assert_eq!(config.crowd.count_threshold, 8);
        assert_eq!(config.tracker.max_disappeared, 10);
        assert_eq!(config.parking_mode, ParkingMode::Grid);
        assert_eq!(config.grid.stay_frames_threshold, 12);
        assert_eq!(config.parking.min_seen_frames, 3);
    }

    #[test]
    fn out_of_range_values_are_invalid_config() {
        for args in [
            ThresholdArgs {
                confidence: Some(1.5),
                ..Default::default()
            },
            ThresholdArgs {
                parking_time: Some(-1.0),
                ..Default::default()
            },
            ThresholdArgs {
                crowd_count: Some(0),
                ..Default::default()
            },
            ThresholdArgs {
                max_distance: Some(f64::NAN),
                ..Default::default()
            },
        ] {
            let err = args.to_config().unwrap_err();
            assert_eq!(err.reason(), "invalid_config");
        }
    }
}
