//! Drives one analysis run: detection log in, annotation log and summary out.

use crate::{
    annotate::AnnotationWriter,
    args::ZoneArgs,
    error::FatalError,
    report::{RunSummary, ZoneFlags},
};
use anyhow::Context;
use detector_models::source::DetectionSource;
use rayon::prelude::*;
use sim::{
    replay::{load_log, save_log, DetectionLog, ReplaySource},
    scenarios::{Scenario, ScenarioKind},
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracker_core::{
    pipeline::{Pipeline, PipelineConfig, Zones},
    zone::load_optional,
};

/// Frame rate assumed when a log carries none usable.
const FALLBACK_FPS: f64 = 25.0;

pub fn open_log(path: &Path) -> Result<DetectionLog, FatalError> {
    load_log(path).map_err(FatalError::OpenInput)
}

pub fn load_zones(args: &ZoneArgs) -> Zones {
    Zones {
        parking: load_optional(args.parking_zone.as_deref(), "parking"),
        crowd: load_optional(args.crowd_zone.as_deref(), "crowd"),
    }
}

/// Analyze a whole detection log.
///
/// The annotation log is created before the first frame is processed.
pub fn analyze(
    log: DetectionLog,
    input: &str,
    output: Option<&Path>,
    zones: Zones,
    config: PipelineConfig,
) -> Result<RunSummary, FatalError> {
    let mut annotations = match output {
        Some(path) => Some(AnnotationWriter::create(path).map_err(|source| {
            FatalError::OpenOutput {
                path: path.to_path_buf(),
                source,
            }
        })?),
        None => None,
    };

    let fps = if log.fps.is_finite() && log.fps > 0.0 {
        log.fps
    } else {
        tracing::warn!(fps = log.fps, "unusable frame rate in log, assuming {FALLBACK_FPS}");
        FALLBACK_FPS
    };
    if !log.has_resolution() {
        let size = log.size();
        tracing::warn!(
            width = ?log.width,
            height = ?log.height,
            "unusable resolution in log, assuming {}x{}",
            size.width,
            size.height
        );
    }
    let mut source = ReplaySource::new(log);
    let size = source.info().size;
    let flags = ZoneFlags::from(&zones);
    tracing::info!(
        input,
        fps,
        width = size.width,
        height = size.height,
        mode = ?config.parking_mode,
        parking_zone = flags.parking,
        crowd_zone = flags.crowd,
        "analysis started"
    );

    let start = Instant::now();
    let mut pipeline = Pipeline::new(config.clone(), zones, size);
    while let Some(raw) = source.next_frame() {
        let annotated = pipeline.process_frame(&raw.parse(fps));
        if let Some(writer) = annotations.as_mut() {
            writer
                .write_record(&annotated)
                .with_context(|| format!("writing annotation for frame {}", annotated.frame))
                .map_err(FatalError::Runtime)?;
        }
    }
    if let Some(writer) = annotations {
        let records = writer
            .finish()
            .context("flushing annotation log")
            .map_err(FatalError::Runtime)?;
        tracing::debug!(records, "annotation log written");
    }
    let stats = pipeline.finish();
    let elapsed = start.elapsed().as_secs_f64();

    tracing::info!(
        frames = stats.frames_processed,
        illegal_parking = stats.illegal_parking_count(),
        crowding = stats.crowding_event_count(),
        skipped_tracks = stats.skipped_tracks,
        elapsed_s = elapsed,
        "analysis finished"
    );

    Ok(RunSummary {
        input: input.to_string(),
        output: output.map(|p| p.display().to_string()),
        frame_count_processed: stats.frames_processed,
        fps_used: fps,
        resolution: size,
        vehicle_detections_total: stats.vehicle_detections_total,
        illegal_parking_count: stats.illegal_parking_count(),
        crowding_event_count: stats.crowding_event_count(),
        max_people_detected: stats.max_people_detected,
        tracks_created: stats.tracks_created,
        zones: flags,
        parking_mode: config.parking_mode,
        config,
        issues: stats.events,
        processing_time_seconds: elapsed,
    })
}

/// Load and analyze one log file.
pub fn analyze_file(
    input: &Path,
    output: Option<&Path>,
    zones: Zones,
    config: PipelineConfig,
) -> Result<RunSummary, FatalError> {
    let log = open_log(input)?;
    analyze(log, &input.display().to_string(), output, zones, config)
}

/// Analyze independent logs in parallel. Results keep the input order.
pub fn analyze_batch(
    inputs: &[PathBuf],
    output_dir: &Path,
    zones: &Zones,
    config: &PipelineConfig,
) -> Result<Vec<Result<RunSummary, FatalError>>, FatalError> {
    std::fs::create_dir_all(output_dir).map_err(|source| FatalError::OpenOutput {
        path: output_dir.to_path_buf(),
        source,
    })?;
    tracing::info!(runs = inputs.len(), dir = %output_dir.display(), "batch started");

    Ok(inputs
        .par_iter()
        .enumerate()
        .map(|(i, input)| {
            let output = output_dir.join(annotation_file_name(i, input));
            analyze_file(input, Some(&output), zones.clone(), config.clone())
        })
        .collect())
}

/// `<position>-<input stem>.jsonl`; the position keeps equal stems apart.
fn annotation_file_name(position: usize, input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string());
    format!("{position}-{stem}.jsonl")
}

/// Options of a simulated run.
#[derive(Debug, Default)]
pub struct ScenarioRun<'a> {
    pub output: Option<&'a Path>,
    pub save_replay: Option<&'a Path>,
    pub export_zones: Option<&'a Path>,
}

/// Synthesize a detection log for `kind`, then analyze it with the
/// scenario's own zones.
pub fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    run: ScenarioRun<'_>,
    config: PipelineConfig,
) -> Result<RunSummary, FatalError> {
    let scenario = Scenario::build(kind, seed);
    let log = scenario.record();
    tracing::info!(
        scenario = %scenario.name,
        seed,
        frames = log.frames.len(),
        actors = scenario.actors.len(),
        "scenario synthesized"
    );

    if let Some(path) = run.save_replay {
        save_log(&log, path).map_err(FatalError::Runtime)?;
        tracing::info!(path = %path.display(), "detection log saved");
    }
    if let Some(dir) = run.export_zones {
        export_zones(&scenario, dir).map_err(FatalError::Runtime)?;
    }

    let input = log.source.clone();
    analyze(log, &input, run.output, scenario.zones(), config)
}

fn export_zones(scenario: &Scenario, dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let zones = scenario.zones();
    for (name, zone) in [("parking", &zones.parking), ("crowd", &zones.crowd)] {
        if let Some(zone) = zone {
            let path = dir.join(format!("{name}_zone.json"));
            zone.save(&path)?;
            tracing::info!(zone = name, path = %path.display(), "zone exported");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use detector_models::raw::{RawBox, RawFrame};
    use tracker_core::{types::FrameSize, zone::Zone};

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("curbwatch_{}_{name}", std::process::id()))
    }

    /// A car standing still in the lower half for `frames` frames at 10 fps.
    fn parked_log(frames: u64) -> DetectionLog {
        DetectionLog {
            source: "test".into(),
            seed: None,
            fps: 10.0,
            width: Some(640),
            height: Some(480),
            frames: (0..frames)
                .map(|index| RawFrame {
                    index,
                    timestamp: None,
                    boxes: vec![
                        RawBox::labelled("car", 0.9, [80.0, 380.0, 120.0, 420.0]),
                        RawBox::labelled("person", 0.8, [300.0, 100.0, 320.0, 150.0]),
                        RawBox::labelled("truck", 0.1, [0.0, 0.0, 10.0, 10.0]),
                    ],
                })
                .collect(),
        }
    }

    fn lower_half() -> Zones {
        Zones {
            parking: Zone::from_points(&[[0, 240], [640, 240], [640, 480], [0, 480]]).ok(),
            crowd: None,
        }
    }

    #[test]
    fn analyze_reports_parking_and_writes_one_record_per_frame() {
        let out = scratch("annotations.jsonl");
        let summary = analyze(
            parked_log(40),
            "test.json",
            Some(&out),
            lower_half(),
            PipelineConfig::default(),
        )
        .unwrap();

        assert_eq!(summary.frame_count_processed, 40);
        assert_eq!(summary.vehicle_detections_total, 40);
        assert_eq!(summary.illegal_parking_count, 1);
        assert_eq!(summary.crowding_event_count, 0);
        assert_eq!(summary.tracks_created, 1);
        assert_eq!(summary.max_people_detected, 1);
        assert_relative_eq!(summary.fps_used, 10.0);
        assert_eq!(summary.zones, ZoneFlags { parking: true, crowd: false });

        let text = std::fs::read_to_string(&out).unwrap();
        std::fs::remove_file(&out).ok();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 40);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["frame"], 0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["issues"][0]["type"], "illegal_parking");
        assert_eq!(json["parking_mode"], "tracked");
        assert_eq!(json["resolution"]["width"], 640);
    }

    #[test]
    fn missing_fps_falls_back() {
        let mut log = parked_log(3);
        log.fps = 0.0;
        let summary = analyze(log, "x", None, Zones::default(), PipelineConfig::default()).unwrap();
        assert_eq!(summary.fps_used, FALLBACK_FPS);
        assert_eq!(summary.output, None);
    }

    #[test]
    fn log_without_resolution_still_runs() {
        let path = scratch("no_resolution.json");
        std::fs::write(
            &path,
            r#"{"source": "cam", "fps": 10.0, "frames": [{"index": 0, "boxes": []}]}"#,
        )
        .unwrap();
        let summary =
            analyze_file(&path, None, Zones::default(), PipelineConfig::default()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(summary.resolution, FrameSize::default());
        assert_eq!(summary.frame_count_processed, 1);
    }

    #[test]
    fn missing_input_is_fatal() {
        let err = analyze_file(
            Path::new("/no/such/detections.json"),
            None,
            Zones::default(),
            PipelineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.reason(), "failed_to_open_input");
    }

    #[test]
    fn unwritable_output_is_fatal() {
        let err = analyze(
            parked_log(5),
            "x",
            Some(Path::new("/no/such/dir/out.jsonl")),
            Zones::default(),
            PipelineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.reason(), "failed_to_open_output");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn batch_keeps_input_order_and_isolates_failures() {
        let dir = scratch("batch");
        let good = scratch("good.json");
        save_log(&parked_log(30), &good).unwrap();
        let inputs = vec![good.clone(), PathBuf::from("/no/such/log.json"), good.clone()];

        let results =
            analyze_batch(&inputs, &dir, &lower_half(), &PipelineConfig::default()).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1].as_ref().err().map(|e| e.reason()),
            Some("failed_to_open_input")
        );
        assert_eq!(results[2].as_ref().unwrap().illegal_parking_count, 1);
        assert!(dir.join(annotation_file_name(0, &good)).exists());
        assert!(dir.join(annotation_file_name(2, &good)).exists());

        std::fs::remove_file(&good).ok();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn annotation_names_are_unique_per_position() {
        let a = annotation_file_name(0, Path::new("/a/street.json"));
        let b = annotation_file_name(1, Path::new("/b/street.json"));
        assert_eq!(a, "0-street.jsonl");
        assert_ne!(a, b);
    }

    #[test]
    fn scenario_run_exports_loadable_zones() {
        let dir = scratch("zones");
        let replay = scratch("replay.json");
        let summary = run_scenario(
            ScenarioKind::ParkedCar,
            42,
            ScenarioRun {
                output: None,
                save_replay: Some(&replay),
                export_zones: Some(&dir),
            },
            PipelineConfig::default(),
        )
        .unwrap();
        assert_eq!(summary.input, "scenario:parked_car");
        assert!(summary.zones.parking);

        let parking = Zone::load(&dir.join("parking_zone.json")).unwrap();
        assert!(parking.vertices().len() >= 3);
        assert!(Zone::load(&dir.join("crowd_zone.json")).is_ok());
        assert_eq!(load_log(&replay).unwrap().frames.len(), 200);

        std::fs::remove_file(&replay).ok();
        std::fs::remove_dir_all(&dir).ok();
    }
}
