use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tracker_core::pipeline::{Pipeline, PipelineConfig, Zones};
use tracker_core::types::{BBox, Detection, Frame, FrameSize};
use tracker_core::zone::Zone;

fn make_frame(n: usize, index: u64) -> Frame {
    let detections = (0..n)
        .map(|i| {
            let label = if i % 3 == 0 { "person" } else { "car" };
            let cx = 20.0 + (i % 40) as f64 * 45.0 + index as f64 * 0.5;
            let cy = 20.0 + (i / 40) as f64 * 45.0;
            Detection::new(
                label,
                0.9,
                BBox::from_corners(cx - 15.0, cy - 10.0, cx + 15.0, cy + 10.0),
            )
        })
        .collect();
    Frame {
        index,
        timestamp: index as f64 / 25.0,
        detections,
    }
}

fn full_frame_zones() -> Zones {
    let whole = Zone::from_points(&[[0, 0], [1920, 0], [1920, 1080], [0, 1080]]).ok();
    Zones {
        parking: whole.clone(),
        crowd: whole,
    }
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let size = FrameSize {
        width: 1920,
        height: 1080,
    };

    for n in [10, 50, 200, 800] {
        group.bench_function(format!("{n}_detections"), |b| {
            b.iter(|| {
                let mut pipeline = Pipeline::new(PipelineConfig::default(), full_frame_zones(), size);
                // Warm up with one frame to create tracks
                pipeline.process_frame(&make_frame(n, 0));
                // Measure a frame with established tracks
                let frame = make_frame(n, 1);
                black_box(pipeline.process_frame(&frame));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
