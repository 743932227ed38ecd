use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use lapsync::playback::{compute_window, window::MAX_ZOOM};
use lapsync::telemetry::{distance_index, parse_telemetry_csv};
use lapsync::{align_window, process_lap};
use std::time::Duration;

fn create_lap_csv(points: usize) -> String {
    let mut raw =
        "LapDistPct,Lat,Lon,Brake,Throttle,RPM,SteeringWheelAngle,Speed,Gear\n".to_string();
    for i in 0..points {
        let pct = i as f64 / points as f64;
        let angle = pct * std::f64::consts::TAU;
        raw.push_str(&format!(
            "{:.6},{:.7},{:.7},{:.3},{:.3},{:.1},{:.3},{:.2},{}\n",
            pct,
            52.0 + angle.sin() * 0.01,
            4.5 + angle.cos() * 0.01,
            (angle * 3.).sin().max(0.),
            (angle * 3.).cos().max(0.),
            4000. + 3000. * pct,
            (angle * 5.).sin() * 0.4,
            30. + 40. * (angle * 2.).cos().abs(),
            2 + (i % 5),
        ));
    }
    raw
}

fn bench_lap_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("lap_processing");

    for points in [1_000, 10_000] {
        let raw = create_lap_csv(points);
        group.bench_with_input(BenchmarkId::new("parse_csv", points), &raw, |b, raw| {
            b.iter(|| black_box(parse_telemetry_csv(raw)));
        });
        group.bench_with_input(BenchmarkId::new("process_lap", points), &raw, |b, raw| {
            b.iter(|| black_box(process_lap(raw, 0)));
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance_lookup");

    let distances = (0..10_000).map(|i| i as f64 / 100.).collect::<Vec<_>>();
    group.bench_function("closest_index_binary", |b| {
        b.iter(|| black_box(distance_index::closest_index(&distances, black_box(42.424))));
    });
    group.bench_function("closest_index_linear", |b| {
        b.iter(|| {
            black_box(distance_index::closest_index_linear(
                &distances,
                black_box(42.424),
            ))
        });
    });

    group.finish();
}

fn bench_alignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("alignment");

    let reference = process_lap(&create_lap_csv(10_000), 0).unwrap();
    let others = (1..4)
        .map(|lane| {
            (
                format!("lap-{}", lane),
                process_lap(&create_lap_csv(8_000 + lane * 500), lane).unwrap(),
            )
        })
        .collect::<Vec<_>>();

    group.bench_function("align_window_4_laps", |b| {
        let window = compute_window(reference.total_points(), 5_000., MAX_ZOOM, 50).unwrap();
        b.iter(|| {
            black_box(align_window(
                "reference",
                &reference,
                &window,
                others.iter().map(|(id, lap)| (id.as_str(), lap)),
            ))
        });
    });

    group.bench_function("compute_window", |b| {
        b.iter(|| black_box(compute_window(10_000, black_box(5_000.), 3, 50)));
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets = bench_lap_processing, bench_lookup, bench_alignment
}
criterion_main!(benches);
