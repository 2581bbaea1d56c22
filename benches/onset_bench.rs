//! Performance benchmarks for onset detection and slicing

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slicer_dsp::{analyze_samples, OnsetDetector, OnsetMethod, SliceOptions};

/// Generate a synthetic drum loop with decaying noise bursts
fn generate_loop(num_samples: usize, hit_interval: usize) -> Vec<f64> {
    let mut samples = vec![0.0f64; num_samples];
    let mut pos = hit_interval;
    while pos < num_samples {
        for i in 0..1024.min(num_samples - pos) {
            let noise = (((pos + i) as u64).wrapping_mul(2654435761) % 8191) as f64 / 8191.0 - 0.5;
            samples[pos + i] = 0.9 * noise * (-(i as f64) / 200.0).exp();
        }
        pos += hit_interval;
    }
    samples
}

fn detector_benchmarks(c: &mut Criterion) {
    let hop = 256;
    let audio = generate_loop(44100 * 4, 11025);

    let mut group = c.benchmark_group("detector");

    for method in [OnsetMethod::Hfc, OnsetMethod::Complex, OnsetMethod::SpecFlux] {
        group.bench_function(format!("process_4s_{}", method.as_str()), |b| {
            b.iter(|| {
                let mut detector = OnsetDetector::new(method, 512, hop, 44100).unwrap();
                detector.set_threshold(0.02);
                let mut count = 0;
                let mut pos = 0;
                while pos + hop <= audio.len() {
                    if detector.process(black_box(&audio[pos..pos + hop])) {
                        count += 1;
                    }
                    pos += hop;
                }
                black_box(count)
            });
        });
    }

    group.finish();
}

fn analyzer_benchmarks(c: &mut Criterion) {
    let audio = generate_loop(44100 * 4, 11025);

    let mut group = c.benchmark_group("analyzer");
    group.sample_size(20);

    group.bench_function("analyze_4s_hfc", |b| {
        b.iter(|| {
            let options = SliceOptions::default();
            analyze_samples(black_box(&audio), 44100, &options).unwrap()
        });
    });

    group.bench_function("analyze_4s_consensus", |b| {
        b.iter(|| {
            let options = SliceOptions {
                method: "consensus".to_string(),
                ..Default::default()
            };
            analyze_samples(black_box(&audio), 44100, &options).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, detector_benchmarks, analyzer_benchmarks);
criterion_main!(benches);
