// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the scan degradation pipeline in docforge-document.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{GrayImage, Luma};

use docforge_core::ScanConfig;
use docforge_document::{DegradationPlan, ImageProcessor};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Synthetic page: white background with dark horizontal "text" bands.
fn page(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |_, y| {
        if y % 40 < 12 { Luma([20u8]) } else { Luma([255u8]) }
    })
}

/// The full hard-profile chain on an A5 page rendered at 200 DPI.
fn bench_hard_profile(c: &mut Criterion) {
    let config = ScanConfig::default();
    let plan = DegradationPlan::sample(&config, "doc_bench");
    let clean = page(1165, 1654);

    c.bench_function("hard_profile (A5 @ 200dpi)", |b| {
        b.iter(|| {
            let jpeg = ImageProcessor::from_gray(black_box(clean.clone()))
                .rotate(plan.rotation_degrees)
                .add_gaussian_noise(plan.noise_stddev, plan.seed)
                .adjust_contrast(plan.contrast_factor)
                .resample(200, plan.target_dpi)
                .to_jpeg_bytes(plan.jpeg_quality);
            black_box(jpeg.ok());
        });
    });
}

fn bench_plan_sampling(c: &mut Criterion) {
    let config = ScanConfig::default();
    c.bench_function("degradation_plan", |b| {
        b.iter(|| black_box(DegradationPlan::sample(&config, black_box("doc_042"))));
    });
}

criterion_group!(benches, bench_hard_profile, bench_plan_sampling);
criterion_main!(benches);
