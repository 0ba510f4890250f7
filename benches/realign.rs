use criterion::{criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use realign::lowlevel::{nearest_two, ScalarL2};
use realign::{build_edge_overlay, DescriptorMatcher, FeatureExtractor, MatchConfig, OverlayConfig};
use std::hint::black_box;

const CELL: u32 = 12;

fn make_scene(width: u32, height: u32, shift_x: u32, shift_y: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let cx = (x + shift_x) / CELL;
        let cy = (y + shift_y) / CELL;
        let value = (((cx * 73) ^ (cy * 151) ^ (cx * cy * 17)) & 0xFF) as u8;
        Rgb([value, value.wrapping_add(40), value / 2])
    })
}

fn bench_pipeline(c: &mut Criterion) {
    let reference_img = make_scene(320, 240, 0, 0);
    let current_img = make_scene(320, 240, 6, 4);
    let extractor = FeatureExtractor::default();

    c.bench_function("extract_320x240", |b| {
        b.iter(|| black_box(extractor.extract(&reference_img).unwrap()));
    });

    c.bench_function("edge_overlay_320x240", |b| {
        b.iter(|| black_box(build_edge_overlay(&reference_img, &OverlayConfig::default())));
    });

    let reference = extractor.extract(&reference_img).unwrap();
    let current = extractor.extract(&current_img).unwrap();

    let matcher = DescriptorMatcher::default();
    c.bench_function("match_ratio_top10", |b| {
        b.iter(|| black_box(matcher.match_features(&reference, &current)));
    });

    if cfg!(feature = "rayon") {
        let matcher_par = DescriptorMatcher::new(MatchConfig {
            parallel: true,
            ..MatchConfig::default()
        })
        .unwrap();
        c.bench_function("match_ratio_top10_parallel", |b| {
            b.iter(|| black_box(matcher_par.match_features(&reference, &current)));
        });
    }

    if let Some(query) = reference.get(0) {
        c.bench_function("nearest_two_scalar", |b| {
            b.iter(|| {
                black_box(nearest_two::<ScalarL2>(
                    &query.descriptor,
                    current.features(),
                ))
            });
        });
    }
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
