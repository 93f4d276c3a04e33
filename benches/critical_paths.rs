//! Criterion benchmarks for charagen critical paths
//!
//! Benchmarks the per-generation hot spots:
//! - Selection: weighted index picks
//! - Color: hue rotation of a full sprite
//! - Outline: silhouette synthesis
//! - Compositing: layer stacking and presentation

use charagen::assets::LayerImages;
use charagen::catalog::{Catalogs, Layer};
use charagen::color::rotate_hue;
use charagen::composition::{compose_sprite, SPRITE_SIZE};
use charagen::generator::CharacterSelector;
use charagen::outline::synthesize_outline;
use charagen::output::{present, Presentation};
use charagen::rarity::GradeTable;
use charagen::select::pick_index;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{Rgba, RgbaImage};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::sync::Arc;

/// A sprite with a filled ellipse, roughly the coverage of a character.
fn make_blob(size: u32, color: Rgba<u8>) -> RgbaImage {
    let c = size as f64 / 2.0;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = (x as f64 - c) / (c * 0.7);
        let dy = (y as f64 - c) / (c * 0.9);
        if dx * dx + dy * dy <= 1.0 {
            color
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn make_layers() -> LayerImages {
    let mut images = LayerImages::default();
    for (i, layer) in Layer::ALL.iter().enumerate() {
        let shade = 60 + i as u8 * 40;
        images.set(*layer, Some(Arc::new(make_blob(SPRITE_SIZE, Rgba([shade, 120, 200, 255])))));
    }
    images
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    let mut rng = Pcg32::seed_from_u64(1);

    for len in [9usize, 26, 256] {
        let weights: Vec<f64> = (0..len).map(|i| (i % 7) as f64 + 0.5).collect();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("pick_index", len), &weights, |b, w| {
            b.iter(|| pick_index(Some(black_box(w.as_slice())), w.len(), &mut rng))
        });
    }

    let catalogs = Catalogs::fallback();
    let grades = GradeTable::default();
    let selector = CharacterSelector::new(&catalogs, &grades);
    group.bench_function("roll_fallback_catalogs", |b| b.iter(|| selector.roll(&mut rng)));

    group.finish();
}

fn bench_color(c: &mut Criterion) {
    let mut group = c.benchmark_group("color");
    let sprite = make_blob(SPRITE_SIZE, Rgba([180, 90, 30, 255]));

    group.throughput(Throughput::Elements((SPRITE_SIZE * SPRITE_SIZE) as u64));
    group.bench_function("rotate_hue_32x32", |b| b.iter(|| rotate_hue(black_box(&sprite), 150.0)));

    group.finish();
}

fn bench_outline(c: &mut Criterion) {
    let mut group = c.benchmark_group("outline");

    for size in [32u32, 128] {
        let sprite = make_blob(size, Rgba([255, 255, 255, 255]));
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::new("synthesize", size), &sprite, |b, s| {
            b.iter(|| synthesize_outline(black_box(s)))
        });
    }

    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    let layers = make_layers();

    group.bench_function("compose_sprite", |b| b.iter(|| compose_sprite(black_box(&layers), 90.0, SPRITE_SIZE)));

    let sprite = compose_sprite(&layers, 90.0, SPRITE_SIZE);
    let presentation = Presentation::default();
    group.bench_function("present_x10", |b| b.iter(|| present(black_box(&sprite), &presentation)));

    group.finish();
}

criterion_group!(benches, bench_select, bench_color, bench_outline, bench_compose);
criterion_main!(benches);
