use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::RgbaImage;
use picmark::watermark::{
    adaptive_font_size, layout, FontSet, LayoutSettings, WatermarkCompositor, WatermarkSpec,
};
use std::sync::Arc;

const LONG_TEXT: &str = "Summer holiday by the lake 2023 夏日湖畔 with friends and family";

fn bench_layout(c: &mut Criterion) {
    let fonts = FontSet::resolve(&Default::default());
    let scaled = fonts.at_size(48.0);

    let mut group = c.benchmark_group("layout");
    group.bench_function("single_line", |b| {
        b.iter(|| layout(black_box("2023-07-04 10:20:30"), &scaled, 4000.0, 0.0, 0.0))
    });
    group.bench_function("wrapped_mixed_script", |b| {
        b.iter(|| layout(black_box(LONG_TEXT), &scaled, 600.0, 0.0, 0.0))
    });
    group.finish();
}

fn bench_sizing(c: &mut Criterion) {
    let fonts = FontSet::resolve(&Default::default());

    let mut group = c.benchmark_group("adaptive_font_size");
    group.bench_function("1080p", |b| {
        b.iter(|| adaptive_font_size(black_box(LONG_TEXT), 40, (1920, 1080), &fonts))
    });
    group.bench_function("24mp", |b| {
        b.iter(|| adaptive_font_size(black_box(LONG_TEXT), 40, (6000, 4000), &fonts))
    });
    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let compositor = WatermarkCompositor::new(
        Arc::new(FontSet::resolve(&Default::default())),
        LayoutSettings::default(),
    );
    let image = RgbaImage::from_fn(1920, 1080, |x, y| {
        image::Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255])
    });
    let spec = WatermarkSpec::new(LONG_TEXT)
        .with_adaptive_size(true)
        .with_high_contrast(true);

    let mut group = c.benchmark_group("apply");
    group.sample_size(10);
    group.bench_function("1080p_adaptive_high_contrast", |b| {
        b.iter(|| compositor.apply(black_box(&image), LONG_TEXT, &spec).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_layout, bench_sizing, bench_apply);
criterion_main!(benches);
