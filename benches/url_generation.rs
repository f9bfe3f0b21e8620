use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use cloudinary_sdk::config::CloudConfig;
use cloudinary_sdk::signature::sign;
use cloudinary_sdk::transformation::{Crop, Gravity, Layer, TextStyle, Transformation};
use cloudinary_sdk::url::UrlBuilder;

fn config() -> Arc<CloudConfig> {
    Arc::new(CloudConfig::new("demo").with_credentials("123456789012345", "abcdefghijklmnopqrstuvwxyz"))
}

fn transformation(groups: usize) -> Transformation {
    let mut transformation = Transformation::new();
    for i in 0..groups {
        transformation = transformation
            .width(100 + i as i64)
            .height(200)
            .crop(Crop::Fill)
            .gravity(Gravity::Face)
            .chain();
    }
    transformation
}

/// Benchmark plain and signed URL generation
fn bench_generate(c: &mut Criterion) {
    let builder = UrlBuilder::new(config()).transformation(transformation(1));

    let mut group = c.benchmark_group("url_generate");

    group.bench_function("unsigned", |b| {
        b.iter(|| builder.generate(black_box("sample"), false).unwrap());
    });

    group.bench_function("signed", |b| {
        b.iter(|| builder.generate(black_box("sample"), true).unwrap());
    });

    group.bench_function("folder_id_encoding", |b| {
        b.iter(|| builder.generate(black_box("folder/my image (1).jpg"), false).unwrap());
    });

    group.finish();
}

/// Benchmark serialization cost as transformation chains grow
fn bench_transformation_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("transformation_serialize");

    for groups in [1, 4, 16] {
        let transformation = transformation(groups);
        group.bench_with_input(BenchmarkId::from_parameter(groups), &transformation, |b, t| {
            b.iter(|| t.to_url_string().unwrap());
        });
    }

    let with_layer = Transformation::new()
        .overlay(Layer::text("Hello, World", TextStyle::new("Arial", 18).bold()))
        .chain()
        .width(300);
    group.bench_function("text_layer", |b| {
        b.iter(|| with_layer.to_url_string().unwrap());
    });

    group.finish();
}

/// Benchmark the raw digest
fn bench_sign(c: &mut Criterion) {
    c.bench_function("delivery_sign", |b| {
        b.iter(|| sign(black_box("c_fill,g_face,h_200,w_100/sample"), black_box("secret")));
    });
}

criterion_group!(benches, bench_generate, bench_transformation_depth, bench_sign);
criterion_main!(benches);
