//! Benchmarks for sprite batching throughput on the mock device

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glint_core::math::Vec2;
use glint_device::{MockDevice, RenderDevice, TextureDesc, TextureFormat};
use glint_render::{Color, CoordinateSystem, SpriteRenderer, SpriteRendererConfig, SpriteTexture};

fn setup(capacity: usize) -> (Arc<MockDevice>, SpriteRenderer) {
    let device = Arc::new(MockDevice::new());
    let mut renderer = SpriteRenderer::new(
        device.clone(),
        SpriteRendererConfig::default().with_batch_capacity(capacity),
    );
    renderer.initialize().expect("Failed to initialize sprite renderer");
    (device, renderer)
}

fn bench_solid_quads(c: &mut Criterion) {
    let mut group = c.benchmark_group("solid_quads");

    for count in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let (device, mut renderer) = setup(1024);
            b.iter(|| {
                renderer.begin_frame().unwrap();
                for i in 0..count {
                    let x = (i % 100) as f32 * 8.0;
                    let y = (i / 100) as f32 * 8.0;
                    renderer
                        .draw_quad(
                            Vec2::new(x, y),
                            Vec2::splat(6.0),
                            Color::WHITE,
                            CoordinateSystem::Absolute,
                        )
                        .unwrap();
                }
                black_box(renderer.end_frame().unwrap());
                device.clear_calls();
            });
        });
    }

    group.finish();
}

fn bench_texture_switching(c: &mut Criterion) {
    let mut group = c.benchmark_group("texture_switching");

    for textures in [1usize, 4, 16] {
        group.bench_with_input(
            BenchmarkId::from_parameter(textures),
            &textures,
            |b, &textures| {
                let (device, mut renderer) = setup(128);
                let atlas: Vec<SpriteTexture> = (0..textures)
                    .map(|_| {
                        let id = device
                            .create_texture(&TextureDesc {
                                label: Some("bench"),
                                width: 32,
                                height: 32,
                                format: TextureFormat::Rgba8Unorm,
                            })
                            .unwrap();
                        SpriteTexture::new(id, 32, 32)
                    })
                    .collect();

                b.iter(|| {
                    renderer.begin_frame().unwrap();
                    for i in 0..1_000 {
                        renderer
                            .draw_sprite(
                                atlas[i % atlas.len()],
                                Vec2::new(i as f32, 0.0),
                                Vec2::splat(32.0),
                                CoordinateSystem::Absolute,
                            )
                            .unwrap();
                    }
                    black_box(renderer.end_frame().unwrap());
                    device.clear_calls();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_solid_quads, bench_texture_switching);
criterion_main!(benches);
