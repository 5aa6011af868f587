//! End-to-end frames through the facade on the mock device.

use std::sync::Arc;

use glint::device::MockDevice;
use glint::prelude::*;
use glint::render::TexturedVertex;
use glint::text::FixedRasterizer;

#[test]
fn test_sprites_and_text_share_one_frame() {
    let device = Arc::new(MockDevice::new());
    let mut sprites = SpriteRenderer::new(device.clone(), SpriteRendererConfig::default());
    sprites.initialize().unwrap();
    let mut text = TextRenderer::new(
        device.clone(),
        FixedRasterizer::new(20.0),
        TextRendererConfig::small().with_prewarm(None),
    )
    .unwrap();

    sprites.begin_frame().unwrap();
    sprites.clear(Color::BLACK).unwrap();
    sprites
        .draw_quad(Vec2::ZERO, Vec2::splat(10.0), Color::RED, CoordinateSystem::Absolute)
        .unwrap();
    text.draw_string_at(&mut sprites, "Hi", Vec2::new(50.0, 0.0), Color::WHITE)
        .unwrap();
    sprites
        .draw_quad(Vec2::ONE, Vec2::splat(10.0), Color::BLUE, CoordinateSystem::Absolute)
        .unwrap();
    let stats = sprites.end_frame().unwrap();

    // Solid, glyphs, solid again: the key changes twice.
    assert_eq!(stats.draw_calls, 3);
    assert_eq!(stats.quads, 4);

    let submissions = device.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].clear, Some(Color::BLACK.to_array()));
    let draws = &submissions[0].draws;
    assert_eq!(draws[0].texture, None);
    assert_eq!(draws[1].texture, text.cache().texture().map(|t| t.id));
    assert_eq!(draws[1].quad_count(), 2);
    assert_eq!(draws[1].vertices::<TexturedVertex>()[0].position, [50.0, 0.0]);
}

#[test]
fn test_dispose_releases_everything() {
    let device = Arc::new(MockDevice::new());
    {
        let mut sprites = SpriteRenderer::new(device.clone(), SpriteRendererConfig::default());
        sprites.initialize().unwrap();
        let mut text = TextRenderer::new(
            device.clone(),
            FixedRasterizer::new(12.0),
            TextRendererConfig::small(),
        )
        .unwrap();

        sprites.begin_frame().unwrap();
        text.draw_string_at(&mut sprites, "glint", Vec2::ZERO, Color::WHITE)
            .unwrap();
        sprites.end_frame().unwrap();

        text.release_texture(&mut sprites).unwrap();
        sprites.dispose();
    }
    assert_eq!(device.live_resource_count(), 0);
}
