use std::sync::Arc;

use glint_core::geometry::Rect;
use glint_core::math::Vec2;
use glint_device::{MockDevice, TextureId};
use glint_render::{Color, CoordinateSystem, SpriteRenderer, SpriteRendererConfig, TexturedVertex};
use glint_text::{
    FixedRasterizer, TextAlignment, TextAnchor, TextError, TextRenderer, TextRendererConfig,
    TextStyle,
};

// FixedRasterizer at 20px: 9x16 cells, advance 10, line height 20.
const SIZE: f32 = 20.0;

fn setup(config: TextRendererConfig) -> (Arc<MockDevice>, SpriteRenderer, TextRenderer) {
    let device = Arc::new(MockDevice::new());
    let mut sprites = SpriteRenderer::new(device.clone(), SpriteRendererConfig::default());
    sprites.initialize().unwrap();
    let text = TextRenderer::new(
        device.clone(),
        FixedRasterizer::new(SIZE),
        config.with_prewarm(None),
    )
    .unwrap();
    (device, sprites, text)
}

fn drawn_quads(device: &MockDevice) -> Vec<Vec<TexturedVertex>> {
    device
        .draws()
        .iter()
        .flat_map(|draw| {
            draw.vertices::<TexturedVertex>()
                .chunks(4)
                .map(|quad| quad.to_vec())
                .collect::<Vec<_>>()
        })
        .collect()
}

fn region(data: &[u8], atlas_width: u32, rect: Rect<u32>) -> Vec<u8> {
    let mut out = Vec::new();
    for row in rect.y..rect.bottom() {
        let start = ((row * atlas_width + rect.x) * 4) as usize;
        out.extend_from_slice(&data[start..start + rect.width as usize * 4]);
    }
    out
}

#[test]
fn test_repeated_character_is_rasterized_once() {
    let (_device, _sprites, text) = setup(TextRendererConfig::default());
    let cache = text.cache();

    cache.ensure_glyphs("AA").unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.rasterize_count(), 1);

    cache.ensure_glyphs("A").unwrap();
    assert_eq!(cache.rasterize_count(), 1);
}

#[test]
fn test_prewarm_fills_the_atlas() {
    let device = Arc::new(MockDevice::new());
    let text = TextRenderer::new(
        device,
        FixedRasterizer::new(SIZE),
        TextRendererConfig::default(),
    )
    .unwrap();
    assert_eq!(text.cache().len(), 95);
    assert!(text.cache().contains('~'));
}

#[test]
fn test_right_bottom_alignment_is_flush_with_rect() {
    let (device, mut sprites, mut text) = setup(TextRendererConfig::default());
    let rect = Rect::new(100.0, 100.0, 200.0, 50.0);

    sprites.begin_frame().unwrap();
    let layout = text
        .draw_string_in(
            &mut sprites,
            "AB",
            rect,
            TextAlignment::RIGHT | TextAlignment::BOTTOM,
            Color::WHITE,
        )
        .unwrap();
    sprites.end_frame().unwrap();

    assert_eq!(layout.size, Vec2::new(20.0, 20.0));
    assert_eq!(layout.top_left + layout.size, Vec2::new(300.0, 150.0));

    let quads = drawn_quads(&device);
    assert_eq!(quads.len(), 2);
    assert_eq!(quads[0][0].position, [280.0, 130.0]);
    assert_eq!(quads[1][0].position, [290.0, 130.0]);
    assert_eq!(quads[1][3].position, [299.0, 146.0]);
}

#[test]
fn test_left_top_alignment_is_flush_with_rect() {
    let (_device, mut sprites, mut text) = setup(TextRendererConfig::default());
    let rect = Rect::new(100.0, 100.0, 200.0, 50.0);

    sprites.begin_frame().unwrap();
    let layout = text
        .draw_string_in(&mut sprites, "AB", rect, TextAlignment::default(), Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();

    assert_eq!(layout.top_left, Vec2::new(100.0, 100.0));
}

#[test]
fn test_measure_matches_draw() {
    let (_device, mut sprites, mut text) = setup(TextRendererConfig::default());
    let position = Vec2::new(37.0, 12.5);

    sprites.begin_frame().unwrap();
    let drawn = text
        .draw_string_at(&mut sprites, "Hello, world", position, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();

    assert_eq!(text.measure("Hello, world").at(position), drawn);
}

#[test]
fn test_glyph_uvs_point_at_atlas_rect() {
    let (device, mut sprites, mut text) = setup(TextRendererConfig::default());

    sprites.begin_frame().unwrap();
    text.draw_string_at(&mut sprites, "A", Vec2::ZERO, Color::RED)
        .unwrap();
    sprites.end_frame().unwrap();

    let entry = text.cache().glyph('A').unwrap();
    let (width, height) = text.cache().atlas_size();
    let quad = &drawn_quads(&device)[0];
    assert_eq!(
        quad[0].tex_coords,
        [entry.rect.x as f32 / width as f32, entry.rect.y as f32 / height as f32]
    );
    assert_eq!(
        quad[3].tex_coords,
        [
            entry.rect.right() as f32 / width as f32,
            entry.rect.bottom() as f32 / height as f32
        ]
    );
    assert_eq!(quad[0].color, Color::RED.to_array());
    assert_eq!(device.draws()[0].texture, text.cache().texture().map(|t| t.id));
}

#[test]
fn test_atlas_growth_keeps_glyph_pixels() {
    let config = TextRendererConfig::default()
        .with_initial_atlas_size(32, 32)
        .with_max_atlas_size(256);
    let (device, mut sprites, mut text) = setup(config);
    let cache = text.cache();

    sprites.begin_frame().unwrap();
    text.draw_string_at(&mut sprites, "AB", Vec2::ZERO, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();

    let first: TextureId = cache.texture().unwrap().id;
    let a = cache.glyph('A').unwrap();
    let before = region(&device.texture_data(first).unwrap(), 32, a.rect);

    sprites.begin_frame().unwrap();
    text.draw_string_at(&mut sprites, "CDEF", Vec2::ZERO, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();

    let second = cache.texture().unwrap();
    assert_ne!(second.id, first);
    assert_eq!(cache.atlas_size(), (64, 32));
    assert_eq!(device.texture_size(second.id), Some((64, 32)));
    assert!(!device.is_alive(first));

    assert_eq!(cache.glyph('A').unwrap().rect, a.rect);
    let after = region(&device.texture_data(second.id).unwrap(), 64, a.rect);
    assert_eq!(before, after);
    assert_eq!(after[3], FixedRasterizer::coverage('A', 0));
}

#[test]
fn test_new_glyphs_upload_only_their_region() {
    let (device, mut sprites, mut text) = setup(TextRendererConfig::default());

    sprites.begin_frame().unwrap();
    text.draw_string_at(&mut sprites, "A", Vec2::ZERO, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();
    let creates = device.count_texture_creates();
    let updates = device.count_texture_updates();

    sprites.begin_frame().unwrap();
    text.draw_string_at(&mut sprites, "AZ", Vec2::ZERO, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();

    assert_eq!(device.count_texture_creates(), creates);
    assert_eq!(device.count_texture_updates(), updates + 1);
}

#[test]
fn test_failed_region_upload_is_retried() {
    let (device, mut sprites, mut text) = setup(TextRendererConfig::default());
    let cache = text.cache();

    sprites.begin_frame().unwrap();
    text.draw_string_at(&mut sprites, "A", Vec2::ZERO, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();
    let texture = cache.texture().unwrap();

    device.fail_next_texture_update("transient");
    sprites.begin_frame().unwrap();
    let err = text
        .draw_string_at(&mut sprites, "B", Vec2::ZERO, Color::WHITE)
        .unwrap_err();
    assert!(matches!(err, TextError::Render(_)));
    sprites.end_frame().unwrap();

    sprites.begin_frame().unwrap();
    text.draw_string_at(&mut sprites, "B", Vec2::ZERO, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();

    assert_eq!(cache.texture(), Some(texture));
    let b = cache.glyph('B').unwrap();
    let (width, _) = cache.atlas_size();
    let gpu = region(&device.texture_data(texture.id).unwrap(), width, b.rect);
    let cpu = region(&cache.atlas_pixels(), width, b.rect);
    assert_eq!(gpu, cpu);
    assert_eq!(gpu[3], FixedRasterizer::coverage('B', 0));
}

#[test]
fn test_atlas_full_is_recoverable() {
    let config = TextRendererConfig::default()
        .with_initial_atlas_size(32, 32)
        .with_max_atlas_size(32);
    let (_device, mut sprites, mut text) = setup(config);

    sprites.begin_frame().unwrap();
    let err = text
        .draw_string_at(&mut sprites, "ABCDEFG", Vec2::ZERO, Color::WHITE)
        .unwrap_err();
    assert!(matches!(
        err,
        TextError::AtlasFull {
            atlas_width: 32,
            atlas_height: 32,
            ..
        }
    ));
    assert!(err.is_recoverable());

    // Glyphs that fit are still usable.
    text.draw_string_at(&mut sprites, "ABC", Vec2::ZERO, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();
}

#[test]
fn test_device_limit_caps_atlas() {
    let device = Arc::new(MockDevice::new());
    device.set_max_texture_dimension(32);
    let config = TextRendererConfig::default()
        .with_initial_atlas_size(32, 32)
        .with_prewarm(None);
    let text = TextRenderer::new(device, FixedRasterizer::new(SIZE), config).unwrap();

    let err = text.ensure_glyphs("ABCDEFG").unwrap_err();
    assert!(matches!(err, TextError::AtlasFull { .. }));
}

#[test]
fn test_multiline_layout() {
    let (device, mut sprites, mut text) = setup(TextRendererConfig::default());

    sprites.begin_frame().unwrap();
    let layout = text
        .draw_string_at(&mut sprites, "AB\nC", Vec2::ZERO, Color::WHITE)
        .unwrap();
    let stats = sprites.end_frame().unwrap();

    assert_eq!(layout.line_count, 2);
    assert_eq!(layout.size, Vec2::new(20.0, 40.0));
    assert_eq!(stats.draw_calls, 1);
    let quads = drawn_quads(&device);
    assert_eq!(quads.len(), 3);
    assert_eq!(quads[2][0].position, [0.0, 20.0]);
}

#[test]
fn test_centered_block_is_aligned_as_one_box() {
    let (_device, mut sprites, mut text) = setup(TextRendererConfig::default());
    let rect = Rect::new(0.0, 0.0, 100.0, 100.0);

    sprites.begin_frame().unwrap();
    let layout = text
        .draw_string_in(
            &mut sprites,
            "ABCD\nE",
            rect,
            TextAlignment::HCENTER | TextAlignment::VCENTER,
            Color::WHITE,
        )
        .unwrap();
    sprites.end_frame().unwrap();

    assert_eq!(layout.top_left, Vec2::new(30.0, 30.0));
    // The short second line starts at the block's left edge.
    assert_eq!(layout.glyphs[4].origin, Vec2::new(30.0, 50.0));
}

#[test]
fn test_text_wider_than_rect_overflows() {
    let (device, mut sprites, mut text) = setup(TextRendererConfig::default());
    let rect = Rect::new(0.0, 0.0, 30.0, 20.0);

    sprites.begin_frame().unwrap();
    let layout = text
        .draw_string_in(&mut sprites, "ABCDEF", rect, TextAlignment::RIGHT, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();

    assert_eq!(layout.top_left.x, -30.0);
    assert_eq!(drawn_quads(&device).len(), 6);
}

#[test]
fn test_whitespace_draws_nothing() {
    let (device, mut sprites, mut text) = setup(TextRendererConfig::default());

    sprites.begin_frame().unwrap();
    let layout = text
        .draw_string_at(&mut sprites, "A B  ", Vec2::ZERO, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();

    assert_eq!(drawn_quads(&device).len(), 2);
    assert_eq!(layout.size.x, 30.0);
    assert_eq!(layout.width_including_trailing_whitespace, 50.0);
}

#[test]
fn test_font_size_scales_quads() {
    let (device, mut sprites, mut text) = setup(TextRendererConfig::default());

    sprites.begin_frame().unwrap();
    let layout = text
        .draw_string(
            &mut sprites,
            "A",
            TextAnchor::Point(Vec2::new(10.0, 10.0)),
            &TextStyle::new().size(40.0),
        )
        .unwrap();
    sprites.end_frame().unwrap();

    assert_eq!(layout.size, Vec2::new(20.0, 40.0));
    let quad = &drawn_quads(&device)[0];
    assert_eq!(quad[0].position, [10.0, 10.0]);
    assert_eq!(quad[3].position, [28.0, 42.0]);
    assert_eq!(text.measure_scaled("A", 40.0).size, layout.size);
}

#[test]
fn test_relative_anchor_and_size() {
    let (_device, mut sprites, mut text) = setup(TextRendererConfig::default());

    sprites.begin_frame().unwrap();
    let layout = text
        .draw_string(
            &mut sprites,
            "A",
            TextAnchor::Point(Vec2::new(0.5, 0.5)),
            &TextStyle::new()
                .size(0.1)
                .coordinates(CoordinateSystem::Relative),
        )
        .unwrap();
    sprites.end_frame().unwrap();

    // 800x600 viewport: 0.1 of the height is 60px, three times the base size.
    assert_eq!(layout.top_left, Vec2::new(400.0, 300.0));
    assert_eq!(layout.size, Vec2::new(30.0, 60.0));
}

#[test]
fn test_draw_outside_frame_is_usage_error() {
    let (_device, mut sprites, mut text) = setup(TextRendererConfig::default());
    let err = text
        .draw_string_at(&mut sprites, "A", Vec2::ZERO, Color::WHITE)
        .unwrap_err();
    assert!(matches!(err, TextError::Render(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn test_release_texture_recreates_on_next_draw() {
    let (device, mut sprites, mut text) = setup(TextRendererConfig::default());

    sprites.begin_frame().unwrap();
    text.draw_string_at(&mut sprites, "A", Vec2::ZERO, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();
    let first = text.cache().texture().unwrap().id;

    text.release_texture(&mut sprites).unwrap();
    assert!(!device.is_alive(first));
    assert!(text.cache().texture().is_none());

    sprites.begin_frame().unwrap();
    text.draw_string_at(&mut sprites, "A", Vec2::ZERO, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();
    assert!(text.cache().texture().is_some());
    assert!(text.cache().contains('A'));
}

#[test]
fn test_cache_prewarm_from_another_thread() {
    let (_device, _sprites, text) = setup(TextRendererConfig::default());
    let cache = text.cache();

    std::thread::spawn(move || cache.prewarm("0123456789").unwrap())
        .join()
        .unwrap();

    assert_eq!(text.cache().len(), 10);
}

#[test]
fn test_dropping_last_cache_handle_releases_texture() {
    let (device, mut sprites, mut text) = setup(TextRendererConfig::default());

    sprites.begin_frame().unwrap();
    text.draw_string_at(&mut sprites, "A", Vec2::ZERO, Color::WHITE)
        .unwrap();
    sprites.end_frame().unwrap();
    let texture = text.cache().texture().unwrap().id;

    drop(text);
    assert!(!device.is_alive(texture));
}
