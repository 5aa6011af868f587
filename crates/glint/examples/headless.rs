//! Headless Example - draws sprites and text into an offscreen wgpu target.
//!
//! Run with:
//! ```bash
//! GLINT_LOG=debug cargo run -p glint --example headless
//! GLINT_PROFILE=1 cargo run -p glint --example headless --features profiling
//! ```

use std::sync::Arc;

use glint::core::logging;
use glint::core::profiling::{self, ProfilingBackend};
use glint::prelude::*;
use glint::text::{FixedRasterizer, TextRendererConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    if std::env::var_os("GLINT_PROFILE").is_some() {
        profiling::init_profiling(ProfilingBackend::PuffinHttp);
    }

    let device = Arc::new(WgpuDevice::new_headless_sync(
        WgpuDeviceDescriptor::new().size(640, 360).label("headless"),
    )?);

    let mut sprites = SpriteRenderer::new(device.clone(), SpriteRendererConfig::default());
    sprites.initialize()?;

    let config = TextRendererConfig::medium();
    let mut text = match TextRenderer::with_font(
        device.clone(),
        FontAttributes::sans_serif(),
        24.0,
        config.clone(),
    ) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("System fonts unavailable ({}), using fixed cells", e);
            TextRenderer::new(device.clone(), FixedRasterizer::new(24.0), config)?
        }
    };

    for frame in 0..3 {
        profiling::new_frame();
        sprites.begin_frame()?;
        sprites.clear(Color::from_hex(0x1e1e2e))?;

        for i in 0..64 {
            let x = (i % 16) as f32 / 16.0;
            let y = (i / 16) as f32 / 8.0 + 0.4;
            let request = DrawRequest::solid(Vec2::new(x, y), Vec2::splat(0.05))
                .center(Vec2::splat(0.025))
                .rotation(frame as f32 * 0.1 + i as f32 * 0.05)
                .color(Color::rgb(x, y, 1.0 - x))
                .coordinates(CoordinateSystem::Relative);
            sprites.draw(&request)?;
        }

        let layout = text.draw_string(
            &mut sprites,
            &format!("glint frame {}\nsprites and text", frame),
            TextAnchor::Rect(
                Rect::new(0.0, 0.0, 640.0, 120.0),
                TextAlignment::HCENTER | TextAlignment::VCENTER,
            ),
            &TextStyle::new().color(Color::YELLOW),
        )?;

        let stats = sprites.end_frame()?;
        tracing::info!(
            "frame {}: {} draw calls, {} quads, text box {:?} at {:?}",
            frame,
            stats.draw_calls,
            stats.quads,
            layout.size,
            layout.top_left
        );
    }

    text.release_texture(&mut sprites)?;
    sprites.dispose();
    Ok(())
}
