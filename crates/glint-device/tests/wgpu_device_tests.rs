//! wgpu adapter lifecycle tests.

#![cfg(feature = "wgpu")]

use glint_device::{
    BufferDesc, BufferUsage, DeviceError, GraphicsBackend, RenderDevice, ShaderDesc, ShaderFormat,
    ShaderStage, TextureDesc, TextureFormat, TextureRegion, Viewport, WgpuDevice,
    WgpuDeviceDescriptor,
};

fn device() -> Option<WgpuDevice> {
    match WgpuDevice::new_headless_sync(WgpuDeviceDescriptor::new().size(320, 240)) {
        Ok(device) => Some(device),
        Err(e) => {
            println!("GPU not available: {}", e);
            None
        }
    }
}

#[test]
#[ignore] // Requires GPU - run with: cargo test --test wgpu_device_tests -- --ignored
fn test_headless_viewport() {
    if let Some(device) = device() {
        assert_eq!(device.query_viewport(), Viewport::new(320, 240));
        assert_eq!(device.backend(), GraphicsBackend::WebGpu);

        device.resize(64, 32);
        assert_eq!(device.query_viewport(), Viewport::new(64, 32));
    }
}

#[test]
#[ignore] // Requires GPU
fn test_buffer_bounds_checked() {
    if let Some(device) = device() {
        let buffer = device
            .create_buffer(&BufferDesc {
                label: Some("bounds"),
                size: 64,
                usage: BufferUsage::UNIFORM,
            })
            .unwrap();
        assert!(device.update_buffer(buffer, 0, &[0u8; 64]).is_ok());
        assert!(matches!(
            device.update_buffer(buffer, 32, &[0u8; 64]),
            Err(DeviceError::OutOfBounds { .. })
        ));
    }
}

#[test]
#[ignore] // Requires GPU
fn test_texture_region_upload() {
    if let Some(device) = device() {
        let texture = device
            .create_texture(&TextureDesc {
                label: Some("region"),
                width: 16,
                height: 16,
                format: TextureFormat::Rgba8Unorm,
            })
            .unwrap();
        let region = TextureRegion::new(4, 4, 2, 2);
        assert!(device.update_texture(texture, region, &[255u8; 16]).is_ok());
        assert!(device.update_texture(texture, region, &[255u8; 8]).is_err());
    }
}

#[test]
#[ignore] // Requires GPU
fn test_non_wgsl_shader_rejected() {
    if let Some(device) = device() {
        let desc = ShaderDesc::new(ShaderStage::Vertex, ShaderFormat::SpirV, vec![0u8; 4], "VS");
        assert!(matches!(
            device.create_shader(&desc),
            Err(DeviceError::UnsupportedFormat(_))
        ));
    }
}

#[test]
#[ignore] // Requires GPU
fn test_empty_submit() {
    if let Some(device) = device() {
        let mut list = device.begin_command_list();
        list.clear([0.1, 0.2, 0.3, 1.0]).unwrap();
        list.end();
        assert!(device.submit(list).is_ok());
    }
}
