use winit::dpi::PhysicalSize;

pub const SCREEN_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

fn attachment_extent(size: PhysicalSize<u32>) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    }
}

/// Depth buffer of the on-screen pass. Multisampled along with the colour
/// target.
pub struct Depth {
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

impl Depth {
    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>, sample_count: u32) -> Self {
        let format = SCREEN_DEPTH_FORMAT;
        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth"),
            size: attachment_extent(size),
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
        Self { view, format }
    }
}

/// Multisampled colour target resolved into the swapchain image.
pub struct MultisampleTarget {
    pub view: wgpu::TextureView,
}

impl MultisampleTarget {
    /// `None` when `sample_count` is 1 and the pass renders straight to the
    /// surface.
    pub fn new(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Option<Self> {
        if sample_count <= 1 {
            return None;
        }
        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("MSAA Colour"),
            size: attachment_extent(size),
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
        Some(Self { view })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_window_still_gets_an_attachment() {
        let extent = attachment_extent(PhysicalSize::new(0, 0));
        assert_eq!((extent.width, extent.height), (1, 1));
    }

    #[test]
    fn screen_depth_differs_from_shadow_depth() {
        assert!(matches!(SCREEN_DEPTH_FORMAT, wgpu::TextureFormat::Depth24Plus));
        assert_ne!(SCREEN_DEPTH_FORMAT, crate::renderer::shadow_map::SHADOW_MAP_FORMAT);
    }
}
