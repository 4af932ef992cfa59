use stereocube_common::Rgba;
use stereocube_render::{ColorFormat, DepthFormat, TargetDescriptor};

/// Eye targets and the scene texture hold raw 8-bit values. Clears, texel
/// fetches and the combiner add all work on those bytes unconverted.
pub(crate) const TEXEL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub(crate) fn color_format(format: ColorFormat) -> wgpu::TextureFormat {
    match format {
        ColorFormat::Rgba8 => TEXEL_FORMAT,
    }
}

/// Composite fragment entry point for a surface format. An sRGB surface
/// re-encodes on write, so raw eye bytes are linearized first.
pub(crate) fn composite_entry_point(surface: wgpu::TextureFormat) -> &'static str {
    if surface.is_srgb() {
        "fs_composite_srgb"
    } else {
        "fs_composite"
    }
}

pub(crate) fn depth_format(format: DepthFormat) -> wgpu::TextureFormat {
    match format {
        DepthFormat::Depth24Stencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
        DepthFormat::Depth32 => wgpu::TextureFormat::Depth32Float,
    }
}

pub(crate) fn clear_color(color: Rgba) -> wgpu::Color {
    let [r, g, b, a] = color.to_f32_array();
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

/// A clear requested for the next pass that touches the target.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingClear {
    pub color: wgpu::Color,
    pub depth: f32,
}

/// One offscreen colour+depth surface and the bind group that composites it.
pub(crate) struct GpuTarget {
    pub desc: TargetDescriptor,
    pub color_view: wgpu::TextureView,
    pub depth_view: wgpu::TextureView,
    pub composite_bind_group: wgpu::BindGroup,
    pub pending_clear: Option<PendingClear>,
    /// Set when the target received a draw since the last `frame_begin`.
    pub drawn: bool,
}

impl GpuTarget {
    pub fn new(
        device: &wgpu::Device,
        desc: &TargetDescriptor,
        composite_layout: &wgpu::BindGroupLayout,
        composite_sampler: &wgpu::Sampler,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("eye_color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: color_format(desc.color),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("eye_depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: depth_format(desc.depth),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let color_view = color.create_view(&Default::default());
        let depth_view = depth.create_view(&Default::default());

        let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("eye_composite_bind_group"),
            layout: composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(composite_sampler),
                },
            ],
        });

        Self {
            desc: *desc,
            color_view,
            depth_view,
            composite_bind_group,
            pending_clear: None,
            drawn: false,
        }
    }

    /// Colour and depth attachments for a pass, consuming any pending clear.
    pub fn attachments(
        &mut self,
    ) -> (
        wgpu::RenderPassColorAttachment<'_>,
        wgpu::RenderPassDepthStencilAttachment<'_>,
    ) {
        let clear = self.pending_clear.take();
        let color = wgpu::RenderPassColorAttachment {
            view: &self.color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: match clear {
                    Some(c) => wgpu::LoadOp::Clear(c.color),
                    None => wgpu::LoadOp::Load,
                },
                store: wgpu::StoreOp::Store,
            },
        };
        let has_stencil = self.desc.depth == DepthFormat::Depth24Stencil8;
        let depth = wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: match clear {
                    Some(c) => wgpu::LoadOp::Clear(c.depth),
                    None => wgpu::LoadOp::Load,
                },
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: has_stencil.then_some(wgpu::Operations {
                load: match clear {
                    Some(_) => wgpu::LoadOp::Clear(0),
                    None => wgpu::LoadOp::Load,
                },
                store: wgpu::StoreOp::Store,
            }),
        };
        (color, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_map_to_wgpu() {
        assert_eq!(
            color_format(ColorFormat::Rgba8),
            wgpu::TextureFormat::Rgba8Unorm
        );
        assert!(!TEXEL_FORMAT.is_srgb());
        assert_eq!(
            depth_format(DepthFormat::Depth24Stencil8),
            wgpu::TextureFormat::Depth24PlusStencil8
        );
        assert_eq!(
            depth_format(DepthFormat::Depth32),
            wgpu::TextureFormat::Depth32Float
        );
    }

    #[test]
    fn sky_clear_stores_its_own_bytes() {
        // A unorm target stores round(c * 255), so the clear must be the raw byte / 255.
        let c = clear_color(Rgba::SKY);
        let stored = |v: f64| (v * 255.0).round() as u8;
        assert_eq!(stored(c.r), 0x68);
        assert_eq!(stored(c.g), 0xB0);
        assert_eq!(stored(c.b), 0xD8);
        assert_eq!(stored(c.a), 0xFF);
        assert!((c.r - 104.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn composite_linearizes_only_for_srgb_surfaces() {
        assert_eq!(
            composite_entry_point(wgpu::TextureFormat::Bgra8UnormSrgb),
            "fs_composite_srgb"
        );
        assert_eq!(
            composite_entry_point(wgpu::TextureFormat::Bgra8Unorm),
            "fs_composite"
        );
        assert_eq!(
            composite_entry_point(wgpu::TextureFormat::Rgba8Unorm),
            "fs_composite"
        );
    }
}
