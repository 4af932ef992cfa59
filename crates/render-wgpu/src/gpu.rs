use crate::shaders::{self, SCENE_UNIFORMS};
use crate::target::{self, GpuTarget, PendingClear};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use stereocube_assets::{FilterMode, MeshStore, Texture, Vertex};
use stereocube_common::{DisplayOutput, Rgba};
use stereocube_render::{
    BackendError, ColorFormat, DepthFormat, GpuBackend, LUT_SIZE, LightingEnvironment,
    OutputTable, SCENE_TEXTURE_UNIT, TargetDescriptor, TargetHandle, UniformBindable,
    UniformLocation,
};
use wgpu::util::DeviceExt;

const LUT_VEC4S: usize = LUT_SIZE / 4;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Matrices {
    projection: [[f32; 4]; 4],
    model_view: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LightingUniform {
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular0: [f32; 4],
    emission: [f32; 4],
    light_position: [f32; 4],
    light_color: [f32; 4],
    lut: [[f32; 4]; LUT_VEC4S],
}

impl LightingUniform {
    fn new(env: &LightingEnvironment) -> Self {
        let m = &env.material;
        let mut lut = [[0.0; 4]; LUT_VEC4S];
        for (i, sample) in env.specular.samples().iter().take(LUT_SIZE).enumerate() {
            lut[i / 4][i % 4] = *sample;
        }
        Self {
            ambient: m.ambient.extend(1.0).to_array(),
            diffuse: m.diffuse.extend(1.0).to_array(),
            specular0: m.specular0.extend(1.0).to_array(),
            emission: m.emission.extend(1.0).to_array(),
            light_position: env.light.position.to_array(),
            light_color: env.light.color.extend(1.0).to_array(),
            lut,
        }
    }
}

fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

type TargetFormats = (ColorFormat, DepthFormat);

/// [`GpuBackend`] over a wgpu device and a window surface.
///
/// Each eye renders into its own offscreen target. `frame_end` composites the
/// top-left output into the left half of the surface and the top-right output
/// into the right half, then presents.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,

    scene_module: wgpu::ShaderModule,
    scene_layout: wgpu::BindGroupLayout,
    scene_pipeline_layout: wgpu::PipelineLayout,
    scene_pipelines: Vec<(TargetFormats, wgpu::RenderPipeline)>,
    scene_bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    matrices: Matrices,
    vertex_buffer: Option<wgpu::Buffer>,

    composite_pipeline: wgpu::RenderPipeline,
    composite_layout: wgpu::BindGroupLayout,
    composite_sampler: wgpu::Sampler,

    targets: Vec<GpuTarget>,
    outputs: OutputTable,
    current: Option<TargetHandle>,
}

impl WgpuBackend {
    /// Build the scene and composite programs. `surface` must already be
    /// configured with `surface_config`.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: wgpu::Surface<'static>,
        surface_config: wgpu::SurfaceConfiguration,
    ) -> Result<Self, BackendError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let scene_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let composite_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("composite_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::COMPOSITE_SHADER.into()),
        });

        let matrices = Matrices {
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            model_view: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("matrices_buffer"),
            contents: bytemuck::bytes_of(&matrices),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lighting_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lighting_buffer"),
            contents: bytemuck::bytes_of(&LightingUniform::new(&LightingEnvironment::default())),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
                texture_entry(2),
                sampler_entry(3),
            ],
        });
        let scene_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&scene_layout],
            push_constant_ranges: &[],
        });

        // Placeholder until the scene texture is bound.
        let (white_view, white_sampler) = upload_texture(
            &device,
            &queue,
            &Texture::checkerboard(1, 1, [255; 4], [255; 4]),
        );
        let scene_bind_group = scene_bind_group(
            &device,
            &scene_layout,
            &uniform_buffer,
            &lighting_buffer,
            &white_view,
            &white_sampler,
        );

        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite_bind_group_layout"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });
        let composite_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("composite_pipeline_layout"),
                bind_group_layouts: &[&composite_layout],
                push_constant_ranges: &[],
            });
        let composite_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("composite_pipeline"),
            layout: Some(&composite_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &composite_module,
                entry_point: Some("vs_composite"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &composite_module,
                entry_point: Some(target::composite_entry_point(surface_config.format)),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        let composite_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("composite_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(BackendError::Shader(err.to_string()));
        }

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            scene_module,
            scene_layout,
            scene_pipeline_layout,
            scene_pipelines: Vec::new(),
            scene_bind_group,
            uniform_buffer,
            lighting_buffer,
            matrices,
            vertex_buffer: None,
            composite_pipeline,
            composite_layout,
            composite_sampler,
            targets: Vec::new(),
            outputs: OutputTable::new(),
            current: None,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Reconfigure the window surface. Eye targets keep their size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
    }

    fn ensure_scene_pipeline(&mut self, desc: &TargetDescriptor) -> Result<(), BackendError> {
        let formats = (desc.color, desc.depth);
        if self.scene_pipelines.iter().any(|(f, _)| *f == formats) {
            return Ok(());
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x2,
            2 => Float32x3,
        ];
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("scene_pipeline"),
                layout: Some(&self.scene_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.scene_module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &ATTRIBUTES,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.scene_module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: target::color_format(desc.color),
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: target::depth_format(desc.depth),
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(BackendError::Shader(err.to_string()));
        }

        self.scene_pipelines.push((formats, pipeline));
        Ok(())
    }

    fn drawn(&self, target: TargetHandle) -> bool {
        self.targets.get(target.index()).is_some_and(|t| t.drawn)
    }

    /// Run a pass without draws on every target that still has a clear queued.
    fn flush_clears(&mut self) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear_encoder"),
            });
        let mut any = false;
        for target in self.targets.iter_mut().filter(|t| t.pending_clear.is_some()) {
            let (color, depth) = target.attachments();
            let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear_pass"),
                color_attachments: &[Some(color)],
                depth_stencil_attachment: Some(depth),
                ..Default::default()
            });
            any = true;
        }
        if any {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    /// Composite the top-screen outputs side by side and present.
    ///
    /// With the 3D slider at zero only the left eye is drawn; the right half
    /// then shows the left image, as a 2D display would.
    fn present(&mut self) {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::warn!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return;
            }
            Err(e) => {
                tracing::error!("failed to acquire surface texture: {e}");
                return;
            }
        };
        let view = frame.texture.create_view(&Default::default());

        let left = self.outputs.target_for(DisplayOutput::TOP_LEFT);
        let right = match (left, self.outputs.target_for(DisplayOutput::TOP_RIGHT)) {
            (Some(l), Some(r)) if !self.drawn(r) && self.drawn(l) => Some(l),
            (_, r) => r,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("composite_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("composite_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
            pass.set_pipeline(&self.composite_pipeline);

            let half = self.surface_config.width as f32 / 2.0;
            let height = self.surface_config.height as f32;
            for (i, source) in [left, right].into_iter().enumerate() {
                let Some(target) = source.and_then(|h| self.targets.get(h.index())) else {
                    continue;
                };
                pass.set_viewport(i as f32 * half, 0.0, half, height, 0.0, 1.0);
                pass.set_bind_group(0, &target.composite_bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

impl UniformBindable for WgpuBackend {
    fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        SCENE_UNIFORMS
            .iter()
            .position(|n| *n == name)
            .map(|i| UniformLocation::new(i as u32))
    }
}

impl GpuBackend for WgpuBackend {
    fn create_target(&mut self, desc: &TargetDescriptor) -> Result<TargetHandle, BackendError> {
        let limit = self.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > limit || desc.height > limit {
            return Err(BackendError::TargetAllocation {
                width: desc.width,
                height: desc.height,
                reason: format!("size outside 1..={limit}"),
            });
        }
        self.ensure_scene_pipeline(desc)?;

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let target = GpuTarget::new(
            &self.device,
            desc,
            &self.composite_layout,
            &self.composite_sampler,
        );
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(BackendError::TargetAllocation {
                width: desc.width,
                height: desc.height,
                reason: err.to_string(),
            });
        }

        let handle = TargetHandle::new(self.targets.len() as u32);
        self.targets.push(target);
        tracing::debug!(%handle, width = desc.width, height = desc.height, "allocated target");
        Ok(handle)
    }

    fn bind_output(&mut self, target: TargetHandle, output: DisplayOutput) -> Result<(), BackendError> {
        if target.index() >= self.targets.len() {
            return Err(BackendError::UnknownTarget(target));
        }
        self.outputs.bind(target, output)
    }

    fn upload_mesh(&mut self, mesh: &MeshStore) -> Result<(), BackendError> {
        self.vertex_buffer = Some(self.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertex_buffer"),
                contents: mesh.as_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: &Texture) -> Result<(), BackendError> {
        if unit != SCENE_TEXTURE_UNIT {
            return Err(BackendError::Texture(format!("texture unit {unit} is not available")));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let (view, sampler) = upload_texture(&self.device, &self.queue, texture);
        self.scene_bind_group = scene_bind_group(
            &self.device,
            &self.scene_layout,
            &self.uniform_buffer,
            &self.lighting_buffer,
            &view,
            &sampler,
        );
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(BackendError::Texture(err.to_string()));
        }
        Ok(())
    }

    fn set_lighting(&mut self, lighting: &LightingEnvironment) -> Result<(), BackendError> {
        self.queue.write_buffer(
            &self.lighting_buffer,
            0,
            bytemuck::bytes_of(&LightingUniform::new(lighting)),
        );
        Ok(())
    }

    fn frame_begin(&mut self) {
        let _ = self.device.poll(wgpu::Maintain::Wait);
        for target in &mut self.targets {
            target.drawn = false;
        }
        self.current = None;
    }

    fn clear(&mut self, target: TargetHandle, color: Rgba, depth: f32) {
        match self.targets.get_mut(target.index()) {
            Some(t) => {
                t.pending_clear = Some(PendingClear {
                    color: target::clear_color(color),
                    depth,
                })
            }
            None => tracing::warn!(%target, "clear on unknown target"),
        }
    }

    fn frame_draw_on(&mut self, target: TargetHandle) {
        self.current = Some(target);
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        let cols = value.to_cols_array_2d();
        match location.slot() {
            0 => self.matrices.projection = cols,
            1 => self.matrices.model_view = cols,
            slot => tracing::warn!(slot, "write to unknown uniform slot"),
        }
    }

    fn draw_arrays(&mut self, first: u32, count: u32) {
        let Some(handle) = self.current else {
            tracing::warn!("draw without a target");
            return;
        };
        let Some(vertex_buffer) = &self.vertex_buffer else {
            tracing::warn!("draw before mesh upload");
            return;
        };
        let Some(target) = self.targets.get_mut(handle.index()) else {
            tracing::warn!(%handle, "draw on unknown target");
            return;
        };
        let formats = (target.desc.color, target.desc.depth);
        let Some((_, pipeline)) = self.scene_pipelines.iter().find(|(f, _)| *f == formats) else {
            tracing::warn!(%handle, "no pipeline for target formats");
            return;
        };

        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.matrices));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("eye_encoder"),
            });
        {
            let (color, depth) = target.attachments();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("eye_pass"),
                color_attachments: &[Some(color)],
                depth_stencil_attachment: Some(depth),
                ..Default::default()
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.scene_bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.draw(first..first + count, 0..1);
        }
        target.drawn = true;
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn frame_end(&mut self) {
        self.flush_clears();
        self.present();
        self.current = None;
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn scene_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    matrices: &wgpu::Buffer,
    lighting: &wgpu::Buffer,
    texture: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scene_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: matrices.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: lighting.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(texture),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

/// Upload RGBA8 texels and build a sampler from the texture's filters.
fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &Texture,
) -> (wgpu::TextureView, wgpu::Sampler) {
    let size = wgpu::Extent3d {
        width: texture.width(),
        height: texture.height(),
        depth_or_array_layers: 1,
    };
    let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("scene_texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: target::TEXEL_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &gpu_texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        texture.rgba(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * texture.width()),
            rows_per_image: Some(texture.height()),
        },
        size,
    );

    let filter = texture.filter();
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("scene_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter_mode(filter.mag),
        min_filter: filter_mode(filter.min),
        ..Default::default()
    });
    (gpu_texture.create_view(&Default::default()), sampler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lighting_uniform_packs_lut_in_vec4s() {
        let env = LightingEnvironment::default();
        let packed = LightingUniform::new(&env);
        assert_eq!(packed.lut[0][0], 0.0);
        assert_eq!(packed.lut[LUT_VEC4S - 1][3], 1.0);
        assert_eq!(packed.lut[1][2], env.specular.samples()[6]);
        assert_eq!(packed.light_position, [16.0, 0.5, 0.0, 0.0]);
        assert_eq!(packed.ambient[..3], [0.2, 0.2, 0.2]);
    }

    #[test]
    fn uniform_block_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<Matrices>(), 128);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 6 * 16 + 64 * 16);
    }

    #[test]
    fn texture_filters_map() {
        assert_eq!(filter_mode(FilterMode::Linear), wgpu::FilterMode::Linear);
        assert_eq!(filter_mode(FilterMode::Nearest), wgpu::FilterMode::Nearest);
    }
}
