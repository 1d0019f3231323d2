use glam::Mat4;
use wgpu::*;
use wgpu::util::DeviceExt;

use crate::assets::{GrassTextures, SkinnedVertex, TextureData};
use crate::config::FloorConfig;
use crate::controller::{FrameRenderer, PhysicalSize};
use crate::error::RenderError;
use crate::model::{FoxModel, SceneState, MAX_JOINTS};
use crate::view::gpu_init::GpuContext;
use crate::view::mesh::{Mesh, MeshBuffer, Vertex};
use crate::view::texture::{sampler_layout_entry, texture_layout_entry, GpuTexture};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const CLEAR_COLOR: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub sun_dir: [f32; 4],
    pub sun_color: [f32; 4],
}

impl FrameUniform {
    pub fn from_scene(scene: &SceneState) -> Self {
        let ambient = scene.lights.ambient;
        let sun = scene.lights.sun;
        let scaled = |c: [f32; 3], i: f32| [c[0] * i, c[1] * i, c[2] * i, 1.0];
        Self {
            view_proj: scene.camera.view_proj().to_cols_array_2d(),
            camera_pos: scene.camera.eye.extend(1.0).to_array(),
            ambient: scaled(ambient.color, ambient.intensity),
            sun_dir: sun.direction_to_light().extend(0.0).to_array(),
            sun_color: scaled(sun.color, sun.intensity),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FloorMaterialUniform {
    pub model: [[f32; 4]; 4],
    pub uv_repeat: [f32; 2],
    pub displacement_scale: f32,
    pub ao_intensity: f32,
    pub roughness: f32,
    pub _pad: [f32; 3],
}

/// Model matrix followed by the joint palette, padded with identities.
pub fn skin_uniform_data(model: Mat4, palette: &[Mat4]) -> Vec<[[f32; 4]; 4]> {
    let mut data = Vec::with_capacity(MAX_JOINTS + 1);
    data.push(model.to_cols_array_2d());
    data.extend(palette.iter().take(MAX_JOINTS).map(|m| m.to_cols_array_2d()));
    data.resize(MAX_JOINTS + 1, Mat4::IDENTITY.to_cols_array_2d());
    data
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

fn uniform_layout_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

// Per-frame camera and lighting, shared by both pipelines
pub struct FrameResources {
    pub buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

pub fn create_frame_resources(device: &wgpu::Device) -> FrameResources {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("frame_buffer"),
        size: std::mem::size_of::<FrameUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("frame_bgl"),
        entries: &[uniform_layout_entry(0, ShaderStages::VERTEX_FRAGMENT)],
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("frame_bg"),
        layout: &bind_group_layout,
        entries: &[wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
    });
    FrameResources { buffer, bind_group_layout, bind_group }
}

fn create_pipeline(
    device: &Device,
    label: &str,
    shader_src: &str,
    format: TextureFormat,
    bind_group_layouts: &[&BindGroupLayout],
    vertex_layout: VertexBufferLayout<'static>,
) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(label),
        source: ShaderSource::Wgsl(shader_src.into()),
    });
    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: Some(Face::Back),
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

/// The textured, displaced grass sphere.
pub struct FloorResources {
    pub pipeline: RenderPipeline,
    pub mesh: MeshBuffer,
    pub material_buffer: Buffer,
    pub bind_group: BindGroup,
    material: FloorMaterialUniform,
    _textures: Vec<GpuTexture>,
}

pub fn create_floor_resources(
    gpu: &GpuContext,
    frame_layout: &BindGroupLayout,
    config: &FloorConfig,
    textures: &GrassTextures,
) -> FloorResources {
    let device = gpu.device.as_ref();
    let vertex_and_fragment = ShaderStages::VERTEX_FRAGMENT;

    let mut entries = vec![uniform_layout_entry(0, vertex_and_fragment)];
    for slot in 0..5u32 {
        entries.push(texture_layout_entry(1 + slot * 2, vertex_and_fragment));
        entries.push(sampler_layout_entry(2 + slot * 2, vertex_and_fragment));
    }
    let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("floor_bgl"),
        entries: &entries,
    });

    let uploaded: Vec<GpuTexture> = [
        &textures.color,
        &textures.ambient_occlusion,
        &textures.normal,
        &textures.roughness,
        &textures.height,
    ]
    .into_iter()
    .map(|t| GpuTexture::upload(device, gpu.queue.as_ref(), t))
    .collect();

    let material = FloorMaterialUniform {
        model: Mat4::IDENTITY.to_cols_array_2d(),
        uv_repeat: textures.color.sampler.repeat,
        displacement_scale: config.displacement_scale,
        ao_intensity: config.ao_intensity,
        roughness: config.roughness,
        _pad: [0.0; 3],
    };
    let material_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some("floor_material"),
        contents: bytemuck::bytes_of(&material),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });

    let mut bind_entries = vec![BindGroupEntry { binding: 0, resource: material_buffer.as_entire_binding() }];
    for (slot, tex) in uploaded.iter().enumerate() {
        let slot = slot as u32;
        bind_entries.push(tex.view_entry(1 + slot * 2));
        bind_entries.push(tex.sampler_entry(2 + slot * 2));
    }
    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("floor_bg"),
        layout: &layout,
        entries: &bind_entries,
    });

    let pipeline = create_pipeline(
        device,
        "floor_pipeline",
        include_str!("shaders/floor.wgsl"),
        gpu.format,
        &[frame_layout, &layout],
        Vertex::layout(),
    );
    let mesh = Mesh::sphere(config.radius, config.width_segments, config.height_segments).upload(device);

    FloorResources { pipeline, mesh, material_buffer, bind_group, material, _textures: uploaded }
}

/// Skinned pipeline; the fox's buffers are created once the model arrives.
pub struct SkinnedResources {
    pub pipeline: RenderPipeline,
    pub bind_group_layout: BindGroupLayout,
}

pub fn create_skinned_resources(gpu: &GpuContext, frame_layout: &BindGroupLayout) -> SkinnedResources {
    let device = gpu.device.as_ref();
    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("skinned_bgl"),
        entries: &[
            uniform_layout_entry(0, ShaderStages::VERTEX),
            texture_layout_entry(1, ShaderStages::FRAGMENT),
            sampler_layout_entry(2, ShaderStages::FRAGMENT),
        ],
    });
    let pipeline = create_pipeline(
        device,
        "skinned_pipeline",
        include_str!("shaders/skinned.wgsl"),
        gpu.format,
        &[frame_layout, &bind_group_layout],
        SkinnedVertex::layout(),
    );
    SkinnedResources { pipeline, bind_group_layout }
}

pub struct FoxResources {
    pub mesh: MeshBuffer,
    pub skin_buffer: Buffer,
    pub bind_group: BindGroup,
    _base_color: GpuTexture,
}

fn create_fox_resources(gpu: &GpuContext, skinned: &SkinnedResources, fox: &FoxModel) -> FoxResources {
    let device = gpu.device.as_ref();
    let fallback;
    let base_color = match &fox.base_color {
        Some(tex) => tex,
        None => {
            tracing::warn!("model has no base color texture, drawing it white");
            fallback = TextureData::solid("fox_base_color", [255; 4], true);
            &fallback
        }
    };
    let base_color = GpuTexture::upload(device, gpu.queue.as_ref(), base_color);

    let skin = skin_uniform_data(fox.transform, fox.joint_palette());
    let skin_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some("fox_skin"),
        contents: bytemuck::cast_slice(&skin),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("fox_bg"),
        layout: &skinned.bind_group_layout,
        entries: &[
            BindGroupEntry { binding: 0, resource: skin_buffer.as_entire_binding() },
            base_color.view_entry(1),
            base_color.sampler_entry(2),
        ],
    });
    let mesh = fox.mesh.upload(device);
    tracing::debug!("uploaded fox mesh ({} indices)", mesh.index_count);

    FoxResources { mesh, skin_buffer, bind_group, _base_color: base_color }
}

/// Consolidated render state, owning the surface it draws to
pub struct RenderState {
    pub gpu: GpuContext,
    pub depth_view: TextureView,
    pub frame: FrameResources,
    pub floor: FloorResources,
    pub skinned: SkinnedResources,
    pub fox: Option<FoxResources>,

    // UI
    pub egui_renderer: egui_wgpu::Renderer,
    pub egui_primitives: Option<Vec<egui::ClippedPrimitive>>,
    pub egui_textures: Option<egui::TexturesDelta>,
    pub egui_dpr: f32,
}

impl RenderState {
    pub fn new(gpu: GpuContext, floor_config: &FloorConfig, textures: &GrassTextures) -> Self {
        let device = gpu.device.as_ref();
        let (_, depth_view) = create_depth_texture(device, gpu.config.width, gpu.config.height);
        let frame = create_frame_resources(device);
        let floor = create_floor_resources(&gpu, &frame.bind_group_layout, floor_config, textures);
        let skinned = create_skinned_resources(&gpu, &frame.bind_group_layout);
        let egui_renderer = egui_wgpu::Renderer::new(device, gpu.format, egui_wgpu::RendererOptions::default());

        Self {
            gpu,
            depth_view,
            frame,
            floor,
            skinned,
            fox: None,
            egui_renderer,
            egui_primitives: None,
            egui_textures: None,
            egui_dpr: 1.0,
        }
    }

    /// Queue the tessellated debug panel for the next frame.
    pub fn set_ui(&mut self, primitives: Vec<egui::ClippedPrimitive>, textures: egui::TexturesDelta, dpr: f32) {
        self.egui_primitives = Some(primitives);
        self.egui_textures = Some(textures);
        self.egui_dpr = dpr;
    }

    fn reconfigure(&mut self) {
        self.gpu.surface.configure(&self.gpu.device, &self.gpu.config);
    }

    fn update_buffers(&mut self, scene: &SceneState) {
        let queue = self.gpu.queue.as_ref();
        queue.write_buffer(&self.frame.buffer, 0, bytemuck::bytes_of(&FrameUniform::from_scene(scene)));

        self.floor.material.model = scene.floor.model_matrix().to_cols_array_2d();
        queue.write_buffer(&self.floor.material_buffer, 0, bytemuck::bytes_of(&self.floor.material));

        if let Some(fox) = scene.model.get() {
            if self.fox.is_none() {
                self.fox = Some(create_fox_resources(&self.gpu, &self.skinned, fox));
            }
            if let Some(resources) = &self.fox {
                let skin = skin_uniform_data(fox.transform, fox.joint_palette());
                queue.write_buffer(&resources.skin_buffer, 0, bytemuck::cast_slice(&skin));
            }
        }
    }

    fn acquire_frame(&mut self) -> Result<SurfaceTexture, RenderError> {
        match self.gpu.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                tracing::warn!("surface lost, reconfiguring");
                self.reconfigure();
                self.gpu.surface.get_current_texture().map_err(RenderError::SurfaceLost)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn draw_frame(&mut self, scene: &SceneState) -> Result<(), RenderError> {
        self.update_buffers(scene);
        let frame = self.acquire_frame()?;

        let device = self.gpu.device.as_ref();
        let queue = self.gpu.queue.as_ref();
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_bind_group(0, &self.frame.bind_group, &[]);

            rp.set_pipeline(&self.floor.pipeline);
            rp.set_bind_group(1, &self.floor.bind_group, &[]);
            rp.set_vertex_buffer(0, self.floor.mesh.vertex_buffer.slice(..));
            rp.set_index_buffer(self.floor.mesh.index_buffer.slice(..), IndexFormat::Uint32);
            rp.draw_indexed(0..self.floor.mesh.index_count, 0, 0..1);

            if let Some(fox) = &self.fox {
                if fox.mesh.index_count > 0 {
                    rp.set_pipeline(&self.skinned.pipeline);
                    rp.set_bind_group(1, &fox.bind_group, &[]);
                    rp.set_vertex_buffer(0, fox.mesh.vertex_buffer.slice(..));
                    rp.set_index_buffer(fox.mesh.index_buffer.slice(..), IndexFormat::Uint32);
                    rp.draw_indexed(0..fox.mesh.index_count, 0, 0..1);
                }
            }
        }

        if let (Some(primitives), Some(textures)) = (self.egui_primitives.take(), self.egui_textures.take()) {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.gpu.config.width, self.gpu.config.height],
                pixels_per_point: self.egui_dpr,
            };

            // Upload egui textures
            for (id, image_delta) in &textures.set {
                self.egui_renderer.update_texture(device, queue, *id, image_delta);
            }
            self.egui_renderer
                .update_buffers(device, queue, &mut encoder, &primitives, &screen_descriptor);

            {
                let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                    label: Some("egui_render_pass"),
                    color_attachments: &[Some(RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: Operations {
                            load: LoadOp::Load,
                            store: StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                self.egui_renderer
                    .render(&mut egui_pass.forget_lifetime(), &primitives, &screen_descriptor);
            }

            for id in &textures.free {
                self.egui_renderer.free_texture(id);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

impl FrameRenderer for RenderState {
    fn render(&mut self, scene: &SceneState) -> Result<(), RenderError> {
        self.draw_frame(scene)
    }

    fn resize(&mut self, size: PhysicalSize) {
        if size.width == self.gpu.config.width && size.height == self.gpu.config.height {
            return;
        }
        tracing::debug!("resizing surface to {}x{}", size.width, size.height);
        self.gpu.config.width = size.width;
        self.gpu.config.height = size.height;
        self.reconfigure();
        // Recreate depth texture & view to match new size
        let (_, depth_view) = create_depth_texture(self.gpu.device.as_ref(), size.width, size.height);
        self.depth_view = depth_view;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;
    use glam::Vec3;

    #[test]
    fn test_uniform_layouts_match_wgsl() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 128);
        assert_eq!(std::mem::size_of::<FloorMaterialUniform>(), 96);
        assert_eq!(std::mem::size_of::<SkinnedVertex>(), 56);
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
    }

    #[test]
    fn test_skin_uniform_pads_with_identity() {
        let model = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        let palette = vec![Mat4::from_scale(Vec3::splat(2.0)); 3];
        let data = skin_uniform_data(model, &palette);
        assert_eq!(data.len(), MAX_JOINTS + 1);
        assert_eq!(data[0], model.to_cols_array_2d());
        assert_eq!(data[3], palette[2].to_cols_array_2d());
        assert_eq!(data[4], Mat4::IDENTITY.to_cols_array_2d());

        let too_many = vec![Mat4::IDENTITY; MAX_JOINTS + 10];
        assert_eq!(skin_uniform_data(model, &too_many).len(), MAX_JOINTS + 1);
    }

    #[test]
    fn test_frame_uniform_from_scene() {
        let scene = SceneState::new(&DemoConfig::default(), 800, 600);
        let uniform = FrameUniform::from_scene(&scene);
        assert_eq!(uniform.ambient, [0.8, 0.8, 0.8, 1.0]);
        assert_eq!(uniform.sun_color, [0.5, 0.5, 0.5, 1.0]);
        let dir = Vec3::new(uniform.sun_dir[0], uniform.sun_dir[1], uniform.sun_dir[2]);
        assert!((dir - Vec3::splat(1.0).normalize()).length() < 1e-6);
        assert_eq!(uniform.camera_pos, [1.0, 2.9, 2.0, 1.0]);
    }
}
