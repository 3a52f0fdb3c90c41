//! Renderer: wgpu init + depth + one textured cube draw per frame.
//! Consumes a [`ComposedFrame`] from `corelib`; owns no scene logic.

use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;
use wgpu::{
    util::DeviceExt,
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device, DeviceDescriptor,
    Extent3d, Features, FilterMode, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp,
    Operations, PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    SamplerBindingType, SamplerDescriptor, ShaderModuleDescriptor, ShaderSource, ShaderStages,
    StoreOp, Surface, SurfaceConfiguration, SurfaceError, TexelCopyBufferLayout,
    TexelCopyTextureInfo, TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType,
    TextureUsages, TextureView, TextureViewDescriptor, TextureViewDimension, VertexBufferLayout,
    VertexState, VertexStepMode,
};

use winit::window::Window;

use asset::{MeshData, TextureData, unit_cube};
use corelib::{ComposedFrame, Mat4, ShadingMode};

/// Startup failures at the GPU boundary. Anything past init is either a
/// per-frame [`SurfaceError`] or infallible.
#[derive(Debug, Error)]
pub enum RenderInitError {
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to acquire GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Vertex attribute contract: 0=position, 1=color, 2=normal, 3=uv.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x3,
            3 => Float32x2,
        ],
    };
}

/// Per-frame UBO. Must match the WGSL `FrameUniforms` block: mat3 columns
/// are vec4-aligned, and the struct rounds up to 128 bytes.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FrameUniforms {
    mvp: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    light_dir: [f32; 3],
    _pad: f32,
}

/// Clip-space z remap: corelib emits GL-convention NDC z in [-1, 1],
/// wgpu clips to [0, 1]. z' = 0.5*z + 0.5*w.
const OPENGL_TO_WGPU: Mat4 = Mat4::from_cols_array([
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

fn frame_uniforms(frame: &ComposedFrame) -> FrameUniforms {
    let mvp = (OPENGL_TO_WGPU * frame.mvp).to_cols_array_2d();

    let (normal, light_dir) = match frame.lighting {
        Some(lighting) => {
            let n = lighting.normal.to_cols_array();
            (
                [
                    [n[0], n[1], n[2], 0.0],
                    [n[3], n[4], n[5], 0.0],
                    [n[6], n[7], n[8], 0.0],
                ],
                lighting.light_dir,
            )
        }
        // Flat frames never read these; keep the buffer well-defined.
        None => (
            [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ],
            [0.0, 0.0, 1.0],
        ),
    };

    FrameUniforms {
        mvp,
        normal,
        light_dir,
        _pad: 0.0,
    }
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const TEXTURE_SIZE: u32 = 256;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.12,
    a: 1.0,
};

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    #[allow(dead_code)]
    surface_format: TextureFormat,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline & geometry
    pipeline: RenderPipeline,
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,

    // Per-frame uniforms
    #[allow(dead_code)]
    frame_bgl: BindGroupLayout,
    frame_bg: BindGroup,
    frame_buf: Buffer,

    // Lit mode only: checker texture + sampler
    texture_bg: Option<BindGroup>,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window>.
    pub async fn new(
        window: Arc<Window>,
        backends: wgpu::Backends,
        shading: ShadingMode,
    ) -> Result<Self, RenderInitError> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Adapter: {:?}", adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Kubar3D Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        // Configure surface
        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        // Depth texture
        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let shader_src: &str = match shading {
            ShadingMode::Flat => include_str!("shaders/cube_flat.wgsl"),
            ShadingMode::Lit => include_str!("shaders/cube_lit.wgsl"),
        };
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Cube WGSL"),
            source: ShaderSource::Wgsl(shader_src.into()),
        });

        // ==== Frame uniforms BGL/BG ====
        let frame_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Frame BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        NonZeroU64::new(std::mem::size_of::<FrameUniforms>() as u64).unwrap(),
                    ),
                },
                count: None,
            }],
        });

        // Identity until the first composed frame arrives.
        let frame_init = frame_uniforms(&ComposedFrame {
            mvp: Mat4::IDENTITY,
            lighting: None,
        });
        let frame_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame UBO"),
            contents: bytemuck::bytes_of(&frame_init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let frame_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame BG"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buf.as_entire_binding(),
            }],
        });

        // ==== Lit mode: checker texture + sampler ====
        let (texture_bgl, texture_bg) = match shading {
            ShadingMode::Flat => (None, None),
            ShadingMode::Lit => {
                let (bgl, bg) =
                    create_texture_binding(&device, &queue, &TextureData::checkerboard(TEXTURE_SIZE));
                (Some(bgl), Some(bg))
            }
        };

        // ==== Pipeline ====
        let mut bgls: Vec<&BindGroupLayout> = vec![&frame_bgl];
        if let Some(bgl) = &texture_bgl {
            bgls.push(bgl);
        }
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Cube PipelineLayout"),
            bind_group_layouts: &bgls,
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Cube Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                // The shared-corner cube has mixed winding; culling would
                // drop half its faces.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ==== Geometry: indexed cube ====
        let mesh = unit_cube();
        let vertices = vertex_data(&mesh);
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube VB"),
            contents: bytemuck::cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube IB"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: BufferUsages::INDEX,
        });

        Ok(Self {
            surface,
            surface_format,
            surface_config,
            device,
            queue,
            pipeline,
            vertex_buf,
            index_buf,
            index_count: mesh.indices.len() as u32,
            frame_bgl,
            frame_bg,
            frame_buf,
            texture_bg,
            depth_view,
            width,
            height,
        })
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    /// Render one frame: upload the composed uniforms, clear, draw the cube.
    pub fn render(&mut self, frame: &ComposedFrame) -> Result<(), SurfaceError> {
        self.queue
            .write_buffer(&self.frame_buf, 0, bytemuck::bytes_of(&frame_uniforms(frame)));

        let surface_tex = self.surface.get_current_texture()?;
        let view = surface_tex.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.frame_bg, &[]);
            if let Some(texture_bg) = &self.texture_bg {
                rpass.set_bind_group(1, texture_bg, &[]);
            }
            rpass.set_vertex_buffer(0, self.vertex_buf.slice(..));
            rpass.set_index_buffer(self.index_buf.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..self.index_count, 0, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        surface_tex.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

/// Upload texture data and build the lit-mode bind group (texture + sampler).
fn create_texture_binding(
    device: &Device,
    queue: &Queue,
    data: &TextureData,
) -> (BindGroupLayout, BindGroup) {
    let extent = Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&TextureDescriptor {
        label: Some("CheckerTex"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Rgba8UnormSrgb,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data.data,
        TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(data.width * data.bytes_per_pixel()),
            rows_per_image: Some(data.height),
        },
        extent,
    );
    let view = texture.create_view(&TextureViewDescriptor::default());

    let sampler = device.create_sampler(&SamplerDescriptor {
        label: Some("CheckerSampler"),
        mag_filter: FilterMode::Nearest,
        min_filter: FilterMode::Linear,
        ..Default::default()
    });

    let bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("Texture BGL"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });
    let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Texture BG"),
        layout: &bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });
    (bgl, bg)
}

/// Interleave mesh data for the vertex buffer.
fn vertex_data(mesh: &MeshData) -> Vec<Vertex> {
    mesh.vertices
        .iter()
        .map(|v| Vertex {
            pos: v.position,
            color: v.color,
            normal: v.normal,
            uv: v.uv,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{FrameComposer, FrameLighting, Mat3, SceneState};

    #[test]
    fn uniform_struct_matches_wgsl_block_layout() {
        // mat4 (64) + padded mat3 (48) + vec3 (12) + pad (4).
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 128);
    }

    #[test]
    fn vertex_layout_matches_attribute_contract() {
        assert_eq!(Vertex::LAYOUT.array_stride, 44);
        assert_eq!(Vertex::LAYOUT.attributes.len(), 4);
        for (i, attr) in Vertex::LAYOUT.attributes.iter().enumerate() {
            assert_eq!(attr.shader_location, i as u32);
        }
    }

    #[test]
    fn ndc_remap_takes_gl_near_plane_to_zero() {
        let composer = FrameComposer::new(ShadingMode::Flat);
        let mut scene = SceneState::new();
        let frame = composer.compose(&mut scene, 0.0);

        let remapped = OPENGL_TO_WGPU * frame.mvp;
        // The near plane sits 0.1 in front of the camera at z = -6.
        let clip = remapped.mul_vec4([0.0, 0.0, 6.0 - 0.1, 1.0]);
        assert!((clip[2] / clip[3]).abs() < 1e-5);
    }

    #[test]
    fn lit_uniforms_carry_padded_normal_columns() {
        let frame = ComposedFrame {
            mvp: Mat4::IDENTITY,
            lighting: Some(FrameLighting {
                normal: Mat3::from_rotation_y(2.0),
                light_dir: [0.4, 0.6, 0.7],
            }),
        };
        let u = frame_uniforms(&frame);
        let n = Mat3::from_rotation_y(2.0).to_cols_array();
        for col in 0..3 {
            for row in 0..3 {
                assert_eq!(u.normal[col][row], n[col * 3 + row]);
            }
            assert_eq!(u.normal[col][3], 0.0);
        }
        assert_eq!(u.light_dir, [0.4, 0.6, 0.7]);
    }

    #[test]
    fn identity_frame_uploads_the_remap_itself() {
        let u = frame_uniforms(&ComposedFrame {
            mvp: Mat4::IDENTITY,
            lighting: None,
        });
        assert_eq!(u.mvp[2][2], 0.5);
        assert_eq!(u.mvp[3][2], 0.5);
        assert_eq!(u.mvp[0][0], 1.0);
    }
}
