//! GPU context: surface, device, queue and everything with a fixed lifetime
//! over the whole run (pipelines, bind group layouts, the texture pack).

use std::sync::Arc;

use anyhow::Result;
use winit::window::Window;

use crate::camera::CameraResources;
use crate::data_structures::texture::Texture;
use crate::pipelines::phong::{
    mk_lights_bind_group, mk_lights_bind_group_layout, mk_lights_buffer, mk_texture_pack_layout,
    LightsUniform,
};
use crate::pipelines::{overlay, phong, skybox};

/// Daylight sky, the default clear color.
pub const DAY_COLOR: [f32; 3] = [0.53, 0.81, 0.92];
pub const NIGHT_COLOR: [f32; 3] = [0.2, 0.2, 0.2];

/// Three sampled texture slots sharing one bind group. Slots start as 1x1
/// white placeholders so the pipeline is usable before any asset arrives.
pub struct TexturePack {
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    textures: [Texture; 3],
}

impl TexturePack {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let layout = mk_texture_pack_layout(device);
        let textures = [
            Texture::placeholder(device, queue),
            Texture::placeholder(device, queue),
            Texture::placeholder(device, queue),
        ];
        let bind_group = Self::mk_bind_group(device, &layout, &textures);
        Self {
            layout,
            bind_group,
            textures,
        }
    }

    /// Replace one slot and rebuild the bind group.
    pub fn set_slot(&mut self, device: &wgpu::Device, slot: usize, texture: Texture) {
        if slot >= self.textures.len() {
            log::warn!("texture slot {slot} does not exist, ignoring");
            return;
        }
        self.textures[slot] = texture;
        self.bind_group = Self::mk_bind_group(device, &self.layout, &self.textures);
    }

    fn mk_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        textures: &[Texture; 3],
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture pack bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&textures[0].view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&textures[1].view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&textures[2].view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&textures[0].sampler),
                },
            ],
        })
    }
}

pub struct LightsResources {
    pub uniform: LightsUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

pub struct Pipelines {
    pub phong: wgpu::RenderPipeline,
    pub skybox: wgpu::RenderPipeline,
    pub overlay: wgpu::RenderPipeline,
}

pub struct Context {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub depth_texture: Texture,
    pub camera_res: CameraResources,
    pub lights_res: LightsResources,
    pub texture_pack: TexturePack,
    pub skybox_layout: wgpu::BindGroupLayout,
    pub pipelines: Pipelines,
    pub clear_color: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = Texture::create_depth_texture(&device, &config, "depth texture");
        let camera_res = CameraResources::new(&device);

        let lights_uniform = LightsUniform::new();
        let lights_buffer = mk_lights_buffer(&device, &lights_uniform);
        let lights_layout = mk_lights_bind_group_layout(&device);
        let lights_bind_group = mk_lights_bind_group(&device, &lights_layout, &lights_buffer);
        let lights_res = LightsResources {
            uniform: lights_uniform,
            buffer: lights_buffer,
            bind_group_layout: lights_layout,
            bind_group: lights_bind_group,
        };

        let texture_pack = TexturePack::new(&device, &queue);
        let skybox_layout = skybox::mk_bind_group_layout(&device);

        let pipelines = Pipelines {
            phong: phong::mk_pipeline(
                &device,
                &config,
                &texture_pack.layout,
                &camera_res.bind_group_layout,
                &lights_res.bind_group_layout,
            ),
            skybox: skybox::mk_pipeline(&device, &config, &skybox_layout),
            overlay: overlay::mk_pipeline(&device, &config),
        };

        let [r, g, b] = DAY_COLOR;
        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_texture,
            camera_res,
            lights_res,
            texture_pack,
            skybox_layout,
            pipelines,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
        })
    }

    /// Reconfigure the surface and depth texture. The caller is expected to
    /// push the new aspect ratio into the camera as well.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, &self.config, "depth texture");
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn set_clear_color(&mut self, [r, g, b]: [f32; 3]) {
        self.clear_color = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };
    }
}
