//! Per-frame orchestration: animate, upload uniforms, then draw the skybox,
//! the lit scene, the voxel terrain and the overlay in one pass.

use instant::{Duration, Instant};

use crate::context::{Context, DAY_COLOR, NIGHT_COLOR};
use crate::data_structures::block::VoxelBlocks;
use crate::data_structures::scene_graph::lerp_color;
use crate::engine::Engine;
use crate::pipelines::phong::LightsUniform;

/// Full sunrise-to-sunrise period of the day/night blend.
const DAY_CYCLE_SECS: f32 = 120.0;

#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    pub frame_time: Duration,
    pub draw_calls: u32,
}

pub struct Renderer {
    start: Instant,
    last_frame: Instant,
    blocks: Option<VoxelBlocks>,
    pub day_night_cycle: bool,
    pub stats: FrameStats,
}

impl Renderer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            blocks: None,
            day_night_cycle: false,
            stats: FrameStats::default(),
        }
    }

    pub fn render(&mut self, ctx: &mut Context, engine: &mut Engine) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let frame_time = now - self.last_frame;
        self.last_frame = now;
        let seconds = (now - self.start).as_secs_f32();

        if engine.scene.state.lights_animated {
            engine.scene.orbit_lights(seconds);
        }
        if self.day_night_cycle {
            let t = (1.0 - (seconds * std::f32::consts::TAU / DAY_CYCLE_SECS).cos()) / 2.0;
            ctx.set_clear_color(lerp_color(DAY_COLOR, NIGHT_COLOR, t));
        }

        // Uniforms first, then per-object buffers, then the pass.
        ctx.camera_res.write(&ctx.queue, &engine.camera);
        ctx.lights_res.uniform = LightsUniform::from_scene(&engine.scene);
        ctx.queue.write_buffer(
            &ctx.lights_res.buffer,
            0,
            bytemuck::cast_slice(&[ctx.lights_res.uniform]),
        );

        if let Some(terrain) = engine.terrain.as_mut() {
            if terrain.take_dirty() {
                match self.blocks.as_mut() {
                    Some(blocks) => blocks.rebuild(&ctx.device, terrain.instances()),
                    None => {
                        self.blocks = Some(VoxelBlocks::new(&ctx.device, terrain.instances()));
                    }
                }
            }
        } else {
            self.blocks = None;
        }

        for object in engine.scene.objects.iter_mut() {
            object.prepare(&ctx.device, &ctx.queue);
        }
        for light in engine.scene.lights_mut() {
            light.marker.prepare(&ctx.device, &ctx.queue);
        }
        if let Some(skybox) = engine.scene.skybox.as_mut() {
            skybox.prepare(&ctx.device, &ctx.queue, &ctx.skybox_layout, &engine.camera);
        }
        if let Some(overlay) = engine.scene.overlay.as_mut() {
            overlay.prepare(&ctx.device);
        }

        let frame = ctx.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        let mut draw_calls = 0u32;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Background first so ordinary depth testing covers it up.
            if let Some(skybox) = engine.scene.skybox.as_ref() {
                if skybox.is_ready() {
                    render_pass.set_pipeline(&ctx.pipelines.skybox);
                    if skybox.draw(&mut render_pass) {
                        draw_calls += 1;
                    }
                }
            }

            render_pass.set_pipeline(&ctx.pipelines.phong);
            render_pass.set_bind_group(0, &ctx.texture_pack.bind_group, &[]);
            render_pass.set_bind_group(1, &ctx.camera_res.bind_group, &[]);
            render_pass.set_bind_group(2, &ctx.lights_res.bind_group, &[]);
            for object in engine.scene.objects.iter() {
                if object.draw(&mut render_pass) {
                    draw_calls += 1;
                }
            }
            if let Some(blocks) = self.blocks.as_ref() {
                if blocks.draw(&mut render_pass) {
                    draw_calls += 1;
                }
            }
            for light in engine.scene.lights() {
                if light.enabled && light.marker.draw(&mut render_pass) {
                    draw_calls += 1;
                }
            }

            if let Some(overlay) = engine.scene.overlay.as_ref() {
                render_pass.set_pipeline(&ctx.pipelines.overlay);
                if overlay.draw(&mut render_pass) {
                    draw_calls += 1;
                }
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        self.stats = FrameStats {
            frame_time,
            draw_calls,
        };
        Ok(())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
