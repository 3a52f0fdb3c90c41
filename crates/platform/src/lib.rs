//! Platform layer: windowing & event loop.
//! Owns the scene state and frame composer; each redraw measures dt,
//! composes a frame, and hands it to the renderer.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use corelib::{FrameComposer, SceneState, ShadingMode};
use renderer::GpuState;

/// Seconds between FPS readouts in the window title.
const FPS_TITLE_INTERVAL: f32 = 0.5;

struct App {
    backends: wgpu::Backends,
    show_fps: bool,
    width: u32,
    height: u32,

    scene: SceneState,
    composer: FrameComposer,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    last_frame: Option<Instant>,

    fps_accum_secs: f32,
    fps_accum_frames: u32,

    init_error: Option<anyhow::Error>,
}

impl App {
    fn new(
        backends: wgpu::Backends,
        shading: ShadingMode,
        show_fps: bool,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            backends,
            show_fps,
            width,
            height,
            scene: SceneState::new(),
            composer: FrameComposer::new(shading),
            window: None,
            gpu: None,
            last_frame: None,
            fps_accum_secs: 0.0,
            fps_accum_frames: 0,
            init_error: None,
        }
    }

    fn update_fps_title(&mut self, dt: f32) {
        self.fps_accum_secs += dt;
        self.fps_accum_frames += 1;
        if self.fps_accum_secs >= FPS_TITLE_INTERVAL {
            let fps = self.fps_accum_frames as f32 / self.fps_accum_secs;
            if let Some(window) = &self.window {
                window.set_title(&format!("Kubar3D - fps ~{fps:.0}"));
            }
            self.fps_accum_secs = 0.0;
            self.fps_accum_frames = 0;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Kubar3D")
            .with_inner_size(PhysicalSize::new(self.width, self.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("Failed to create window"),
        );

        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);
        self.scene.set_viewport(size.width, size.height);

        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.backends,
            self.composer.shading(),
        ));
        match gpu {
            Ok(gpu) => {
                self.gpu = Some(gpu);
                self.window = Some(window);
            }
            Err(e) => {
                log::error!("GPU init failed: {e}");
                self.init_error = Some(e.into());
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Resized: {}x{}", new_size.width, new_size.height);
                // Takes effect on the next composed frame.
                self.scene.set_viewport(new_size.width, new_size.height);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(gpu) = self.gpu.as_mut() else {
                    return;
                };

                let now = Instant::now();
                let dt = match self.last_frame {
                    Some(prev) => (now - prev).as_secs_f32(),
                    None => 0.0,
                };
                self.last_frame = Some(now);

                let frame = self.composer.compose(&mut self.scene, dt);
                match gpu.render(&frame) {
                    Ok(()) => {}
                    Err(e) if GpuState::is_surface_lost(&e) => {
                        log::warn!("Surface lost/outdated, reconfiguring.");
                        gpu.recreate_surface();
                    }
                    Err(e) => log::error!("Render error: {e}"),
                }

                if self.show_fps {
                    self.update_fps_title(dt);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Continuous animation: one redraw per loop turn.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Run the window + renderer until the window is closed.
/// Fails fast if the GPU cannot be initialized.
pub fn run_with_renderer(
    backends: wgpu::Backends,
    shading: ShadingMode,
    show_fps: bool,
    width: u32,
    height: u32,
) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(backends, shading, show_fps, width, height);
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.init_error.take() {
        return Err(err);
    }
    Ok(())
}
