//! Scene state and per-frame transform composition.

use crate::mat::{Mat3, Mat4};

/// Vertical field of view, radians (60 degrees).
const FOV_Y: f32 = 60.0 * std::f32::consts::PI / 180.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;
/// The cube sits this far down the view axis.
const CAMERA_OFFSET_Z: f32 = -6.0;
/// Directional light. Not normalized here — the shading stage normalizes.
const LIGHT_DIR: [f32; 3] = [0.4, 0.6, 0.7];

/// Which frame variant the composer produces: plain vertex colors, or
/// lit + textured (normal matrix and light direction included).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadingMode {
    Flat,
    Lit,
}

/// Mutable per-scene state: one rotation angle plus the viewport size.
///
/// The angle grows without bound and wraps implicitly through the
/// periodic trig in the rotation constructors.
#[derive(Clone, Copy, Debug)]
pub struct SceneState {
    angle: f32,
    viewport_width: u32,
    viewport_height: u32,
}

impl SceneState {
    /// Angle 0, viewport 1x1 — a defined aspect ratio even before the
    /// host reports a real surface size.
    pub fn new() -> Self {
        Self {
            angle: 0.0,
            viewport_width: 1,
            viewport_height: 1,
        }
    }

    /// Store new surface dimensions. Callable at any time, including
    /// before the first frame; takes effect on the next compose.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// width / height, or 1.0 while the viewport is degenerate.
    pub fn aspect(&self) -> f32 {
        if self.viewport_height > 0 {
            self.viewport_width as f32 / self.viewport_height as f32
        } else {
            1.0
        }
    }
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new()
    }
}

/// Lighting payload of a lit frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameLighting {
    pub normal: Mat3,
    pub light_dir: [f32; 3],
}

/// Everything the render dispatch needs for one draw call.
#[derive(Clone, Copy, Debug)]
pub struct ComposedFrame {
    pub mvp: Mat4,
    pub lighting: Option<FrameLighting>,
}

/// Derives the per-frame matrices from [`SceneState`].
#[derive(Clone, Copy, Debug)]
pub struct FrameComposer {
    shading: ShadingMode,
}

impl FrameComposer {
    pub fn new(shading: ShadingMode) -> Self {
        Self { shading }
    }

    #[inline]
    pub fn shading(&self) -> ShadingMode {
        self.shading
    }

    /// Advance the scene by `dt` seconds and build the frame transforms.
    /// The angle update is the only mutation anywhere in the core.
    pub fn compose(&self, scene: &mut SceneState, dt: f32) -> ComposedFrame {
        scene.angle += dt;

        let projection = Mat4::perspective_rh(FOV_Y, scene.aspect(), Z_NEAR, Z_FAR);
        let view = Mat4::from_translation(0.0, 0.0, CAMERA_OFFSET_Z);
        let model = Mat4::from_rotation_y(scene.angle);
        // view * model: spin the cube about its own center, then push it
        // down the view axis. Swapped, it would orbit the world origin.
        let mvp = projection * (view * model);

        let lighting = match self.shading {
            ShadingMode::Flat => None,
            ShadingMode::Lit => Some(FrameLighting {
                normal: Mat3::from_rotation_y(scene.angle),
                light_dir: LIGHT_DIR,
            }),
        };

        ComposedFrame { mvp, lighting }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_accumulates_dt() {
        let composer = FrameComposer::new(ShadingMode::Flat);
        let mut scene = SceneState::new();
        let dts = [1.0, 0.5, 0.25, 0.0, 2.25];
        for dt in dts {
            composer.compose(&mut scene, dt);
        }
        let total: f32 = dts.iter().sum();
        assert!((scene.angle() - total).abs() < 1e-5 * total);
    }

    #[test]
    fn fresh_state_is_zero_angle_unit_viewport() {
        let scene = SceneState::new();
        assert_eq!(scene.angle(), 0.0);
        assert_eq!(scene.aspect(), 1.0);
    }

    #[test]
    fn zero_height_viewport_falls_back_to_square_aspect() {
        let mut scene = SceneState::new();
        scene.set_viewport(800, 0);
        assert_eq!(scene.aspect(), 1.0);
        assert!(scene.aspect().is_finite());
    }

    #[test]
    fn aspect_follows_viewport() {
        let mut scene = SceneState::new();
        scene.set_viewport(800, 600);
        assert!((scene.aspect() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn flat_frames_carry_no_lighting() {
        let composer = FrameComposer::new(ShadingMode::Flat);
        let mut scene = SceneState::new();
        let frame = composer.compose(&mut scene, 0.016);
        assert!(frame.lighting.is_none());
    }

    #[test]
    fn lit_frames_carry_rotation_and_light() {
        let composer = FrameComposer::new(ShadingMode::Lit);
        let mut scene = SceneState::new();
        let frame = composer.compose(&mut scene, 2.0);

        let lighting = frame.lighting.expect("lit mode must produce lighting");
        assert_eq!(lighting.light_dir, [0.4, 0.6, 0.7]);

        let n = lighting.normal.to_cols_array();
        let (s, c) = 2.0_f32.sin_cos();
        assert!((n[0] - c).abs() < 1e-6);
        assert!((n[6] - s).abs() < 1e-6);
    }
}
