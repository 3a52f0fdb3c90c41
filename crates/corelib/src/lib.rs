//! Core math and frame composition: column-major matrices, scene state,
//! per-frame MVP + normal-matrix derivation.

pub mod mat;
pub mod scene;

pub use mat::{Mat3, Mat4};
pub use scene::{ComposedFrame, FrameComposer, FrameLighting, SceneState, ShadingMode};
