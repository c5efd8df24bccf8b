//! Rendering Adapter: camera controller and renderer-agnostic interface.
//!
//! # Invariants
//! - Camera math is pure; uploading matrices is a separate step through a
//!   [`UniformSink`], so it can be tested without a graphics context.
//! - The camera eye is clamped into the scene bounds on every update.
//! - Matrices follow OpenGL conventions; GPU backends convert clip space.

mod camera;
mod look;
mod renderer;
pub mod uniforms;

pub use camera::{Camera, CameraMatrices};
pub use look::MouseLook;
pub use renderer::{DebugTextRenderer, DrawItem, Renderer};
pub use uniforms::{RecordingSink, UniformSink};

pub fn crate_info() -> &'static str {
    "cabinview-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
