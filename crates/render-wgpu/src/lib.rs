//! wgpu render backend for the cabin viewer.
//!
//! Draws textured meshes with a single MVP shader. Camera matrices arrive
//! through [`cabinview_render::UniformSink`]; model matrices come from each
//! mesh's transform.
//!
//! # Invariants
//! - Projections are supplied in OpenGL clip convention and converted here.
//! - Meshes are uploaded once per scene; the renderer never edits geometry.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::{OPENGL_TO_WGPU, WgpuRenderer};
pub use mesh::GpuMesh;
pub use shaders::{SCENE_SHADER, ShaderError, validate_wgsl};
