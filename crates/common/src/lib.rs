//! Shared types and configuration for the cabin scene viewer.

pub mod config;
pub mod types;

pub use config::{
    CameraConfig, ConfigError, FallbackShape, InputConfig, MeshConfig, MovementMode, SceneConfig,
    ViewerConfig, WindowConfig,
};
pub use types::{SceneBounds, Transform};
