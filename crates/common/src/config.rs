use crate::types::{SceneBounds, Transform};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading or saving a viewer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level viewer configuration.
///
/// Every field has a default, so an empty YAML document is a valid config
/// and reproduces the stock cabin scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Cabin Scene".into(),
            width: 1000,
            height: 1000,
            vsync: true,
        }
    }
}

/// Initial camera pose, projection and motion tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Initial look direction. Need not be normalized.
    pub front: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Replaced by the window aspect ratio once a window exists.
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    pub free_camera: bool,
    /// World units per second.
    pub speed: f32,
    /// Degrees of yaw/pitch per pixel per second.
    pub sensitivity: f32,
    pub pitch_limit_degrees: f32,
    /// Speed factor while the sprint key is held.
    pub sprint_multiplier: f32,
    pub bounds: SceneBounds,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 10.0),
            front: Vec3::new(0.0, -5.0, -10.0),
            up: Vec3::Y,
            fov_degrees: 45.0,
            aspect_ratio: 1.0,
            near: 0.1,
            far: 100.0,
            free_camera: true,
            speed: 3.5,
            sensitivity: 2.5,
            pitch_limit_degrees: 89.9,
            sprint_multiplier: 2.0,
            bounds: SceneBounds::default(),
        }
    }
}

/// How movement keys translate into per-frame motion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    /// A press or key-repeat event moves the camera for exactly one frame.
    OneShot,
    /// The camera moves every frame while the key is down.
    #[default]
    Held,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub movement: MovementMode,
    /// Grab and hide the cursor at startup.
    pub grab_cursor: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            movement: MovementMode::default(),
            grab_cursor: true,
        }
    }
}

/// Procedural geometry substituted when a mesh file is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackShape {
    /// Flat textured ground plane.
    Terrain,
    /// Box with a pitched roof.
    Cabin,
    /// Skip the mesh entirely.
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeshConfig {
    pub name: String,
    pub obj: Option<PathBuf>,
    pub texture: Option<PathBuf>,
    pub fallback: FallbackShape,
    pub transform: Transform,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            name: "mesh".into(),
            obj: None,
            texture: None,
            fallback: FallbackShape::None,
            transform: Transform::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub clear_color: [f64; 4],
    pub wireframe: bool,
    pub meshes: Vec<MeshConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_color: [1.0, 1.0, 1.0, 1.0],
            wireframe: false,
            meshes: vec![
                MeshConfig {
                    name: "cabin".into(),
                    obj: Some(PathBuf::from("assets/cabin/cabin.obj")),
                    texture: Some(PathBuf::from("assets/cabin/wood_cabin_diffuse.jpg")),
                    fallback: FallbackShape::Cabin,
                    transform: Transform::from_scale(Vec3::splat(0.1)),
                },
                MeshConfig {
                    name: "terrain".into(),
                    obj: Some(PathBuf::from("assets/terrain/terrain.obj")),
                    texture: Some(PathBuf::from("assets/terrain/sand.jpg")),
                    fallback: FallbackShape::Terrain,
                    transform: Transform::from_scale(Vec3::splat(15.0)),
                },
            ],
        }
    }
}

impl ViewerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the camera cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limit = self.camera.pitch_limit_degrees;
        if !(0.0..90.0).contains(&limit) {
            return Err(ConfigError::Invalid {
                field: "camera.pitch_limit_degrees",
                reason: format!("{limit} is outside [0, 90)"),
            });
        }
        Ok(())
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load a config file. Relative asset paths are resolved against the
    /// directory containing the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&data)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        for mesh in &mut self.scene.meshes {
            for p in [&mut mesh.obj, &mut mesh.texture].into_iter().flatten() {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_stock_scene() {
        let c = ViewerConfig::default();
        assert_eq!(c.window.width, 1000);
        assert_eq!(c.camera.position, Vec3::new(0.0, 5.0, 10.0));
        assert_eq!(c.camera.fov_degrees, 45.0);
        assert_eq!(c.camera.speed, 3.5);
        assert_eq!(c.camera.sensitivity, 2.5);
        assert!(c.camera.free_camera);
        assert_eq!(c.scene.meshes.len(), 2);
        assert_eq!(c.scene.meshes[0].transform.scale, Vec3::splat(0.1));
        assert_eq!(c.scene.meshes[1].transform.scale, Vec3::splat(15.0));
    }

    #[test]
    fn empty_yaml_is_default() {
        let c = ViewerConfig::from_yaml_str("").unwrap();
        assert_eq!(c, ViewerConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_fields() {
        let yaml = "camera:\n  speed: 7.0\n  free_camera: false\ninput:\n  movement: one_shot\n";
        let c = ViewerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(c.camera.speed, 7.0);
        assert!(!c.camera.free_camera);
        assert_eq!(c.camera.near, 0.1);
        assert_eq!(c.input.movement, MovementMode::OneShot);
    }

    #[test]
    fn bounds_are_configurable() {
        let yaml = "camera:\n  bounds:\n    min: [-1.0, 0.0, -1.0]\n    max: [1.0, 2.0, 1.0]\n";
        let c = ViewerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(c.camera.bounds.max, Vec3::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = ViewerConfig::from_yaml_str("camera:\n  sped: 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn bad_pitch_limit_is_rejected() {
        for value in ["-10.0", ".nan", "90.0", ".inf"] {
            let yaml = format!("camera:\n  pitch_limit_degrees: {value}\n");
            let err = ViewerConfig::from_yaml_str(&yaml).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { field: "camera.pitch_limit_degrees", .. }),
                "{value} accepted"
            );
        }
        let c = ViewerConfig::from_yaml_str("camera:\n  pitch_limit_degrees: 45.0\n").unwrap();
        assert_eq!(c.camera.pitch_limit_degrees, 45.0);
    }

    #[test]
    fn cursor_is_grabbed_by_default() {
        assert!(ViewerConfig::default().input.grab_cursor);
        let c = ViewerConfig::from_yaml_str("input:\n  grab_cursor: false\n").unwrap();
        assert!(!c.input.grab_cursor);
    }

    #[test]
    fn yaml_round_trip() {
        let c = ViewerConfig::default();
        let yaml = c.to_yaml_string().unwrap();
        assert_eq!(ViewerConfig::from_yaml_str(&yaml).unwrap(), c);
    }

    #[test]
    fn load_resolves_relative_asset_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.yaml");
        std::fs::write(
            &path,
            "scene:\n  meshes:\n    - name: hut\n      obj: models/hut.obj\n      texture: /abs/wood.png\n",
        )
        .unwrap();

        let c = ViewerConfig::load(&path).unwrap();
        let mesh = &c.scene.meshes[0];
        assert_eq!(mesh.obj.as_deref(), Some(dir.path().join("models/hut.obj").as_path()));
        assert_eq!(mesh.texture.as_deref(), Some(Path::new("/abs/wood.png")));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ViewerConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
