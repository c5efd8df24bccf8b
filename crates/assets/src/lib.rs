//! Scene assets: Wavefront OBJ meshes, textures and procedural fallbacks.
//!
//! Assets are loaded once at startup. A mesh file that does not exist is
//! replaced by its configured procedural fallback so the viewer always has
//! something to draw.

mod mesh;
mod texture;

pub use mesh::{MeshData, MeshStats};
pub use texture::TextureData;

use cabinview_common::{FallbackShape, MeshConfig, SceneConfig, Transform};
use std::path::{Path, PathBuf};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("OBJ load error: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("mesh has no faces: {}", .0.display())]
    Empty(PathBuf),
}

/// How many times the fallback terrain texture repeats along an edge.
const TERRAIN_TILES: f32 = 8.0;
const SAND: ([u8; 4], [u8; 4]) = ([222, 196, 145, 255], [204, 176, 124, 255]);
const WOOD: ([u8; 4], [u8; 4]) = ([133, 94, 66, 255], [110, 76, 52, 255]);
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// A loaded mesh ready for upload.
#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub name: String,
    pub transform: Transform,
    pub mesh: MeshData,
    /// `None` means draw with a plain white texture.
    pub texture: Option<TextureData>,
}

impl SceneMesh {
    /// Load the mesh described by `config`, substituting the fallback shape
    /// when the OBJ file is absent. Returns `Ok(None)` when there is nothing
    /// to draw.
    pub fn load(config: &MeshConfig) -> Result<Option<Self>, AssetError> {
        let mesh = match config.obj.as_deref() {
            Some(path) if path.exists() => MeshData::load_obj(path)?,
            Some(path) => {
                tracing::warn!(
                    "{}: {} not found, using {:?} fallback",
                    config.name,
                    path.display(),
                    config.fallback
                );
                match fallback_mesh(config.fallback) {
                    Some(mesh) => mesh,
                    None => return Ok(None),
                }
            }
            None => match fallback_mesh(config.fallback) {
                Some(mesh) => mesh,
                None => return Ok(None),
            },
        };

        let texture = load_texture(config);
        Ok(Some(Self {
            name: config.name.clone(),
            transform: config.transform,
            mesh,
            texture,
        }))
    }
}

fn fallback_mesh(shape: FallbackShape) -> Option<MeshData> {
    match shape {
        FallbackShape::Terrain => Some(MeshData::terrain_plane(TERRAIN_TILES)),
        FallbackShape::Cabin => Some(MeshData::cabin()),
        FallbackShape::None => None,
    }
}

fn fallback_texture(shape: FallbackShape) -> Option<TextureData> {
    let (a, b) = match shape {
        FallbackShape::Terrain => SAND,
        FallbackShape::Cabin => WOOD,
        FallbackShape::None => return None,
    };
    Some(TextureData::checkerboard(64, 8, a, b))
}

// Texture problems never abort loading; the mesh is still drawn.
fn load_texture(config: &MeshConfig) -> Option<TextureData> {
    let Some(path) = config.texture.as_deref() else {
        return fallback_texture(config.fallback);
    };
    match TextureData::load(path) {
        Ok(texture) => Some(texture),
        Err(e) => {
            tracing::warn!("{}: texture {}: {e}", config.name, path.display());
            fallback_texture(config.fallback)
        }
    }
}

/// Load every mesh in the scene. Meshes that fail to load are logged and
/// skipped.
pub fn load_scene(config: &SceneConfig) -> Vec<SceneMesh> {
    let meshes: Vec<SceneMesh> = config
        .meshes
        .iter()
        .filter_map(|mc| match SceneMesh::load(mc) {
            Ok(mesh) => mesh,
            Err(e) => {
                tracing::error!("failed to load mesh {}: {e}", mc.name);
                None
            }
        })
        .collect();

    let vertices: usize = meshes.iter().map(|m| m.mesh.vertex_count()).sum();
    tracing::info!("scene has {} meshes, {vertices} vertices", meshes.len());
    meshes
}

/// Load a single OBJ file for inspection.
pub fn inspect_obj(path: impl AsRef<Path>) -> Result<MeshStats, AssetError> {
    Ok(MeshData::load_obj(path)?.stats())
}

pub fn crate_info() -> &'static str {
    "cabinview-assets v0.1.0"
}
