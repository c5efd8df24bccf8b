use crate::AssetError;
use glam::{Vec2, Vec3};
use serde::Serialize;
use std::path::Path;

/// Indexed triangle mesh with one texture coordinate per vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    /// Texture coordinates with v pointing down the image.
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// Summary used by the CLI and startup logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshStats {
    pub vertices: usize,
    pub triangles: usize,
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Axis-aligned extent of the positions, `None` for an empty mesh.
    pub fn extent(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    pub fn stats(&self) -> MeshStats {
        let (min, max) = self.extent().unwrap_or((Vec3::ZERO, Vec3::ZERO));
        MeshStats {
            vertices: self.vertex_count(),
            triangles: self.triangle_count(),
            min: min.to_array(),
            max: max.to_array(),
        }
    }

    /// Load every object in a Wavefront OBJ file into a single mesh.
    ///
    /// Faces are triangulated. Missing texture coordinates become (0, 0).
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )?;
        if let Err(e) = materials {
            tracing::debug!("no materials for {}: {e}", path.display());
        }

        let mut mesh = MeshData::default();
        for model in &models {
            let m = &model.mesh;
            let base = mesh.positions.len() as u32;
            let count = m.positions.len() / 3;
            mesh.positions
                .extend(m.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));
            if m.texcoords.len() / 2 == count {
                // OBJ puts v = 0 at the bottom of the image.
                mesh.uvs
                    .extend(m.texcoords.chunks_exact(2).map(|t| [t[0], 1.0 - t[1]]));
            } else {
                mesh.uvs.extend(std::iter::repeat_n([0.0, 0.0], count));
            }
            mesh.indices.extend(m.indices.iter().map(|i| base + i));
            tracing::trace!("object {} has {} vertices", model.name, count);
        }

        if mesh.is_empty() {
            return Err(AssetError::Empty(path.to_path_buf()));
        }
        tracing::debug!(
            "loaded {} ({} vertices, {} triangles)",
            path.display(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Flat ground plane spanning [-1, 1] on x and z at y = 0. The texture
    /// repeats `tiles` times along each edge.
    pub fn terrain_plane(tiles: f32) -> Self {
        let mut mesh = MeshData::default();
        mesh.push_quad(
            [
                Vec3::new(-1.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(-1.0, 0.0, -1.0),
            ],
            Vec2::splat(tiles),
        );
        mesh
    }

    /// Box walls with a gabled roof, sized for a model scale of 0.1.
    pub fn cabin() -> Self {
        let (hx, hz, wall, ridge) = (20.0, 15.0, 25.0, 40.0);
        let corner = Vec3::new;
        let mut mesh = MeshData::default();
        let tiles = Vec2::new(4.0, 3.0);

        // Walls, counter-clockwise seen from outside.
        mesh.push_quad(
            [corner(-hx, 0.0, hz), corner(hx, 0.0, hz), corner(hx, wall, hz), corner(-hx, wall, hz)],
            tiles,
        );
        mesh.push_quad(
            [corner(hx, 0.0, -hz), corner(-hx, 0.0, -hz), corner(-hx, wall, -hz), corner(hx, wall, -hz)],
            tiles,
        );
        mesh.push_quad(
            [corner(hx, 0.0, hz), corner(hx, 0.0, -hz), corner(hx, wall, -hz), corner(hx, wall, hz)],
            tiles,
        );
        mesh.push_quad(
            [corner(-hx, 0.0, -hz), corner(-hx, 0.0, hz), corner(-hx, wall, hz), corner(-hx, wall, -hz)],
            tiles,
        );

        // Roof slopes meet at a ridge running along x.
        mesh.push_quad(
            [corner(-hx, wall, hz), corner(hx, wall, hz), corner(hx, ridge, 0.0), corner(-hx, ridge, 0.0)],
            tiles,
        );
        mesh.push_quad(
            [corner(hx, wall, -hz), corner(-hx, wall, -hz), corner(-hx, ridge, 0.0), corner(hx, ridge, 0.0)],
            tiles,
        );

        // Gable ends.
        mesh.push_triangle(
            [corner(hx, wall, hz), corner(hx, wall, -hz), corner(hx, ridge, 0.0)],
            tiles,
        );
        mesh.push_triangle(
            [corner(-hx, wall, -hz), corner(-hx, wall, hz), corner(-hx, ridge, 0.0)],
            tiles,
        );
        mesh
    }

    fn push_quad(&mut self, corners: [Vec3; 4], tiles: Vec2) {
        let base = self.positions.len() as u32;
        let uvs = [[0.0, tiles.y], [tiles.x, tiles.y], [tiles.x, 0.0], [0.0, 0.0]];
        for (p, uv) in corners.iter().zip(uvs) {
            self.positions.push(p.to_array());
            self.uvs.push(uv);
        }
        self.indices
            .extend([base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    fn push_triangle(&mut self, corners: [Vec3; 3], tiles: Vec2) {
        let base = self.positions.len() as u32;
        let uvs = [[0.0, tiles.y], [tiles.x, tiles.y], [tiles.x * 0.5, 0.0]];
        for (p, uv) in corners.iter().zip(uvs) {
            self.positions.push(p.to_array());
            self.uvs.push(uv);
        }
        self.indices.extend([base, base + 1, base + 2]);
    }
}
