use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Placement of a mesh in the scene: translation and non-uniform scale.
///
/// Scene meshes are never rotated, so the model matrix is `T * S`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// Replace the scale factors, keeping the translation.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.scale = Vec3::new(x, y, z);
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_scale(self.scale)
    }
}

/// Axis-aligned box the camera eye is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl SceneBounds {
    /// Horizontal half extent of the walkable area.
    pub const HALF_EXTENT: f32 = 14.0;
    /// Lowest eye height, just above the terrain.
    pub const FLOOR: f32 = 0.1;
    pub const CEILING: f32 = 14.0;

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Clamp each axis independently into `[min, max]`.
    pub fn clamp(&self, point: Vec3) -> Vec3 {
        point.max(self.min).min(self.max)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

impl Default for SceneBounds {
    fn default() -> Self {
        Self {
            min: Vec3::new(-Self::HALF_EXTENT, Self::FLOOR, -Self::HALF_EXTENT),
            max: Vec3::new(Self::HALF_EXTENT, Self::CEILING, Self::HALF_EXTENT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.translation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn transform_scale_applies_to_points() {
        let mut t = Transform::default();
        t.scale(0.1, 0.1, 0.1);
        let p = t.model_matrix().transform_point3(Vec3::new(10.0, 20.0, 30.0));
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));
    }

    #[test]
    fn transform_scales_before_translating() {
        let t = Transform {
            translation: Vec3::new(1.0, 0.0, 0.0),
            scale: Vec3::splat(2.0),
        };
        let p = t.model_matrix().transform_point3(Vec3::new(1.0, 1.0, 1.0));
        assert!(p.abs_diff_eq(Vec3::new(3.0, 2.0, 2.0), 1e-6));
    }

    #[test]
    fn default_bounds_match_walkable_area() {
        let b = SceneBounds::default();
        assert_eq!(b.min, Vec3::new(-14.0, 0.1, -14.0));
        assert_eq!(b.max, Vec3::new(14.0, 14.0, 14.0));
    }

    #[test]
    fn clamp_pulls_points_inside() {
        let b = SceneBounds::default();
        let p = b.clamp(Vec3::new(100.0, -3.0, -20.0));
        assert_eq!(p, Vec3::new(14.0, 0.1, -14.0));
        assert!(b.contains(p));
    }

    #[test]
    fn clamp_keeps_inside_points() {
        let b = SceneBounds::default();
        let p = Vec3::new(1.0, 5.0, -2.0);
        assert_eq!(b.clamp(p), p);
    }
}
