use glam::Vec3;

/// Yaw/pitch mouse look, in degrees.
///
/// Yaw -90° looks down -Z. Pitch is clamped to `±pitch_limit` so the front
/// vector never becomes parallel to the up vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseLook {
    pub yaw: f32,
    pub pitch: f32,
    pub pitch_limit: f32,
}

impl Default for MouseLook {
    fn default() -> Self {
        Self {
            yaw: -90.0,
            pitch: 0.0,
            pitch_limit: Self::DEFAULT_PITCH_LIMIT,
        }
    }
}

impl MouseLook {
    pub const DEFAULT_PITCH_LIMIT: f32 = 89.9;

    /// Angles that reproduce `front`. A zero vector gives the default pose.
    pub fn looking_along(front: Vec3, pitch_limit: f32) -> Self {
        let pitch_limit = sanitize_limit(pitch_limit);
        let dir = front.normalize_or_zero();
        if dir == Vec3::ZERO {
            return Self {
                pitch_limit,
                ..Self::default()
            };
        }
        let pitch = dir.y.clamp(-1.0, 1.0).asin().to_degrees();
        Self {
            yaw: dir.z.atan2(dir.x).to_degrees(),
            pitch: pitch.clamp(-pitch_limit, pitch_limit),
            pitch_limit,
        }
    }

    /// Apply a mouse delta (pixels, y down) scaled by `scale` degrees per
    /// pixel. Returns the new front vector.
    pub fn apply(&mut self, dx: f32, dy: f32, scale: f32) -> Vec3 {
        self.yaw += dx * scale;
        self.pitch -= dy * scale;
        let limit = sanitize_limit(self.pitch_limit);
        self.pitch = self.pitch.clamp(-limit, limit);
        self.front()
    }

    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }
}

// NaN falls back to the default; negative limits are mirrored and nothing
// reaches the poles.
fn sanitize_limit(limit: f32) -> f32 {
    if limit.is_nan() {
        MouseLook::DEFAULT_PITCH_LIMIT
    } else {
        limit.abs().min(MouseLook::DEFAULT_PITCH_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_looks_down_negative_z() {
        let look = MouseLook::default();
        assert!(look.front().abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn pitch_stays_clamped() {
        let mut look = MouseLook::default();
        for dy in [-500.0, -3000.0, 40.0, 9000.0, -12.5, 1e6] {
            look.apply(13.0, dy, 0.7);
            assert!(look.pitch.abs() <= 89.9, "pitch {} out of range", look.pitch);
        }
        look.apply(0.0, -1e6, 1.0);
        assert_eq!(look.pitch, 89.9);
        assert!(look.front().y < 1.0);
    }

    #[test]
    fn mouse_up_pitches_up_and_right_yaws_right() {
        let mut look = MouseLook::default();
        let front = look.apply(10.0, -10.0, 1.0);
        assert_eq!(look.yaw, -80.0);
        assert_eq!(look.pitch, 10.0);
        assert!(front.y > 0.0);
        assert!(front.x > 0.0);
    }

    #[test]
    fn looking_along_recovers_angles() {
        let front = Vec3::new(0.0, -5.0, -10.0);
        let look = MouseLook::looking_along(front, 89.9);
        assert!((look.yaw + 90.0).abs() < 1e-4);
        assert!(look.front().abs_diff_eq(front.normalize(), 1e-5));
    }

    #[test]
    fn looking_along_zero_falls_back_to_default() {
        let look = MouseLook::looking_along(Vec3::ZERO, 45.0);
        assert_eq!(look.yaw, -90.0);
        assert_eq!(look.pitch_limit, 45.0);
    }

    #[test]
    fn out_of_range_limits_do_not_panic() {
        let front = Vec3::new(0.0, -5.0, -10.0);
        let mut look = MouseLook::looking_along(front, -10.0);
        assert_eq!(look.pitch_limit, 10.0);
        look.apply(0.0, 1e4, 1.0);
        assert_eq!(look.pitch, -10.0);

        let mut look = MouseLook::looking_along(front, f32::NAN);
        assert_eq!(look.pitch_limit, MouseLook::DEFAULT_PITCH_LIMIT);
        look.pitch_limit = f32::NAN;
        look.apply(0.0, -1e6, 1.0);
        assert_eq!(look.pitch, MouseLook::DEFAULT_PITCH_LIMIT);

        let look = MouseLook::looking_along(Vec3::Y, 400.0);
        assert_eq!(look.pitch_limit, MouseLook::DEFAULT_PITCH_LIMIT);
    }
}
