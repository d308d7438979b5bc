use glam::{Vec2, Vec3};

/// Central-difference surface normals of a height function over the xz-plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalEstimator {
    /// Half the finite-difference span in world units.
    pub epsilon: f32,
}

impl Default for NormalEstimator {
    fn default() -> Self {
        Self { epsilon: 0.1 }
    }
}

impl NormalEstimator {
    pub fn new(epsilon: f32) -> Self {
        Self { epsilon }
    }

    /// Unit normal with positive y. Falls back to straight up if the tangents degenerate.
    pub fn normal(&self, pos: Vec2, height: impl Fn(Vec2) -> f32) -> Vec3 {
        let e = self.epsilon;
        let dx = Vec2::new(e, 0.0);
        let dz = Vec2::new(0.0, e);

        let h_l = height(pos - dx);
        let h_r = height(pos + dx);
        let h_d = height(pos - dz);
        let h_u = height(pos + dz);

        let tangent_x = Vec3::new(2.0 * e, h_r - h_l, 0.0);
        let tangent_z = Vec3::new(0.0, h_u - h_d, 2.0 * e);
        tangent_z.cross(tangent_x).normalize_or(Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_plane_is_up() {
        let n = NormalEstimator::default().normal(Vec2::new(4.0, -2.0), |_| 3.0);
        assert!((n - Vec3::Y).length() < 1e-6, "{n}");
    }

    #[test]
    fn test_inclined_plane() {
        // h = x: normal is (-1, 1, 0) / sqrt(2)
        let n = NormalEstimator::default().normal(Vec2::new(1.0, 1.0), |p| p.x);
        let expected = Vec3::new(-1.0, 1.0, 0.0).normalize();
        assert!((n - expected).length() < 1e-4, "{n} vs {expected}");

        // h = 2z
        let n = NormalEstimator::new(0.5).normal(Vec2::ZERO, |p| 2.0 * p.y);
        let expected = Vec3::new(0.0, 1.0, -2.0).normalize();
        assert!((n - expected).length() < 1e-4, "{n} vs {expected}");
    }

    #[test]
    fn test_zero_epsilon_falls_back_to_up() {
        let n = NormalEstimator::new(0.0).normal(Vec2::ZERO, |p| p.x * 10.0);
        assert_eq!(n, Vec3::Y);
    }
}
