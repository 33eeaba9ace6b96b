//! Field-of-view based projective to real-world transform.

use contracts::{Point3, RealWorldProjector};
use serde::{Deserialize, Serialize};

/// Horizontal field of view of a PrimeSense-class depth sensor (radians)
pub const DEFAULT_HORIZONTAL_FOV: f32 = 1.014_468_7;

/// Vertical field of view of a PrimeSense-class depth sensor (radians)
pub const DEFAULT_VERTICAL_FOV: f32 = 0.789_809_4;

/// Pinhole projector parameterized by resolution and field of view
///
/// ```text
/// X = (x / W - 0.5) * Z * 2 tan(hfov / 2)
/// Y = (0.5 - y / H) * Z * 2 tan(vfov / 2)
/// Z = depth
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FovProjector {
    pub width: u32,
    pub height: u32,
    pub horizontal_fov: f32,
    pub vertical_fov: f32,
}

impl FovProjector {
    pub fn new(width: u32, height: u32, horizontal_fov: f32, vertical_fov: f32) -> Self {
        Self {
            width,
            height,
            horizontal_fov,
            vertical_fov,
        }
    }

    /// Projector with the default PrimeSense field of view
    pub fn with_default_fov(width: u32, height: u32) -> Self {
        Self::new(width, height, DEFAULT_HORIZONTAL_FOV, DEFAULT_VERTICAL_FOV)
    }

    #[inline]
    fn x_to_z(&self) -> f32 {
        (self.horizontal_fov / 2.0).tan() * 2.0
    }

    #[inline]
    fn y_to_z(&self) -> f32 {
        (self.vertical_fov / 2.0).tan() * 2.0
    }
}

impl RealWorldProjector for FovProjector {
    fn project(&self, projective: &[Point3]) -> Vec<Point3> {
        let x_to_z = self.x_to_z();
        let y_to_z = self.y_to_z();
        let width = self.width.max(1) as f32;
        let height = self.height.max(1) as f32;

        projective
            .iter()
            .map(|p| {
                let nx = p.x / width - 0.5;
                let ny = 0.5 - p.y / height;
                Point3::new(nx * p.z * x_to_z, ny * p.z * y_to_z, p.z)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_pixel_on_axis() {
        let projector = FovProjector::with_default_fov(640, 480);
        let out = projector.project(&[Point3::new(320.0, 240.0, 1500.0)]);
        assert_eq!(out.len(), 1);
        assert!(out[0].x.abs() < 1e-3);
        assert!(out[0].y.abs() < 1e-3);
        assert_eq!(out[0].z, 1500.0);
    }

    #[test]
    fn test_zero_depth_collapses_to_origin() {
        let projector = FovProjector::with_default_fov(4, 4);
        let out = projector.project(&[Point3::new(0.0, 0.0, 0.0)]);
        assert_eq!(out[0], Point3::origin());
    }

    #[test]
    fn test_right_angle_fov_edges() {
        // 90 degree fov: 2 tan(45deg) = 2, left edge at X = -Z
        let fov = std::f32::consts::FRAC_PI_2;
        let projector = FovProjector::new(100, 100, fov, fov);
        let out = projector.project(&[Point3::new(0.0, 0.0, 10.0)]);
        assert!((out[0].x + 10.0).abs() < 1e-4);
        assert!((out[0].y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_preserves_order_and_length() {
        let projector = FovProjector::with_default_fov(2, 2);
        let input: Vec<Point3> = (0..4)
            .map(|i| Point3::new((i % 2) as f32, (i / 2) as f32, 100.0 + i as f32))
            .collect();
        let out = projector.project(&input);
        let depths: Vec<f32> = out.iter().map(|p| p.z).collect();
        assert_eq!(depths, vec![100.0, 101.0, 102.0, 103.0]);
    }
}
