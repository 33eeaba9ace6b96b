//! Owned image types handed back to callers.

use image::{ImageBuffer, Luma, Rgb};

/// Decoded color frame, 3 channels in source order (red/blue swapped on request)
pub type ColorImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Real-world coordinates (X, Y, Z) per depth pixel
pub type RealWorldImage = ImageBuffer<Rgb<f32>, Vec<f32>>;

/// Single-channel depth map derived from a `RealWorldImage`
pub type DepthImage = ImageBuffer<Luma<u16>, Vec<u16>>;

/// 3D point, used for both projective `(x, y, depth)` and real-world coordinates
pub type Point3 = nalgebra::Point3<f32>;
