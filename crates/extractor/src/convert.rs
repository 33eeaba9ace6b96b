//! Raw buffer to owned image conversion.
//!
//! Every function copies out of the borrowed source buffer; nothing returned
//! here references decoder memory.

use contracts::{
    ColorBuffer, ColorImage, DepthBuffer, DepthImage, ExtractError, Point3, RealWorldImage,
    RealWorldProjector,
};
use image::Luma;

fn expected_len(
    kind: &'static str,
    width: u32,
    height: u32,
    per_pixel: usize,
    actual: usize,
) -> Result<usize, ExtractError> {
    let expected = width as usize * height as usize * per_pixel;
    if expected != actual {
        return Err(ExtractError::BufferMismatch {
            kind,
            width,
            height,
            expected,
            actual,
        });
    }
    Ok(expected)
}

/// Copy an interleaved 3-channel buffer into a `ColorImage`
///
/// With `swap_red_blue` the first and third channel of every pixel are exchanged.
pub fn convert_color(
    buffer: &ColorBuffer<'_>,
    swap_red_blue: bool,
) -> Result<ColorImage, ExtractError> {
    let expected = expected_len("color", buffer.width, buffer.height, 3, buffer.data.len())?;

    let mut data = buffer.data.to_vec();
    if swap_red_blue {
        for pixel in data.chunks_exact_mut(3) {
            pixel.swap(0, 2);
        }
    }

    ColorImage::from_raw(buffer.width, buffer.height, data).ok_or(ExtractError::BufferMismatch {
        kind: "color",
        width: buffer.width,
        height: buffer.height,
        expected,
        actual: buffer.data.len(),
    })
}

/// Build `(x, y, depth)` points for every pixel, row-major (`index = x + y * width`)
pub fn projective_points(depth: &DepthBuffer<'_>) -> Result<Vec<Point3>, ExtractError> {
    let expected = expected_len("depth", depth.width, depth.height, 1, depth.data.len())?;

    let mut points = Vec::with_capacity(expected);
    for y in 0..depth.height {
        for x in 0..depth.width {
            points.push(Point3::new(x as f32, y as f32, depth.sample(x, y) as f32));
        }
    }
    Ok(points)
}

/// Project a depth buffer into real-world coordinates with one batched call
pub fn convert_real_world(
    depth: &DepthBuffer<'_>,
    projector: &dyn RealWorldProjector,
) -> Result<RealWorldImage, ExtractError> {
    let projective = projective_points(depth)?;
    let world = projector.project(&projective);
    if world.len() != projective.len() {
        return Err(ExtractError::Projection {
            expected: projective.len(),
            actual: world.len(),
        });
    }

    let data: Vec<f32> = world.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
    RealWorldImage::from_raw(depth.width, depth.height, data).ok_or(ExtractError::Projection {
        expected: projective.len(),
        actual: world.len(),
    })
}

/// Depth-only map: the Z component of every point, rounded to `u16`
pub fn depth_from_real_world(image: &RealWorldImage) -> DepthImage {
    DepthImage::from_fn(image.width(), image.height(), |x, y| {
        let z = image.get_pixel(x, y).0[2];
        Luma([z.round().clamp(0.0, u16::MAX as f32) as u16])
    })
}
