//! Face rendering: samples a panorama through the geometry kernel.
//!
//! Rendering is nearest-neighbour. The kernel already clamps every
//! coordinate, so the gather below cannot read outside the source buffer.

use image::{imageops, RgbImage};
use thiserror::Error;

use crate::geometry::{sampling_grid, CubeFace, GeometryError};

/// Bytes per RGB pixel.
const CHANNELS: usize = 3;

/// Errors that can occur while rendering a face.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The sampling grid could not be computed.
    #[error("face {face}: {source}")]
    Geometry {
        face: CubeFace,
        #[source]
        source: GeometryError,
    },

    /// The face carries a correction angle that is not a quarter turn.
    #[error("face {face}: unsupported rotation correction of {degrees} degrees")]
    UnsupportedRotation { face: CubeFace, degrees: u16 },
}

/// Renders one cube face of `size × size` pixels from `panorama`.
///
/// The face's rotation correction is applied after sampling.
pub fn render_face(
    panorama: &RgbImage,
    face: CubeFace,
    size: u32,
) -> Result<RgbImage, RenderError> {
    let grid = sampling_grid(face, size, panorama.width(), panorama.height())
        .map_err(|source| RenderError::Geometry { face, source })?;

    let source: &[u8] = panorama.as_raw();
    let stride = panorama.width() as usize * CHANNELS;

    let mut output = RgbImage::new(size, size);
    for (pixel, (x, y)) in output.chunks_exact_mut(CHANNELS).zip(grid.iter()) {
        let offset = y as usize * stride + x as usize * CHANNELS;
        pixel.copy_from_slice(&source[offset..offset + CHANNELS]);
    }

    correct_rotation(face, output)
}

/// Applies the face's fixed clockwise rotation correction.
fn correct_rotation(face: CubeFace, image: RgbImage) -> Result<RgbImage, RenderError> {
    match face.rotation_degrees() % 360 {
        0 => Ok(image),
        90 => Ok(imageops::rotate90(&image)),
        180 => Ok(imageops::rotate180(&image)),
        270 => Ok(imageops::rotate270(&image)),
        degrees => Err(RenderError::UnsupportedRotation { face, degrees }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    #[test]
    fn test_output_dimensions() {
        let pano = solid(64, 32, [10, 20, 30]);
        let face = render_face(&pano, CubeFace::Back, 12).unwrap();
        assert_eq!(face.dimensions(), (12, 12));
    }

    #[test]
    fn test_constant_source_gives_constant_faces() {
        let pano = solid(2, 1, [200, 100, 50]);
        for face in CubeFace::ALL {
            let img = render_face(&pano, face, 8).unwrap();
            assert!(
                img.pixels().all(|p| *p == Rgb([200, 100, 50])),
                "face {} not uniform",
                face
            );
        }
    }

    #[test]
    fn test_zero_size_is_geometry_error() {
        let pano = solid(4, 2, [0, 0, 0]);
        let err = render_face(&pano, CubeFace::Front, 0).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Geometry {
                face: CubeFace::Front,
                source: GeometryError::ZeroFaceSize
            }
        ));
    }

    #[test]
    fn test_gather_follows_grid() {
        // Encode the source coordinates into the pixel values so the
        // rendered face can be checked against the grid directly.
        let pano = RgbImage::from_fn(200, 100, |x, y| Rgb([x as u8, y as u8, 7]));
        let face = render_face(&pano, CubeFace::Right, 10).unwrap();
        let grid = sampling_grid(CubeFace::Right, 10, 200, 100).unwrap();

        for y in 0..10 {
            for x in 0..10 {
                let (sx, sy) = grid.source_xy(x, y);
                assert_eq!(*face.get_pixel(x, y), Rgb([sx as u8, sy as u8, 7]));
            }
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let pano = RgbImage::from_fn(128, 64, |x, y| Rgb([(x * 2) as u8, (y * 3) as u8, 1]));
        for face in CubeFace::ALL {
            let a = render_face(&pano, face, 20).unwrap();
            let b = render_face(&pano, face, 20).unwrap();
            assert_eq!(a.as_raw(), b.as_raw());
        }
    }
}
