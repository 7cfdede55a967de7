//! Preview strip and thumbnail composition.
//!
//! The strip stacks the six faces top to bottom in
//! [`CubeFace::PREVIEW_ORDER`]. Each face is resized on its own rayon task;
//! placement is by index so the result never depends on which resize
//! finishes first.

use image::imageops::{self, FilterType};
use image::RgbImage;
use rayon::prelude::*;

use crate::geometry::CubeFace;

use super::RenderedFaces;

/// Resamples one face to a strip cell.
pub fn resize_strip(face: &RgbImage, width: u32, height: u32) -> RgbImage {
    imageops::resize(face, width, height, FilterType::Lanczos3)
}

/// Builds the preview strip of `width × height`.
///
/// Every face gets `height / 6` rows; any remainder rows at the bottom stay
/// black.
pub fn assemble_preview(faces: &RenderedFaces, width: u32, height: u32) -> RgbImage {
    let cell_height = height / CubeFace::PREVIEW_ORDER.len() as u32;

    let cells: Vec<RgbImage> = CubeFace::PREVIEW_ORDER
        .par_iter()
        .map(|&face| resize_strip(faces.get(face), width, cell_height))
        .collect();

    let mut strip = RgbImage::new(width, height);
    for (i, cell) in cells.iter().enumerate() {
        let y = i as i64 * i64::from(cell_height);
        imageops::replace(&mut strip, cell, 0, y);
    }
    strip
}

/// Builds the square thumbnail from the front face.
pub fn build_thumbnail(faces: &RenderedFaces, size: u32) -> RgbImage {
    imageops::resize(faces.get(CubeFace::Front), size, size, FilterType::Lanczos3)
}
