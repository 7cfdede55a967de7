//! Per-face sampling grid computation.

use std::f64::consts::{FRAC_PI_2, PI};

use super::{CubeFace, GeometryError};

/// Source pixel coordinates for every pixel of one cube face.
///
/// Both grids are stored row-major with `size * size` entries. Every entry is
/// already clamped to the bounds of the source image, so gathering through
/// the grid can never index out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingGrid {
    size: u32,
    px: Vec<u32>,
    py: Vec<u32>,
}

impl SamplingGrid {
    /// Side length of the face this grid was computed for.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Source column for every face pixel, row-major.
    pub fn xs(&self) -> &[u32] {
        &self.px
    }

    /// Source row for every face pixel, row-major.
    pub fn ys(&self) -> &[u32] {
        &self.py
    }

    /// Source coordinates sampled by face pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the face.
    pub fn source_xy(&self, x: u32, y: u32) -> (u32, u32) {
        assert!(x < self.size && y < self.size, "face pixel out of range");
        let i = y as usize * self.size as usize + x as usize;
        (self.px[i], self.py[i])
    }

    /// Iterates `(source_x, source_y)` pairs in row-major face order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.px.iter().copied().zip(self.py.iter().copied())
    }
}

/// Computes the equirectangular sampling grid for one face.
///
/// For face pixel `(x, y)`:
///
/// 1. `nx = 2x/S - 1`, `ny = 2y/S - 1`
/// 2. `(vx, vy, vz) = basis(nx, ny, 1) / sqrt(nx² + ny² + 1)`
/// 3. `theta = atan2(vx, vz)`, `phi = asin(vy)`
/// 4. `px = round(u (W-1))`, `py = round((1-v) (H-1))` with
///    `u = (theta/π + 1)/2`, `v = (phi/(π/2) + 1)/2`, both clamped.
///
/// The length is taken from the untransformed `(nx, ny, 1)` triple and
/// applied to the transformed vector.
pub fn sampling_grid(
    face: CubeFace,
    size: u32,
    source_width: u32,
    source_height: u32,
) -> Result<SamplingGrid, GeometryError> {
    if size == 0 {
        return Err(GeometryError::ZeroFaceSize);
    }
    if source_width == 0 || source_height == 0 {
        return Err(GeometryError::EmptySource {
            width: source_width,
            height: source_height,
        });
    }

    let max_x = f64::from(source_width - 1);
    let max_y = f64::from(source_height - 1);
    let side = f64::from(size);
    let count = size as usize * size as usize;

    let mut px = Vec::with_capacity(count);
    let mut py = Vec::with_capacity(count);

    for y in 0..size {
        let ny = 2.0 * f64::from(y) / side - 1.0;
        for x in 0..size {
            let nx = 2.0 * f64::from(x) / side - 1.0;
            let length = (nx * nx + ny * ny + 1.0).sqrt();

            let [dx, dy, dz] = face.direction(nx, ny, 1.0);
            let (vx, vy, vz) = (dx / length, dy / length, dz / length);

            let theta = vx.atan2(vz);
            let phi = vy.clamp(-1.0, 1.0).asin();

            let u = 0.5 * (theta / PI + 1.0);
            let v = 0.5 * (phi / FRAC_PI_2 + 1.0);

            px.push(clamp_to_index((u * max_x).round(), max_x));
            py.push(clamp_to_index(((1.0 - v) * max_y).round(), max_y));
        }
    }

    Ok(SamplingGrid { size, px, py })
}

#[inline]
fn clamp_to_index(value: f64, max: f64) -> u32 {
    value.clamp(0.0, max) as u32
}
