//! Spherical to cube-face reprojection.
//!
//! The kernel is a pure function of `(face, size, source dimensions)`: it
//! produces, for every pixel of a `size × size` face, the integer pixel of the
//! equirectangular source that should be sampled. No interpolation happens
//! here; the [`render`](crate::render) module gathers pixels through the grid.
//!
//! # Face table
//!
//! ```text
//! face     file     basis(x, y, z)
//! Front    pano_f   ( x,  y,  z)
//! Right    pano_r   ( z,  y, -x)
//! Back     pano_b   (-x,  y, -z)
//! Left     pano_l   (-z,  y,  x)
//! FaceD    pano_d   ( x,  z, -y)
//! FaceU    pano_u   ( x, -z,  y)
//! ```
//!
//! The `d`/`u` labels are crossed with the geometric role of their basis
//! functions. Viewer manifests reference the files by these labels, so the
//! table must not be "corrected" on one side only.

mod face;
mod kernel;

pub use face::{CubeFace, ParseFaceError};
pub use kernel::{sampling_grid, SamplingGrid};

use thiserror::Error;

/// Errors produced by the geometry kernel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// Requested face size is zero.
    #[error("cube face size must be at least 1 pixel")]
    ZeroFaceSize,

    /// Source panorama has no pixels to sample.
    #[error("source panorama is empty ({width}x{height})")]
    EmptySource { width: u32, height: u32 },
}
