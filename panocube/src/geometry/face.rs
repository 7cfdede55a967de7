//! Cube face identifiers and their basis transforms.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Maps normalized face-plane coordinates `(x, y, z)` to a 3D direction.
type BasisFn = fn(f64, f64, f64) -> [f64; 3];

/// Static description of one face.
struct FaceSpec {
    id: &'static str,
    basis: BasisFn,
    /// Clockwise correction applied after sampling.
    rotation_degrees: u16,
}

/// Indexed by `CubeFace as usize`.
const FACE_TABLE: [FaceSpec; 6] = [
    FaceSpec {
        id: "pano_f",
        basis: |x, y, z| [x, y, z],
        rotation_degrees: 0,
    },
    FaceSpec {
        id: "pano_r",
        basis: |x, y, z| [z, y, -x],
        rotation_degrees: 0,
    },
    FaceSpec {
        id: "pano_b",
        basis: |x, y, z| [-x, y, -z],
        rotation_degrees: 0,
    },
    FaceSpec {
        id: "pano_l",
        basis: |x, y, z| [-z, y, x],
        rotation_degrees: 0,
    },
    FaceSpec {
        id: "pano_d",
        basis: |x, y, z| [x, z, -y],
        rotation_degrees: 0,
    },
    FaceSpec {
        id: "pano_u",
        basis: |x, y, z| [x, -z, y],
        rotation_degrees: 0,
    },
];

/// One of the six faces of a cubemap.
///
/// `FaceD` and `FaceU` keep the labels used by the viewer files
/// (`pano_d`, `pano_u`) even though their basis functions point the other
/// way; see the module documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    Front = 0,
    Right = 1,
    Back = 2,
    Left = 3,
    FaceD = 4,
    FaceU = 5,
}

impl CubeFace {
    /// All faces in rendering order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Front,
        CubeFace::Right,
        CubeFace::Back,
        CubeFace::Left,
        CubeFace::FaceD,
        CubeFace::FaceU,
    ];

    /// Top-to-bottom order of the faces in the preview strip.
    pub const PREVIEW_ORDER: [CubeFace; 6] = [
        CubeFace::Right,
        CubeFace::Front,
        CubeFace::Left,
        CubeFace::Back,
        CubeFace::FaceD,
        CubeFace::FaceU,
    ];

    fn spec(self) -> &'static FaceSpec {
        &FACE_TABLE[self as usize]
    }

    /// Position of this face in [`CubeFace::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Artifact identifier (`pano_f`, `pano_r`, ...).
    pub fn id(self) -> &'static str {
        self.spec().id
    }

    /// Output file name for this face's JPEG.
    pub fn file_name(self) -> String {
        format!("{}.jpg", self.id())
    }

    /// Applies this face's basis transform to an unnormalized plane vector.
    #[inline]
    pub fn direction(self, x: f64, y: f64, z: f64) -> [f64; 3] {
        (self.spec().basis)(x, y, z)
    }

    /// Clockwise rotation applied to the rendered face, in degrees.
    pub fn rotation_degrees(self) -> u16 {
        self.spec().rotation_degrees
    }
}

impl fmt::Display for CubeFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when a string is not a face identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown cube face '{0}' (expected one of pano_f, pano_r, pano_b, pano_l, pano_d, pano_u)")]
pub struct ParseFaceError(String);

impl FromStr for CubeFace {
    type Err = ParseFaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let short = lower.strip_prefix("pano_").unwrap_or(&lower);
        match short {
            "f" => Ok(CubeFace::Front),
            "r" => Ok(CubeFace::Right),
            "b" => Ok(CubeFace::Back),
            "l" => Ok(CubeFace::Left),
            "d" => Ok(CubeFace::FaceD),
            "u" => Ok(CubeFace::FaceU),
            _ => Err(ParseFaceError(s.to_string())),
        }
    }
}
