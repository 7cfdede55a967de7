//! Scene artifact persistence.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use super::PipelineError;

/// File name of the preview strip inside a scene directory.
pub const PREVIEW_FILE: &str = "preview.jpg";

/// File name of the thumbnail inside a scene directory.
pub const THUMB_FILE: &str = "thumb.jpg";

/// Encodes `image` as a JPEG at `quality` and writes it to `path`.
///
/// The file is created or truncated. Quality is clamped to `1..=100` by the
/// encoder.
pub fn save_jpeg(image: &RgbImage, path: &Path, quality: u8) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);

    JpegEncoder::new_with_quality(writer, quality)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|source| PipelineError::Persist {
            path: path.to_path_buf(),
            source,
        })
}

/// Creates the scene directory (and any missing parents).
pub fn ensure_scene_dir(path: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}
