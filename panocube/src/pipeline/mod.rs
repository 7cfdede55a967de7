//! Cube pipeline: one equirectangular panorama in, one scene directory out.
//!
//! # Stages
//!
//! ```text
//!  input path
//!      │ decode (fatal on failure, nothing written yet)
//!      ▼
//!  RgbImage ── downsample if over the size threshold ── rotate 180°
//!      │
//!      ▼
//!  render six faces ─── parallel: bounded rayon pool (≤ 6 workers)
//!      │                sequential: calling thread, one face at a time
//!      ▼
//!  write faces (joined) ── preview strip ── thumbnail
//!      │
//!      ▼
//!  SceneArtifacts
//! ```
//!
//! Both strategies call the same [`render_face`] on the same panorama, so
//! their output is byte-identical; only latency and peak memory differ.

mod config;
mod error;
mod preview;
mod storage;

pub use config::{
    clamp_face_workers, default_face_workers, PipelineConfig, RenderStrategy,
    DEFAULT_CUBE_SIZE, MAX_FACE_WORKERS,
};
pub use error::PipelineError;
pub use preview::{assemble_preview, build_thumbnail, resize_strip};
pub use storage::{save_jpeg, PREVIEW_FILE, THUMB_FILE};

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::imageops::{self, FilterType};
use image::RgbImage;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use crate::geometry::CubeFace;
use crate::render::render_face;

/// The six rendered faces of one panorama, indexed by [`CubeFace`].
#[derive(Debug, Clone)]
pub struct RenderedFaces {
    /// Always six entries, in [`CubeFace::ALL`] order.
    faces: Vec<RgbImage>,
}

impl RenderedFaces {
    /// Builds the set by calling `f` once per face in [`CubeFace::ALL`] order.
    pub fn from_fn(f: impl FnMut(CubeFace) -> RgbImage) -> Self {
        Self {
            faces: CubeFace::ALL.into_iter().map(f).collect(),
        }
    }

    /// Image for `face`.
    pub fn get(&self, face: CubeFace) -> &RgbImage {
        &self.faces[face.index()]
    }

    /// Iterates faces in [`CubeFace::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (CubeFace, &RgbImage)> {
        CubeFace::ALL.into_iter().zip(self.faces.iter())
    }
}

/// Paths written for one successfully converted scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneArtifacts {
    pub directory: PathBuf,
    /// Face files in [`CubeFace::ALL`] order.
    pub faces: Vec<PathBuf>,
    pub preview: PathBuf,
    pub thumbnail: PathBuf,
}

/// Converts panoramas into cube face scenes.
///
/// Holds the face worker pool for the parallel strategy, so one pipeline
/// should be shared across a whole batch.
pub struct CubePipeline {
    config: PipelineConfig,
    pool: Option<ThreadPool>,
}

impl CubePipeline {
    /// Creates a pipeline. Builds the worker pool when the strategy is
    /// [`RenderStrategy::Parallel`].
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let pool = match config.strategy {
            RenderStrategy::Parallel => Some(
                ThreadPoolBuilder::new()
                    .num_threads(clamp_face_workers(config.workers))
                    .thread_name(|i| format!("panocube-face-{}", i))
                    .build()?,
            ),
            RenderStrategy::Sequential => None,
        };

        debug!(
            strategy = %config.strategy,
            workers = config.workers,
            cube_size = config.cube_size,
            "Cube pipeline created"
        );

        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Converts `input` and writes the scene into `scene_dir`.
    ///
    /// On error the caller owns cleanup of `scene_dir`; a decode failure
    /// returns before the directory is created.
    pub fn convert(&self, input: &Path, scene_dir: &Path) -> Result<SceneArtifacts, PipelineError> {
        let started = Instant::now();

        let panorama = self.load_panorama(input)?;
        let faces = self.render_faces(&panorama)?;
        drop(panorama);

        storage::ensure_scene_dir(scene_dir)?;
        let face_paths = self.write_faces(&faces, scene_dir)?;

        let preview_path = scene_dir.join(PREVIEW_FILE);
        let strip = assemble_preview(
            &faces,
            self.config.preview_width,
            self.config.preview_height,
        );
        save_jpeg(&strip, &preview_path, self.config.preview_quality)?;

        let thumb_path = scene_dir.join(THUMB_FILE);
        let thumb = build_thumbnail(&faces, self.config.thumb_size);
        save_jpeg(&thumb, &thumb_path, self.config.thumb_quality)?;

        info!(
            input = %input.display(),
            output = %scene_dir.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scene converted"
        );

        Ok(SceneArtifacts {
            directory: scene_dir.to_path_buf(),
            faces: face_paths,
            preview: preview_path,
            thumbnail: thumb_path,
        })
    }

    /// Decodes `input` into RGB, downsamples oversized sources and applies
    /// the 180° orientation fix.
    pub fn load_panorama(&self, input: &Path) -> Result<RgbImage, PipelineError> {
        let decoded = image::open(input).map_err(|source| PipelineError::Decode {
            path: input.to_path_buf(),
            source,
        })?;
        let mut panorama = decoded.to_rgb8();

        let (width, height) = panorama.dimensions();
        if self.config.needs_downsample(width, height) {
            debug!(
                width,
                height,
                target_width = self.config.downsample_width,
                target_height = self.config.downsample_height,
                "Downsampling oversized panorama"
            );
            panorama = imageops::resize(
                &panorama,
                self.config.downsample_width,
                self.config.downsample_height,
                FilterType::Lanczos3,
            );
        }

        imageops::rotate180_in_place(&mut panorama);
        Ok(panorama)
    }

    /// Renders all six faces of an already loaded panorama.
    pub fn render_faces(&self, panorama: &RgbImage) -> Result<RenderedFaces, PipelineError> {
        let size = self.config.cube_size;
        let results = self.map_faces(|face| {
            let started = Instant::now();
            let rendered = render_face(panorama, face, size);
            debug!(
                face = %face,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Face rendered"
            );
            rendered
        });

        Ok(RenderedFaces {
            faces: results.into_iter().collect::<Result<_, _>>()?,
        })
    }

    /// Writes every face to `scene_dir`; returns once all writes finished.
    fn write_faces(
        &self,
        faces: &RenderedFaces,
        scene_dir: &Path,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        let quality = self.config.face_quality;
        self.map_faces(|face| {
            let path = scene_dir.join(face.file_name());
            save_jpeg(faces.get(face), &path, quality).map(|()| path)
        })
        .into_iter()
        .collect()
    }

    /// Runs `f` for every face, on the pool when there is one.
    ///
    /// Results come back in [`CubeFace::ALL`] order regardless of
    /// completion order.
    fn map_faces<T, F>(&self, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(CubeFace) -> T + Sync,
    {
        match &self.pool {
            Some(pool) => pool.install(|| CubeFace::ALL.par_iter().map(|&face| f(face)).collect()),
            None => CubeFace::ALL.iter().map(|&face| f(face)).collect(),
        }
    }
}

impl std::fmt::Debug for CubePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CubePipeline")
            .field("config", &self.config)
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    const MARKER: Rgb<u8> = Rgb([255, 0, 0]);

    fn small_config(strategy: RenderStrategy) -> PipelineConfig {
        PipelineConfig::default()
            .with_cube_size(16)
            .with_strategy(strategy)
            .with_workers(3)
            .with_preview_size(8, 48)
            .with_thumb_size(6)
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let pano = gradient(200, 100);
        let parallel = CubePipeline::new(small_config(RenderStrategy::Parallel)).unwrap();
        let sequential = CubePipeline::new(small_config(RenderStrategy::Sequential)).unwrap();

        let a = parallel.render_faces(&pano).unwrap();
        let b = sequential.render_faces(&pano).unwrap();

        for face in CubeFace::ALL {
            assert_eq!(a.get(face).as_raw(), b.get(face).as_raw(), "face {}", face);
        }
    }

    #[test]
    fn test_sequential_render_is_deterministic() {
        let pano = gradient(120, 60);
        let pipeline = CubePipeline::new(small_config(RenderStrategy::Sequential)).unwrap();
        let a = pipeline.render_faces(&pano).unwrap();
        let b = pipeline.render_faces(&pano).unwrap();
        for (face, image) in a.iter() {
            assert_eq!(image.as_raw(), b.get(face).as_raw());
        }
    }

    #[test]
    fn test_constant_two_by_one_source() {
        let pano = RgbImage::from_pixel(2, 1, Rgb([12, 34, 56]));
        let pipeline = CubePipeline::new(small_config(RenderStrategy::Parallel)).unwrap();
        let faces = pipeline.render_faces(&pano).unwrap();
        for (face, image) in faces.iter() {
            assert!(
                image.pixels().all(|p| *p == Rgb([12, 34, 56])),
                "face {} not constant",
                face
            );
        }
    }

    #[test]
    fn test_marker_lands_only_in_front_center() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("marker.png");

        // (180, 90) of a 361×181 source is longitude 0, latitude 0 and is
        // a fixed point of the 180° rotation applied on load.
        let mut pano = RgbImage::new(361, 181);
        pano.put_pixel(180, 90, MARKER);
        pano.save(&input).unwrap();

        let pipeline = CubePipeline::new(small_config(RenderStrategy::Sequential)).unwrap();
        let loaded = pipeline.load_panorama(&input).unwrap();
        let faces = pipeline.render_faces(&loaded).unwrap();

        let mut hits = Vec::new();
        for (face, image) in faces.iter() {
            for (x, y, pixel) in image.enumerate_pixels() {
                if *pixel == MARKER {
                    hits.push((face, x, y));
                }
            }
        }
        assert_eq!(hits, vec![(CubeFace::Front, 8, 8)]);
    }

    #[test]
    fn test_convert_writes_all_artifacts_before_returning() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("hall.png");
        gradient(128, 64).save(&input).unwrap();
        let scene_dir = temp.path().join("out").join("hall");

        let pipeline = CubePipeline::new(small_config(RenderStrategy::Parallel)).unwrap();
        let artifacts = pipeline.convert(&input, &scene_dir).unwrap();

        assert_eq!(artifacts.faces.len(), 6);
        for face in CubeFace::ALL {
            let path = scene_dir.join(face.file_name());
            assert!(path.is_file(), "missing {}", path.display());
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
        assert!(artifacts.preview.is_file());
        assert!(artifacts.thumbnail.is_file());

        let preview = image::open(&artifacts.preview).unwrap();
        assert_eq!((preview.width(), preview.height()), (8, 48));
        let thumb = image::open(&artifacts.thumbnail).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (6, 6));
    }

    #[test]
    fn test_decode_failure_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("broken.jpg");
        std::fs::write(&input, b"not an image").unwrap();
        let scene_dir = temp.path().join("broken");

        let pipeline = CubePipeline::new(small_config(RenderStrategy::Sequential)).unwrap();
        let err = pipeline.convert(&input, &scene_dir).unwrap_err();

        assert!(matches!(err, PipelineError::Decode { .. }));
        assert!(!scene_dir.exists());
    }

    #[test]
    fn test_oversized_source_is_downsampled() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("big.png");
        gradient(100, 50).save(&input).unwrap();

        let config = small_config(RenderStrategy::Sequential).with_downsample((64, 32), (32, 16));
        let pipeline = CubePipeline::new(config).unwrap();
        let loaded = pipeline.load_panorama(&input).unwrap();
        assert_eq!(loaded.dimensions(), (32, 16));
    }

    #[test]
    fn test_load_rotates_180() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("corner.png");
        let mut pano = RgbImage::new(10, 5);
        pano.put_pixel(0, 0, MARKER);
        pano.save(&input).unwrap();

        let pipeline = CubePipeline::new(small_config(RenderStrategy::Sequential)).unwrap();
        let loaded = pipeline.load_panorama(&input).unwrap();
        assert_eq!(*loaded.get_pixel(9, 4), MARKER);
        assert_eq!(*loaded.get_pixel(0, 0), Rgb([0, 0, 0]));
    }
}
