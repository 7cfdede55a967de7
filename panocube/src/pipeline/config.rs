//! Cube pipeline configuration.

use std::fmt;
use std::str::FromStr;

/// Default cube face side length in pixels.
pub const DEFAULT_CUBE_SIZE: u32 = 1920;

/// Upper bound on face workers; there are only six faces.
pub const MAX_FACE_WORKERS: usize = 6;

/// Upper bound on the CPU-derived worker count before the face cap applies.
pub const MAX_CPU_WORKERS: usize = 8;

/// Sources wider than this are downsampled before rendering.
pub const DEFAULT_MAX_SOURCE_WIDTH: u32 = 8192;

/// Sources taller than this are downsampled before rendering.
pub const DEFAULT_MAX_SOURCE_HEIGHT: u32 = 4096;

/// Downsample target width for oversized sources.
pub const DEFAULT_DOWNSAMPLE_WIDTH: u32 = 6144;

/// Downsample target height for oversized sources.
pub const DEFAULT_DOWNSAMPLE_HEIGHT: u32 = 3072;

/// JPEG quality for face images.
pub const DEFAULT_FACE_QUALITY: u8 = 100;

/// JPEG quality for the preview strip.
pub const DEFAULT_PREVIEW_QUALITY: u8 = 100;

/// JPEG quality for the thumbnail.
pub const DEFAULT_THUMB_QUALITY: u8 = 95;

/// Preview strip width.
pub const DEFAULT_PREVIEW_WIDTH: u32 = 256;

/// Preview strip height (six stacked faces).
pub const DEFAULT_PREVIEW_HEIGHT: u32 = 1536;

/// Thumbnail side length.
pub const DEFAULT_THUMB_SIZE: u32 = 360;

/// How the six faces of a scene are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderStrategy {
    /// One worker per face on a bounded pool.
    #[default]
    Parallel,
    /// One face at a time on the calling thread. Lowest peak memory.
    Sequential,
}

impl RenderStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Sequential => "sequential",
        }
    }
}

impl fmt::Display for RenderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parallel" => Ok(Self::Parallel),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!(
                "unknown render strategy '{}' (expected 'parallel' or 'sequential')",
                other
            )),
        }
    }
}

/// Number of face workers derived from the machine.
///
/// `min(cpus, 8)`, then capped at six.
pub fn default_face_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    clamp_face_workers(cpus.min(MAX_CPU_WORKERS))
}

/// Clamps a requested worker count to `1..=6`.
pub fn clamp_face_workers(requested: usize) -> usize {
    requested.clamp(1, MAX_FACE_WORKERS)
}

/// Configuration for [`CubePipeline`](super::CubePipeline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Face side length in pixels.
    pub cube_size: u32,
    /// Parallel or sequential face rendering.
    pub strategy: RenderStrategy,
    /// Face worker count for the parallel strategy.
    pub workers: usize,
    /// Width above which the source is downsampled.
    pub max_source_width: u32,
    /// Height above which the source is downsampled.
    pub max_source_height: u32,
    /// Downsample target width.
    pub downsample_width: u32,
    /// Downsample target height.
    pub downsample_height: u32,
    /// JPEG quality of face images.
    pub face_quality: u8,
    /// JPEG quality of the preview strip.
    pub preview_quality: u8,
    /// JPEG quality of the thumbnail.
    pub thumb_quality: u8,
    /// Preview strip width.
    pub preview_width: u32,
    /// Preview strip height; each face gets `preview_height / 6` rows.
    pub preview_height: u32,
    /// Thumbnail side length.
    pub thumb_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cube_size: DEFAULT_CUBE_SIZE,
            strategy: RenderStrategy::default(),
            workers: default_face_workers(),
            max_source_width: DEFAULT_MAX_SOURCE_WIDTH,
            max_source_height: DEFAULT_MAX_SOURCE_HEIGHT,
            downsample_width: DEFAULT_DOWNSAMPLE_WIDTH,
            downsample_height: DEFAULT_DOWNSAMPLE_HEIGHT,
            face_quality: DEFAULT_FACE_QUALITY,
            preview_quality: DEFAULT_PREVIEW_QUALITY,
            thumb_quality: DEFAULT_THUMB_QUALITY,
            preview_width: DEFAULT_PREVIEW_WIDTH,
            preview_height: DEFAULT_PREVIEW_HEIGHT,
            thumb_size: DEFAULT_THUMB_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Set the face side length.
    pub fn with_cube_size(mut self, size: u32) -> Self {
        self.cube_size = size;
        self
    }

    /// Set the render strategy.
    pub fn with_strategy(mut self, strategy: RenderStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the face worker count (clamped to `1..=6`).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = clamp_face_workers(workers);
        self
    }

    /// Set the source size limit and the target used when it is exceeded.
    pub fn with_downsample(mut self, max: (u32, u32), target: (u32, u32)) -> Self {
        self.max_source_width = max.0;
        self.max_source_height = max.1;
        self.downsample_width = target.0;
        self.downsample_height = target.1;
        self
    }

    /// Set the preview strip dimensions.
    pub fn with_preview_size(mut self, width: u32, height: u32) -> Self {
        self.preview_width = width;
        self.preview_height = height;
        self
    }

    /// Set the thumbnail side length.
    pub fn with_thumb_size(mut self, size: u32) -> Self {
        self.thumb_size = size;
        self
    }

    /// Whether a source of the given size must be downsampled first.
    pub fn needs_downsample(&self, width: u32, height: u32) -> bool {
        width > self.max_source_width || height > self.max_source_height
    }
}
