//! Progress reporting for batch conversion.
//!
//! Progress is reported via a callback so the batch can be wired to the job
//! ledger, a terminal, or nothing at all.

use std::sync::Arc;

/// Progress callback for a batch run.
///
/// Called from the thread running the batch, so it must be `Send + Sync`.
pub type BatchProgressCallback = Arc<dyn Fn(BatchProgress) + Send + Sync>;

/// Phase of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    /// A scene is being converted.
    Converting,
    /// All admitted inputs have been handled.
    Complete,
}

/// Snapshot of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    pub phase: BatchPhase,

    /// Scene currently being converted.
    pub current_scene: Option<String>,

    /// Scenes converted successfully so far.
    pub scenes_complete: usize,

    /// Scenes that failed so far.
    pub scenes_failed: usize,

    /// Inputs admitted to this run.
    pub scenes_total: usize,
}

impl BatchProgress {
    /// Progress at the start of a scene.
    pub fn at_scene_start(
        scene: &str,
        scenes_complete: usize,
        scenes_failed: usize,
        scenes_total: usize,
    ) -> Self {
        Self {
            phase: BatchPhase::Converting,
            current_scene: Some(scene.to_string()),
            scenes_complete,
            scenes_failed,
            scenes_total,
        }
    }

    /// Progress after the last admitted input.
    pub fn at_complete(scenes_complete: usize, scenes_failed: usize, scenes_total: usize) -> Self {
        Self {
            phase: BatchPhase::Complete,
            current_scene: None,
            scenes_complete,
            scenes_failed,
            scenes_total,
        }
    }

    /// Inputs handled so far, successful or not.
    pub fn scenes_done(&self) -> usize {
        self.scenes_complete + self.scenes_failed
    }
}
