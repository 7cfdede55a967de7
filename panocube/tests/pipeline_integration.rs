//! Integration tests for the conversion path: discovery, batch, manifest.
//!
//! These tests verify:
//! - A directory of panoramas becomes one scene per decodable input
//! - Undecodable inputs are reported and leave nothing on disk
//! - The manifest lists exactly the produced scenes, in submission order
//! - Parallel and sequential pipelines write identical faces

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use panocube::batch::{discover_inputs, BatchCoordinator};
use panocube::geometry::CubeFace;
use panocube::manifest::{ManifestEmitter, SCENES_DIR};
use panocube::pipeline::{CubePipeline, PipelineConfig, RenderStrategy, PREVIEW_FILE, THUMB_FILE};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Writes a 2:1 panorama with a horizontal hue ramp and a vertical shade.
fn write_panorama(dir: &Path, name: &str) -> PathBuf {
    let img = RgbImage::from_fn(64, 32, |x, y| Rgb([(x * 4) as u8, (y * 8) as u8, 128]));
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

fn pipeline(strategy: RenderStrategy) -> Arc<CubePipeline> {
    let config = PipelineConfig::default()
        .with_cube_size(16)
        .with_strategy(strategy)
        .with_preview_size(8, 48)
        .with_thumb_size(8);
    Arc::new(CubePipeline::new(config).unwrap())
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_directory_batch_produces_scenes_and_manifest() {
    let inputs_dir = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    write_panorama(inputs_dir.path(), "b_kitchen.png");
    write_panorama(inputs_dir.path(), "a_hall.png");
    std::fs::write(inputs_dir.path().join("c_broken.jpg"), b"not a jpeg").unwrap();
    std::fs::write(inputs_dir.path().join("notes.txt"), b"ignored").unwrap();

    let inputs = discover_inputs(inputs_dir.path()).unwrap();
    assert_eq!(inputs.len(), 3);

    let scenes_root = project.path().join(SCENES_DIR);
    let coordinator = BatchCoordinator::new(pipeline(RenderStrategy::Parallel), &scenes_root);
    let report = coordinator.run(&inputs);

    let names: Vec<_> = report.processed.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["a_hall", "b_kitchen"]);
    assert_eq!(report.failed_names(), ["c_broken"]);
    assert!(report.is_success());

    for scene in &report.processed {
        for face in CubeFace::ALL {
            assert!(scene.output_path.join(face.file_name()).is_file());
        }
        assert!(scene.output_path.join(PREVIEW_FILE).is_file());
        assert!(scene.output_path.join(THUMB_FILE).is_file());
    }
    assert!(!scenes_root.join("c_broken").exists());

    let paths = ManifestEmitter::default()
        .emit(project.path(), "Villa tour", "villa", &report.processed)
        .unwrap();
    let xml = std::fs::read_to_string(&paths.xml).unwrap();

    let hall = xml.find("funny_a_hall").unwrap();
    let kitchen = xml.find("funny_b_kitchen").unwrap();
    assert!(hall < kitchen);
    assert!(!xml.contains("c_broken"));
    assert!(xml.contains(r#"url="panosuser/a_hall/pano_%s.jpg""#));

    let html = std::fs::read_to_string(&paths.html).unwrap();
    assert!(html.contains("Tools Krpano villa"));
}

#[test]
fn test_parallel_and_sequential_write_identical_faces() {
    let inputs_dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let input = write_panorama(inputs_dir.path(), "hall.png");

    let parallel = pipeline(RenderStrategy::Parallel);
    let sequential = pipeline(RenderStrategy::Sequential);

    let a = parallel.load_panorama(&input).unwrap();
    let faces_parallel = parallel.render_faces(&a).unwrap();
    let faces_sequential = sequential.render_faces(&a).unwrap();

    for ((face, p), (_, s)) in faces_parallel.iter().zip(faces_sequential.iter()) {
        assert_eq!(p.as_raw(), s.as_raw(), "face {face} differs");
    }

    let artifacts = sequential.convert(&input, &out.path().join("hall")).unwrap();
    assert_eq!(artifacts.faces.len(), 6);
}

#[test]
fn test_scene_limit_defers_tail() {
    let inputs_dir = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let inputs = vec![
        write_panorama(inputs_dir.path(), "one.png"),
        write_panorama(inputs_dir.path(), "two.png"),
        write_panorama(inputs_dir.path(), "three.png"),
    ];

    let coordinator = BatchCoordinator::new(
        pipeline(RenderStrategy::Sequential),
        project.path().join(SCENES_DIR),
    )
    .with_max_scenes_per_run(2);
    let report = coordinator.run(&inputs);

    assert_eq!(report.processed.len(), 2);
    assert_eq!(report.deferred, vec![inputs[2].clone()]);
    assert_eq!(report.total, 3);
}
