//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;
use super::size::format_size;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let large_file_pattern = config.fetch.large_file_pattern.as_deref().unwrap_or("");
    let api_key = config.fetch.api_key.as_deref().unwrap_or("");

    format!(
        r#"[cube]
; Face side length in pixels
size = {cube_size}
; Face rendering strategy:
;   parallel   - one worker per face (fastest, highest peak memory)
;   sequential - one face at a time
strategy = {strategy}
; Face workers for the parallel strategy (0 = auto, at most 6)
workers = {workers}
; Panoramas larger than this are downsampled before rendering
max_source_width = {max_source_width}
max_source_height = {max_source_height}
downsample_width = {downsample_width}
downsample_height = {downsample_height}

[output]
; Root directory for converted projects
directory = {output_directory}
; JPEG quality (1-100)
face_quality = {face_quality}
preview_quality = {preview_quality}
thumb_quality = {thumb_quality}
; Preview strip size; each face gets preview_height / 6 rows
preview_width = {preview_width}
preview_height = {preview_height}
thumb_size = {thumb_size}

[batch]
; Maximum scenes started per run (0 = unlimited)
max_scenes_per_run = {max_scenes_per_run}

[fetch]
; Staging directory for uploaded and downloaded inputs
uploads_directory = {uploads_directory}
; Primary download attempts before falling back
max_retries = {max_retries}
; Linear backoff step between attempts, in seconds
backoff_secs = {backoff_secs}
; Per-request timeout in seconds
timeout = {timeout}
; Files probed above this size skip straight to the fallback client
large_file_threshold = {large_file_threshold}
; Regular expression on file names that marks a file as large (empty = none)
large_file_pattern = {large_file_pattern}
; Drive API key used for the size probe (empty = no probe)
api_key = {api_key}
; Remove staged inputs when a job finishes
cleanup_downloads = {cleanup_downloads}

[ledger]
; Persisted record of in-flight jobs
file = {ledger_file}

[manifest]
xml_file = {xml_file}
html_file = {html_file}
skin_url = {skin_url}
skin_theme_url = {skin_theme_url}
viewer_script = {viewer_script}

[logging]
file = {log_file}
"#,
        cube_size = config.cube.size,
        strategy = config.cube.strategy,
        workers = config.cube.workers,
        max_source_width = config.cube.max_source_width,
        max_source_height = config.cube.max_source_height,
        downsample_width = config.cube.downsample_width,
        downsample_height = config.cube.downsample_height,
        output_directory = path_to_string(&config.output.directory),
        face_quality = config.output.face_quality,
        preview_quality = config.output.preview_quality,
        thumb_quality = config.output.thumb_quality,
        preview_width = config.output.preview_width,
        preview_height = config.output.preview_height,
        thumb_size = config.output.thumb_size,
        max_scenes_per_run = config.batch.max_scenes_per_run,
        uploads_directory = path_to_string(&config.fetch.uploads_directory),
        max_retries = config.fetch.max_retries,
        backoff_secs = config.fetch.backoff_secs,
        timeout = config.fetch.timeout,
        large_file_threshold = format_size(config.fetch.large_file_threshold),
        large_file_pattern = large_file_pattern,
        api_key = api_key,
        cleanup_downloads = config.fetch.cleanup_downloads,
        ledger_file = path_to_string(&config.ledger.file),
        xml_file = config.manifest.xml_file,
        html_file = config.manifest.html_file,
        skin_url = config.manifest.skin_url,
        skin_theme_url = config.manifest.skin_theme_url,
        viewer_script = config.manifest.viewer_script,
        log_file = path_to_string(&config.logging.file),
    )
}

/// Convert path to string, using ~ for home directory.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RenderStrategy;

    #[test]
    fn test_output_has_every_section() {
        let text = to_config_string(&ConfigFile::default());
        for section in [
            "[cube]",
            "[output]",
            "[batch]",
            "[fetch]",
            "[ledger]",
            "[manifest]",
            "[logging]",
        ] {
            assert!(text.contains(section), "missing {section}");
        }
    }

    #[test]
    fn test_output_reflects_values() {
        let mut config = ConfigFile::default();
        config.cube.strategy = RenderStrategy::Sequential;
        config.fetch.large_file_pattern = Some(r"\.tiff?$".to_string());

        let text = to_config_string(&config);
        assert!(text.contains("strategy = sequential"));
        assert!(text.contains(r"large_file_pattern = \.tiff?$"));
        assert!(text.contains("large_file_threshold = 500MB"));
    }
}
