//! Manifest emitter: viewer scene graph and bootstrap page for a project.
//!
//! The scene graph lists one scene per processed scene, in batch order.
//! Failed scenes never appear in it.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::info;

use crate::batch::ProcessedScene;

/// Default scene graph file name.
pub const DEFAULT_XML_FILE: &str = "user1.xml";

/// Default bootstrap page file name.
pub const DEFAULT_HTML_FILE: &str = "Toolstour.html";

/// Directory, relative to the project, holding one folder per scene.
pub const SCENES_DIR: &str = "panosuser";

/// Prefix of every scene element name.
pub const SCENE_NAME_PREFIX: &str = "funny_";

pub const DEFAULT_SKIN_URL: &str = "/api/phanmengoc/skin/vtourskin.xml";
pub const DEFAULT_SKIN_THEME_URL: &str = "/api/phanmengoc/skin/vtourskin_design_flat_light.xml";
pub const DEFAULT_VIEWER_SCRIPT: &str = "/api/phanmengoc/funny.js";

/// Errors that can occur while writing manifest files.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File names and viewer URLs used in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSettings {
    pub xml_file: String,
    pub html_file: String,
    pub skin_url: String,
    pub skin_theme_url: String,
    pub viewer_script: String,
}

impl Default for ManifestSettings {
    fn default() -> Self {
        Self {
            xml_file: DEFAULT_XML_FILE.to_string(),
            html_file: DEFAULT_HTML_FILE.to_string(),
            skin_url: DEFAULT_SKIN_URL.to_string(),
            skin_theme_url: DEFAULT_SKIN_THEME_URL.to_string(),
            viewer_script: DEFAULT_VIEWER_SCRIPT.to_string(),
        }
    }
}

/// Paths of the emitted documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPaths {
    pub xml: PathBuf,
    pub html: PathBuf,
}

/// Writes manifest documents into a project directory.
#[derive(Debug, Clone, Default)]
pub struct ManifestEmitter {
    settings: ManifestSettings,
}

impl ManifestEmitter {
    pub fn new(settings: ManifestSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ManifestSettings {
        &self.settings
    }

    /// Writes the scene graph and the bootstrap page into `project_dir`.
    ///
    /// `title` is the tour title; `project` names the bootstrap page.
    pub fn emit(
        &self,
        project_dir: &Path,
        title: &str,
        project: &str,
        scenes: &[ProcessedScene],
    ) -> Result<ManifestPaths, ManifestError> {
        std::fs::create_dir_all(project_dir).map_err(|source| ManifestError::Io {
            path: project_dir.to_path_buf(),
            source,
        })?;

        let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let xml = project_dir.join(&self.settings.xml_file);
        write_file(&xml, &render_xml(&self.settings, title, scenes, &generated))?;

        let html = project_dir.join(&self.settings.html_file);
        write_file(&html, &render_html(&self.settings, project))?;

        info!(
            xml = %xml.display(),
            html = %html.display(),
            scenes = scenes.len(),
            "Manifest written"
        );
        Ok(ManifestPaths { xml, html })
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ManifestError> {
    std::fs::write(path, contents).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Escapes text for use in XML/HTML content and attribute values.
pub fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Renders the scene graph document.
pub fn render_xml(
    settings: &ManifestSettings,
    title: &str,
    scenes: &[ProcessedScene],
    generated: &str,
) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" ?>\n");
    let _ = writeln!(xml, "<krpano title=\"{}\">", xml_escape(title));
    let _ = writeln!(xml, "\t<version>Generated on {}</version>", xml_escape(generated));
    let _ = writeln!(xml, "\t<include url=\"{}\"/>", xml_escape(&settings.skin_url));
    let _ = writeln!(
        xml,
        "\t<include url=\"{}\"/>",
        xml_escape(&settings.skin_theme_url)
    );

    for scene in scenes {
        let name = xml_escape(&scene.name);
        let base = format!("{}/{}", SCENES_DIR, name);
        let _ = writeln!(
            xml,
            "\t<scene name=\"{prefix}{name}\" title=\"{name}\" onstart=\"\" \
             thumburl=\"{base}/thumb.jpg\" lat=\"\" lng=\"\" alt=\"\" heading=\"\">",
            prefix = SCENE_NAME_PREFIX,
        );
        xml.push_str("\t\t<control bouncinglimits=\"calc:image.cube ? true : false\"/>\n");
        xml.push_str(
            "\t\t<view hlookat=\"0.0\" vlookat=\"0.0\" fovtype=\"MFOV\" fov=\"120\" \
             maxpixelzoom=\"2.0\" fovmin=\"70\" fovmax=\"140\" limitview=\"auto\"/>\n",
        );
        let _ = writeln!(xml, "\t\t<preview url=\"{}/preview.jpg\"/>", base);
        xml.push_str("\t\t<image>\n");
        let _ = writeln!(xml, "\t\t\t<cube url=\"{}/pano_%s.jpg\"/>", base);
        xml.push_str("\t\t</image>\n");
        xml.push_str("\t</scene>\n");
    }

    xml.push_str("</krpano>\n");
    xml
}

/// Renders the full-viewport bootstrap page for `project`.
pub fn render_html(settings: &ManifestSettings, project: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
	<title>Tools Krpano {title}</title>
	<meta name="viewport" content="width=device-width, initial-scale=1.0, minimum-scale=1.0, maximum-scale=1.0, viewport-fit=cover" />
	<meta name="apple-mobile-web-app-capable" content="yes" />
	<meta name="apple-mobile-web-app-status-bar-style" content="black" />
	<meta name="mobile-web-app-capable" content="yes" />
	<meta http-equiv="Content-Type" content="text/html;charset=utf-8" />
	<meta http-equiv="x-ua-compatible" content="IE=edge" />
	<style>
		html {{ height:100%; }}
		body {{ height:100%; overflow:hidden; margin:0; padding:0; font-family:Arial, Helvetica, sans-serif; font-size:16px; color:#FFFFFF; background-color:#000000; }}
	</style>
</head>
<body>

<script src="{script}"></script>

<div id="pano" style="width:100%;height:100%;">
	<noscript><table style="width:100%;height:100%;"><tr style="vertical-align:middle;"><td><div style="text-align:center;">ERROR:<br/><br/>Javascript not activated<br/><br/></div></td></tr></table></noscript>
	<script>
		embedpano({{xml:"{xml}", target:"pano", passQueryParameters:"startscene,startlookat"}});
	</script>
</div>

</body>
</html>
"#,
        title = xml_escape(project),
        script = xml_escape(&settings.viewer_script),
        xml = xml_escape(&settings.xml_file),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scene(name: &str) -> ProcessedScene {
        ProcessedScene {
            name: name.to_string(),
            input_path: PathBuf::from(format!("/in/{}.jpg", name)),
            output_path: PathBuf::from(format!("/out/panosuser/{}", name)),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(xml_escape(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn test_xml_scene_order_and_urls() {
        let settings = ManifestSettings::default();
        let xml = render_xml(
            &settings,
            "My tour",
            &[scene("lobby"), scene("roof")],
            "2026-01-02 03:04:05",
        );

        assert!(xml.contains(r#"<krpano title="My tour">"#));
        assert!(xml.contains("<version>Generated on 2026-01-02 03:04:05</version>"));
        assert!(xml.contains(r#"<include url="/api/phanmengoc/skin/vtourskin.xml"/>"#));
        assert!(xml.contains(r#"thumburl="panosuser/lobby/thumb.jpg""#));
        assert!(xml.contains(r#"<preview url="panosuser/roof/preview.jpg"/>"#));
        assert!(xml.contains(r#"<cube url="panosuser/roof/pano_%s.jpg"/>"#));
        assert!(xml.contains(r#"fovtype="MFOV" fov="120""#));

        let lobby = xml.find(r#"name="funny_lobby""#).unwrap();
        let roof = xml.find(r#"name="funny_roof""#).unwrap();
        assert!(lobby < roof);
        assert_eq!(xml.matches("<scene ").count(), 2);
    }

    #[test]
    fn test_xml_escapes_scene_names() {
        let xml = render_xml(&ManifestSettings::default(), "t", &[scene("a&b")], "now");
        assert!(xml.contains(r#"name="funny_a&amp;b""#));
        assert!(!xml.contains("a&b"));
    }

    #[test]
    fn test_html_bootstrap() {
        let html = render_html(&ManifestSettings::default(), "villa");
        assert!(html.contains("<title>Tools Krpano villa</title>"));
        assert!(html.contains(r#"<script src="/api/phanmengoc/funny.js"></script>"#));
        assert!(html.contains(r#"embedpano({xml:"user1.xml", target:"pano""#));
    }

    #[test]
    fn test_emit_writes_both_files() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("villa");
        let paths = ManifestEmitter::default()
            .emit(&project, "Villa", "villa", &[scene("hall")])
            .unwrap();

        assert_eq!(paths.xml, project.join("user1.xml"));
        assert_eq!(paths.html, project.join("Toolstour.html"));
        let xml = std::fs::read_to_string(&paths.xml).unwrap();
        assert!(xml.contains("funny_hall"));
        assert!(paths.html.is_file());
    }
}
