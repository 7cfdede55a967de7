//! On-disk layout of a project.
//!
//! ```text
//! <output>/<project>/panosuser/<scene>/pano_*.jpg, preview.jpg, thumb.jpg
//! <output>/<project>/user1.xml
//! <output>/<project>/Toolstour.html
//! <uploads>/<project>/<input files>
//! ```

use std::path::{Path, PathBuf};

use crate::manifest::SCENES_DIR;

/// Output and staging roots shared by every project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    output_root: PathBuf,
    staging_root: PathBuf,
}

impl ProjectLayout {
    pub fn new(output_root: impl Into<PathBuf>, staging_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            staging_root: staging_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Directory holding the manifest documents of `project`.
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.output_root.join(project)
    }

    /// Directory holding one folder per scene of `project`.
    pub fn scenes_dir(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(SCENES_DIR)
    }

    /// Directory where inputs of `project` are staged before conversion.
    pub fn staging_dir(&self, project: &str) -> PathBuf {
        self.staging_root.join(project)
    }
}

/// Makes a user-supplied project name safe to use as a directory name.
///
/// Path separators and control characters are dropped, surrounding
/// whitespace and leading dots are stripped. Returns `None` if nothing is
/// left.
pub fn sanitize_project_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\') && !c.is_control())
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Makes an input file name safe to store in a staging directory.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; whitespace becomes `_`;
/// everything else is dropped. Leading dots and underscores are stripped.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']);
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
