use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::SessionError;

/// Which files under the session root count as per-image metadata.
///
/// EPU lays a session out as `<root>/GridSquare_<id>/Data/FoilHole_*.xml`;
/// grid-square overview and atlas XML files live elsewhere and are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryRule {
    /// Name of the directory holding per-image files; `None` accepts any
    pub data_dir: Option<String>,
    /// Required file name prefix
    pub file_prefix: String,
}

impl Default for DiscoveryRule {
    fn default() -> Self {
        Self {
            data_dir: Some("Data".to_string()),
            file_prefix: "Foil".to_string(),
        }
    }
}

impl DiscoveryRule {
    /// True if `path` names a per-image metadata file
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let is_xml = Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        if !is_xml || !name.starts_with(&self.file_prefix) {
            return false;
        }
        match &self.data_dir {
            Some(dir) => parent_name(path) == Some(dir.as_str()),
            None => true,
        }
    }

    /// Acquisition run a file belongs to: the directory above the data
    /// directory, relative to `root` (`.` for the root itself)
    pub fn run_group(&self, root: &Path, path: &Path) -> String {
        let mut dir = path.parent().unwrap_or(root);
        if self.data_dir.is_some() && parent_name(path) == self.data_dir.as_deref() {
            dir = dir.parent().unwrap_or(root);
        }
        let relative = dir.strip_prefix(root).unwrap_or(dir);
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if name.is_empty() {
            ".".to_string()
        } else {
            name
        }
    }
}

fn parent_name(path: &Path) -> Option<&str> {
    path.parent()?.file_name()?.to_str()
}

/// Metadata files found under a session root
#[derive(Debug, Default)]
pub struct Discovery {
    /// Matching files in ascending path order
    pub files: Vec<PathBuf>,
    /// Number of distinct directories holding matching files
    pub directories: usize,
}

/// Walk `root` recursively and collect the files matched by `rule`
pub fn discover(root: &Path, rule: &DiscoveryRule) -> Result<Discovery, SessionError> {
    let metadata = std::fs::metadata(root).map_err(|source| SessionError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(SessionError::Root {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let mut files = Vec::new();
    let mut per_directory: BTreeMap<PathBuf, usize> = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && rule.matches(entry.path()) {
            if let Some(parent) = entry.path().parent() {
                *per_directory.entry(parent.to_path_buf()).or_default() += 1;
            }
            files.push(entry.into_path());
        }
    }

    files.sort();

    for (dir, count) in &per_directory {
        let relative = dir.strip_prefix(root).unwrap_or(dir);
        debug!("{:>6} xml  {}", count, relative.display());
    }

    Ok(Discovery {
        files,
        directories: per_directory.len(),
    })
}
