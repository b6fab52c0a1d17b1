// Workspace file discovery

use crate::config::ScanConfig;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// A source file with its contents already loaded.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub content: String,
}

/// Where the cache gets its files from. Implemented by the directory
/// scanner in production and by fixed lists in tests.
pub trait FileSource: Send + Sync {
    /// Workspace root, used to derive project-relative directories
    fn root(&self) -> &Path;

    /// Every analyzable file under the root, sorted by path
    fn files(&self) -> Result<Vec<ScannedFile>>;
}

/// Recursive directory scanner honoring the configured extensions and
/// excluded directory names.
pub struct ProjectScanner {
    root: PathBuf,
    extensions: Vec<String>,
    exclude: Vec<String>,
    follow_links: bool,
}

impl ProjectScanner {
    pub fn new(root: impl Into<PathBuf>, config: &ScanConfig) -> Self {
        Self {
            root: root.into(),
            extensions: config.extensions.clone(),
            exclude: config.exclude.clone(),
            follow_links: config.follow_links,
        }
    }

    /// A directory is excluded when any path segment under the root
    /// equals one of the configured names. Matching whole segments keeps
    /// `dist` from hiding `distribution/`.
    fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative.components().any(|component| {
            let segment = component.as_os_str();
            self.exclude.iter().any(|pattern| segment == pattern.as_str())
        })
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| {
                self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
            })
    }
}

impl FileSource for ProjectScanner {
    fn root(&self) -> &Path {
        &self.root
    }

    fn files(&self) -> Result<Vec<ScannedFile>> {
        let mut files = Vec::new();

        // A root that does not exist is an empty project, not a failure
        if !self.root.exists() {
            warn!("scan root {} does not exist", self.root.display());
            return Ok(files);
        }

        for entry in WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() || !self.matches_extension(path) {
                continue;
            }

            match fs::read_to_string(path) {
                Ok(content) => files.push(ScannedFile {
                    path: path.to_path_buf(),
                    content,
                }),
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}
