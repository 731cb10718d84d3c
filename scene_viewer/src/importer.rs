//! Scene importer reading RON scene descriptions from disk

use aspect_engine::prelude::{SceneImporter, SceneTree};
use std::path::PathBuf;
use thiserror::Error;

/// Why a scene document could not be imported
#[derive(Error, Debug)]
pub enum ImportError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// Resolved path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not a valid scene description
    #[error("cannot parse {path}: {message}")]
    Parse {
        /// Resolved path
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

/// Imports `.ron` scene descriptions relative to a base directory
#[derive(Debug, Clone)]
pub struct RonSceneImporter {
    base_dir: PathBuf,
}

impl RonSceneImporter {
    /// Create an importer resolving sources against `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    /// Read and parse one document
    pub fn read(&self, source: &str) -> Result<SceneTree, ImportError> {
        let path = self.base_dir.join(source.trim_start_matches("file://"));
        let contents = std::fs::read_to_string(&path).map_err(|source| ImportError::Io {
            path: path.clone(),
            source,
        })?;
        ron::from_str(&contents).map_err(|e| ImportError::Parse {
            path,
            message: e.to_string(),
        })
    }
}

impl SceneImporter for RonSceneImporter {
    fn import(&self, source: &str) -> Option<SceneTree> {
        match self.read(source) {
            Ok(tree) => {
                log::info!("Imported '{}' with {} entities", source, tree.entity_count());
                Some(tree)
            }
            Err(e) => {
                log::warn!("Scene import failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scene_viewer_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_reads_scene_description() {
        let dir = scratch_dir("valid");
        std::fs::write(
            dir.join("level.ron"),
            r#"(name: "level", children: [(name: "ship"), (name: "rock", children: [(name: "shard")])])"#,
        )
        .unwrap();

        let importer = RonSceneImporter::new(&dir);
        let tree = importer.import("file://level.ron").unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(tree.name, "level");
        assert_eq!(tree.entity_count(), 4);
    }

    #[test]
    fn test_missing_or_broken_documents_fail() {
        let dir = scratch_dir("broken");
        std::fs::write(dir.join("broken.ron"), "(name: ").unwrap();

        let importer = RonSceneImporter::new(&dir);
        assert!(matches!(importer.read("missing.ron"), Err(ImportError::Io { .. })));
        assert!(matches!(importer.read("broken.ron"), Err(ImportError::Parse { .. })));
        assert!(importer.import("broken.ron").is_none());
        std::fs::remove_dir_all(&dir).ok();
    }
}
