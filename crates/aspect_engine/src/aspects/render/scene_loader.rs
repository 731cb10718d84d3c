//! Render side mirror of a scene loader component
//!
//! The peer only tracks the source URL. Resolving it is the render aspect's
//! job, which hands it to the configured [`SceneImporter`] and reports the
//! result back to the frontend as a `scene` property update.

use crate::backend::{BackendNode, BackendNodeBase};
use crate::change::{properties, ChangeKind, ChangeRecord, LoadedScene, NodeData, NodeType, PropertyValue};
use crate::core::scene_tree::SceneTree;

/// External collaborator turning a source URL into an entity subtree
///
/// Returns `None` when the source cannot be imported.
pub trait SceneImporter: Send + Sync {
    /// Import the scene at `source`
    fn import(&self, source: &str) -> Option<SceneTree>;
}

/// Importer that never produces a scene
#[derive(Debug, Default)]
pub struct NullSceneImporter;

impl SceneImporter for NullSceneImporter {
    fn import(&self, source: &str) -> Option<SceneTree> {
        log::debug!("No scene importer configured, cannot load {}", source);
        None
    }
}

/// Scene loader peer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneLoader {
    base: BackendNodeBase,
    source: String,
    pending_load: bool,
}

impl SceneLoader {
    /// Source URL
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the current source still has to be imported
    pub fn is_load_pending(&self) -> bool {
        self.pending_load
    }

    /// Import the current source and build the record for the frontend
    ///
    /// The record names the source it was imported from, so the frontend can
    /// drop it if the source changed while the import was in flight.
    pub fn load(&mut self, importer: &dyn SceneImporter) -> ChangeRecord {
        self.pending_load = false;
        self.base.unset_dirty();
        let scene = if self.source.is_empty() {
            None
        } else {
            importer.import(&self.source)
        };
        if scene.is_none() {
            log::warn!("Failed to load scene '{}' for {}", self.source, self.peer_id());
        }
        ChangeRecord::property_updated(
            self.peer_id(),
            properties::SCENE,
            PropertyValue::Scene(LoadedScene::new(self.source.clone(), scene)),
        )
    }
}

impl BackendNode for SceneLoader {
    const NODE_TYPE: NodeType = NodeType::SceneLoader;

    fn base(&self) -> &BackendNodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BackendNodeBase {
        &mut self.base
    }

    fn initialize_from_data(&mut self, data: &NodeData) {
        if let NodeData::SceneLoader { source } = data {
            self.source.clone_from(source);
            self.pending_load = !source.is_empty();
        }
    }

    fn apply_change(&mut self, change: &ChangeRecord) {
        if change.kind() == ChangeKind::PropertyUpdated && change.property() == properties::SOURCE {
            if let Some(source) = change.value().as_text() {
                self.source = source.to_owned();
                self.pending_load = !source.is_empty();
                self.base.mark_dirty();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::NodeSnapshot;
    use crate::core::node_id::NodeId;

    struct FixedImporter;

    impl SceneImporter for FixedImporter {
        fn import(&self, source: &str) -> Option<SceneTree> {
            (source == "level.ron").then(|| SceneTree::new("level").with_child(SceneTree::new("crate")))
        }
    }

    fn snapshot(source: &str) -> NodeSnapshot {
        NodeSnapshot {
            id: NodeId::mint(),
            parent: NodeId::NULL,
            enabled: true,
            data: NodeData::SceneLoader { source: source.into() },
        }
    }

    #[test]
    fn test_snapshot_with_source_requests_load() {
        let mut loader = SceneLoader::default();
        loader.initialize_from_snapshot(&snapshot("level.ron"));
        assert_eq!(loader.source(), "level.ron");
        assert!(loader.is_load_pending());
        assert!(!loader.is_dirty());

        let mut empty = SceneLoader::default();
        empty.initialize_from_snapshot(&snapshot(""));
        assert!(!empty.is_load_pending());
    }

    #[test]
    fn test_load_reports_scene_or_failure() {
        let mut loader = SceneLoader::default();
        let snapshot = snapshot("level.ron");
        loader.initialize_from_snapshot(&snapshot);

        let record = loader.load(&FixedImporter);
        assert!(!loader.is_load_pending());
        assert_eq!(record.subject(), snapshot.id);
        assert_eq!(record.property(), properties::SCENE);
        let loaded = record.value().as_scene().unwrap();
        assert_eq!(loaded.source, "level.ron");
        assert_eq!(loaded.tree.as_ref().map(|tree| tree.entity_count()), Some(2));

        loader.scene_change_event(&ChangeRecord::property_updated(snapshot.id, properties::SOURCE, "missing.ron"));
        assert!(loader.is_dirty());
        assert!(loader.is_load_pending());
        let record = loader.load(&FixedImporter);
        assert_eq!(record.value(), &PropertyValue::Scene(LoadedScene::new("missing.ron", None)));
        assert!(!loader.is_dirty());

        loader.scene_change_event(&ChangeRecord::property_updated(snapshot.id, properties::SOURCE, ""));
        assert!(loader.is_dirty());
        assert!(!loader.is_load_pending());
    }

    #[test]
    fn test_cleanup_resets_everything() {
        let mut loader = SceneLoader::default();
        loader.initialize_from_snapshot(&snapshot("level.ron"));
        loader.cleanup();
        assert_eq!(loader, SceneLoader::default());
    }
}
