//! Scene loader components
//!
//! The loader names an external scene by URL. The render aspect imports it
//! and reports the outcome as a `scene` property update. On that update the
//! loader first destroys the subtree it currently owns, then grafts the new
//! one under the entity it is attached to.

use super::nodes::SceneLoaderStatus;
use super::scene::Scene;
use super::SceneError;
use crate::change::{properties, ChangeRecord, LoadedScene, NodeData, NodeType, PropertyValue};
use crate::core::node_id::NodeId;
use crate::core::scene_tree::SceneTree;

impl Scene {
    /// Create a scene loader for `source`; it starts out loading
    pub fn create_scene_loader(&mut self, source: impl Into<String>) -> NodeId {
        self.insert("sceneLoader", NodeId::NULL, NodeData::SceneLoader { source: source.into() })
    }

    /// Current source URL
    pub fn scene_loader_source(&self, loader: NodeId) -> Result<&str, SceneError> {
        match &self.node_of_type(loader, NodeType::SceneLoader)?.data {
            NodeData::SceneLoader { source } => Ok(source.as_str()),
            _ => Ok(""),
        }
    }

    /// Current load status
    pub fn scene_loader_status(&self, loader: NodeId) -> Result<SceneLoaderStatus, SceneError> {
        self.node_of_type(loader, NodeType::SceneLoader)?;
        Ok(self.loaders.get(&loader).map(|state| state.status).unwrap_or_default())
    }

    /// Root of the loaded subtree, if one is attached
    pub fn scene_loader_subtree(&self, loader: NodeId) -> Result<Option<NodeId>, SceneError> {
        self.node_of_type(loader, NodeType::SceneLoader)?;
        Ok(self.loaders.get(&loader).and_then(|state| state.subtree_root))
    }

    /// Point a scene loader at another source
    ///
    /// A new source puts the loader back into `Loading`; clearing it destroys
    /// the loaded subtree and moves to `None`.
    pub fn set_source(&mut self, loader: NodeId, source: impl Into<String>) -> Result<(), SceneError> {
        let node = self.node_of_type(loader, NodeType::SceneLoader)?;
        let source = source.into();
        if matches!(&node.data, NodeData::SceneLoader { source: current } if *current == source) {
            return Ok(());
        }
        if let Some(node) = self.nodes.get_mut(&loader) {
            node.data = NodeData::SceneLoader { source: source.clone() };
        }
        let cleared = source.is_empty();
        self.emit(ChangeRecord::property_updated(loader, properties::SOURCE, PropertyValue::Text(source)));

        if cleared {
            self.release_subtree(loader);
            self.set_status(loader, SceneLoaderStatus::None);
        } else {
            self.set_status(loader, SceneLoaderStatus::Loading);
        }
        Ok(())
    }

    /// Register a callback for status changes of `loader`
    pub fn on_status_changed<F>(&mut self, loader: NodeId, listener: F) -> Result<(), SceneError>
    where
        F: FnMut(NodeId, SceneLoaderStatus) + Send + 'static,
    {
        self.node_of_type(loader, NodeType::SceneLoader)?;
        self.listeners.entry(loader).or_default().push(Box::new(listener));
        Ok(())
    }

    /// Apply an import result unless the loader moved on to another source
    pub(super) fn receive_loaded_scene(&mut self, loader: NodeId, loaded: &LoadedScene) {
        match self.scene_loader_source(loader) {
            Ok(current) if current == loaded.source => {}
            Ok(current) => {
                log::debug!(
                    "Scene loader {} ignoring stale import of '{}', source is now '{}'",
                    loader,
                    loaded.source,
                    current
                );
                return;
            }
            Err(_) => return,
        }
        self.apply_loaded_scene(loader, loaded.tree.as_deref());
    }

    fn apply_loaded_scene(&mut self, loader: NodeId, tree: Option<&SceneTree>) {
        self.release_subtree(loader);

        let status = match tree {
            Some(tree) => match self.entities_for_component(loader).first().copied() {
                Some(owner) => {
                    let root = self.materialize(tree, owner);
                    if let Some(state) = self.loaders.get_mut(&loader) {
                        state.subtree_root = Some(root);
                    }
                    log::info!("Scene loader {} grafted '{}' under {}", loader, tree.name, owner);
                    SceneLoaderStatus::Ready
                }
                None => {
                    log::warn!("Scene loader {} is not attached to an entity, discarding '{}'", loader, tree.name);
                    SceneLoaderStatus::Error
                }
            },
            None => SceneLoaderStatus::Error,
        };
        self.set_status(loader, status);
    }

    fn release_subtree(&mut self, loader: NodeId) {
        let root = self.loaders.get_mut(&loader).and_then(|state| state.subtree_root.take());
        if let Some(root) = root.filter(|root| self.nodes.contains_key(root)) {
            log::debug!("Scene loader {} releasing subtree {}", loader, root);
            self.destroy_recursive(root);
        }
    }

    fn materialize(&mut self, tree: &SceneTree, parent: NodeId) -> NodeId {
        let id = self.insert(tree.name.clone(), parent, NodeData::Entity { components: Vec::new() });
        for child in &tree.children {
            self.materialize(child, id);
        }
        id
    }

    fn set_status(&mut self, loader: NodeId, status: SceneLoaderStatus) {
        let Some(state) = self.loaders.get_mut(&loader) else {
            return;
        };
        if state.status == status {
            return;
        }
        state.status = status;
        log::debug!("Scene loader {} status changed to {}", loader, status);
        if let Some(listeners) = self.listeners.get_mut(&loader) {
            for listener in listeners.iter_mut() {
                listener(loader, status);
            }
        }
    }
}
