//! Frontend node storage

use crate::change::{NodeData, NodeSnapshot, NodeType};
use crate::core::node_id::NodeId;
use std::fmt;

/// Load status of a scene loader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SceneLoaderStatus {
    /// No source to load
    None,
    /// Waiting for the backend to import the source
    #[default]
    Loading,
    /// Imported subtree is grafted under the owning entity
    Ready,
    /// The source could not be imported
    Error,
}

impl fmt::Display for SceneLoaderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Loading => "Loading",
            Self::Ready => "Ready",
            Self::Error => "Error",
        };
        f.write_str(name)
    }
}

/// One node of the frontend scene
#[derive(Debug, Clone)]
pub struct FrontendNode {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) parent: NodeId,
    pub(crate) children: Vec<NodeId>,
    pub(crate) enabled: bool,
    pub(crate) data: NodeData,
}

impl FrontendNode {
    pub(crate) fn new(id: NodeId, name: String, parent: NodeId, data: NodeData) -> Self {
        Self {
            id,
            name,
            parent,
            children: Vec::new(),
            enabled: true,
            data,
        }
    }

    /// Node identifier
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent node, null for roots
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Enabled flag
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Role specific state
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Node type
    pub fn node_type(&self) -> NodeType {
        self.data.node_type()
    }

    /// Whether the node can be attached to an entity
    pub fn is_component(&self) -> bool {
        matches!(
            self.node_type(),
            NodeType::Geometry | NodeType::ButtonAxisInput | NodeType::PickingSettings | NodeType::SceneLoader
        )
    }

    /// Whether the node may be attached to more than one entity
    pub fn is_shareable(&self) -> bool {
        self.node_type() != NodeType::SceneLoader
    }

    /// Creation snapshot of the current state
    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.id,
            parent: self.parent,
            enabled: self.enabled,
            data: self.data.clone(),
        }
    }
}

/// Frontend-only state of a scene loader
#[derive(Debug, Clone, Default)]
pub(crate) struct LoaderState {
    pub(crate) status: SceneLoaderStatus,
    pub(crate) subtree_root: Option<NodeId>,
}
