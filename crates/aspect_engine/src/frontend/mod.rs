//! Frontend scene graph
//!
//! The frontend is the authoritative copy of the scene. It lives on the
//! controlling thread, and every mutation made through [`Scene`] is turned
//! into a change record for the aspects. Results coming back from the
//! backend are applied by [`Scene::process_backend_changes`].

mod nodes;
mod scene;
mod scene_loader;

pub use nodes::{FrontendNode, SceneLoaderStatus};
pub use scene::{Scene, StatusListener};

use crate::change::NodeType;
use crate::core::node_id::NodeId;
use thiserror::Error;

/// Frontend scene errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// No live node with this identifier
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// Node exists but has another type
    #[error("node {node} is a {actual:?}, expected {expected:?}")]
    WrongNodeType {
        /// Offending node
        node: NodeId,
        /// Required type
        expected: NodeType,
        /// Actual type
        actual: NodeType,
    },

    /// Node cannot be attached to an entity
    #[error("node {0} is not a component")]
    NotAComponent(NodeId),

    /// Component is already attached to another entity
    #[error("component {component} cannot be shared, it is attached to {entity}")]
    ComponentNotShareable {
        /// Component being attached
        component: NodeId,
        /// Entity it is attached to
        entity: NodeId,
    },
}
