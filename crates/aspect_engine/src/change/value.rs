//! Payloads carried by change records
//!
//! Values are plain data: identifiers, numbers, strings and the creation
//! snapshot of a node. Nothing here ever points back into the frontend scene.

use crate::core::node_id::NodeId;
use crate::core::picking::{FaceOrientation, PickMethod, PickResultMode};
use crate::core::scene_tree::SceneTree;
use std::sync::Arc;

/// Kind of frontend node, used by aspects to declare what they mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Scene graph entity
    Entity,
    /// Vertex attribute referenced by geometry
    Attribute,
    /// Geometry holding an ordered attribute list
    Geometry,
    /// Axis input driven by device buttons
    ButtonAxisInput,
    /// Physical or logical input device
    InputDevice,
    /// Picking configuration
    PickingSettings,
    /// Component importing an external scene
    SceneLoader,
}

/// Role specific state of a node, as captured at creation time
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Entity with its attached components
    Entity {
        /// Attached component ids
        components: Vec<NodeId>,
    },
    /// Named vertex attribute
    Attribute {
        /// Attribute name
        name: String,
    },
    /// Geometry
    Geometry {
        /// Ordered attribute ids
        attributes: Vec<NodeId>,
        /// Attribute used to compute the bounding volume
        bounding_position_attribute: NodeId,
    },
    /// Button driven axis input
    ButtonAxisInput {
        /// Buttons feeding the axis
        buttons: Vec<i32>,
        /// Scale applied to the axis value
        scale: f32,
        /// Device the buttons are read from
        source_device: NodeId,
    },
    /// Input device
    InputDevice {
        /// Device name
        name: String,
    },
    /// Picking settings
    PickingSettings {
        /// Hit computation method
        pick_method: PickMethod,
        /// Which hits get reported
        pick_result_mode: PickResultMode,
        /// Pickable faces
        face_orientation: FaceOrientation,
    },
    /// Scene loader component
    SceneLoader {
        /// Source URL of the scene
        source: String,
    },
}

impl NodeData {
    /// Node type this data belongs to
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Entity { .. } => NodeType::Entity,
            Self::Attribute { .. } => NodeType::Attribute,
            Self::Geometry { .. } => NodeType::Geometry,
            Self::ButtonAxisInput { .. } => NodeType::ButtonAxisInput,
            Self::InputDevice { .. } => NodeType::InputDevice,
            Self::PickingSettings { .. } => NodeType::PickingSettings,
            Self::SceneLoader { .. } => NodeType::SceneLoader,
        }
    }
}

/// Full state handoff for a freshly created node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    /// Node being described
    pub id: NodeId,
    /// Parent node, null for roots
    pub parent: NodeId,
    /// Enabled flag
    pub enabled: bool,
    /// Role specific state
    pub data: NodeData,
}

impl NodeSnapshot {
    /// Node type of the snapshot
    pub fn node_type(&self) -> NodeType {
        self.data.node_type()
    }
}

/// Outcome of importing a scene loader's source
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedScene {
    /// Source the import was run for
    pub source: String,
    /// Imported subtree; `None` when the import failed
    pub tree: Option<Arc<SceneTree>>,
}

impl LoadedScene {
    /// Wrap the result of importing `source`
    pub fn new(source: impl Into<String>, tree: Option<SceneTree>) -> Self {
        Self {
            source: source.into(),
            tree: tree.map(Arc::new),
        }
    }
}

/// Opaque typed value attached to a change record
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PropertyValue {
    /// No payload
    #[default]
    Empty,
    /// Boolean
    Bool(bool),
    /// Integer, also used for enumerations
    Int(i32),
    /// Floating point
    Float(f32),
    /// Integer list
    IntList(Vec<i32>),
    /// Node reference
    Node(NodeId),
    /// Text or URL
    Text(String),
    /// Import result of a scene loader
    Scene(LoadedScene),
    /// Creation snapshot
    Snapshot(Box<NodeSnapshot>),
}

impl PropertyValue {
    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer payload
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Float payload
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer list payload
    pub fn as_int_list(&self) -> Option<&[i32]> {
        match self {
            Self::IntList(values) => Some(values),
            _ => None,
        }
    }

    /// Node reference payload
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Text payload
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Scene import payload
    pub fn as_scene(&self) -> Option<&LoadedScene> {
        match self {
            Self::Scene(loaded) => Some(loaded),
            _ => None,
        }
    }

    /// Snapshot payload
    pub fn as_snapshot(&self) -> Option<&NodeSnapshot> {
        match self {
            Self::Snapshot(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<i32>> for PropertyValue {
    fn from(values: Vec<i32>) -> Self {
        Self::IntList(values)
    }
}

impl From<NodeId> for PropertyValue {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<String> for PropertyValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for PropertyValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_only_match_their_variant() {
        let value = PropertyValue::from(0.5_f32);
        assert_eq!(value.as_float(), Some(0.5));
        assert_eq!(value.as_int(), None);
        assert_eq!(value.as_bool(), None);

        let id = NodeId::mint();
        assert_eq!(PropertyValue::from(id).as_node(), Some(id));
        assert_eq!(PropertyValue::from(vec![64]).as_int_list(), Some(&[64][..]));
        assert_eq!(PropertyValue::from("scene.ron").as_text(), Some("scene.ron"));
        assert!(PropertyValue::Empty.as_snapshot().is_none());
    }

    #[test]
    fn test_snapshot_reports_node_type() {
        let snapshot = NodeSnapshot {
            id: NodeId::mint(),
            parent: NodeId::NULL,
            enabled: true,
            data: NodeData::SceneLoader { source: String::new() },
        };
        assert_eq!(snapshot.node_type(), NodeType::SceneLoader);
    }
}
