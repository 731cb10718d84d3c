//! Render side mirror of a geometry node

use crate::backend::{BackendNode, BackendNodeBase};
use crate::change::{properties, ChangeKind, ChangeRecord, NodeData, NodeType};
use crate::core::node_id::NodeId;

/// Geometry peer: ordered attribute ids plus the bounding volume attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    base: BackendNodeBase,
    attributes: Vec<NodeId>,
    bounding_position_attribute: NodeId,
}

impl Geometry {
    /// Attribute ids in frontend order
    pub fn attributes(&self) -> &[NodeId] {
        &self.attributes
    }

    /// Attribute used to compute the bounding volume
    pub fn bounding_position_attribute(&self) -> NodeId {
        self.bounding_position_attribute
    }
}

impl BackendNode for Geometry {
    const NODE_TYPE: NodeType = NodeType::Geometry;

    fn base(&self) -> &BackendNodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BackendNodeBase {
        &mut self.base
    }

    fn initialize_from_data(&mut self, data: &NodeData) {
        if let NodeData::Geometry {
            attributes,
            bounding_position_attribute,
        } = data
        {
            self.attributes.clone_from(attributes);
            self.bounding_position_attribute = *bounding_position_attribute;
        }
    }

    fn apply_change(&mut self, change: &ChangeRecord) {
        match (change.kind(), change.property()) {
            (ChangeKind::NodeAdded, properties::ATTRIBUTE) => {
                if let Some(attribute) = change.value().as_node() {
                    self.attributes.push(attribute);
                    self.base.mark_dirty();
                }
            }
            (ChangeKind::NodeRemoved, properties::ATTRIBUTE) => {
                if let Some(attribute) = change.value().as_node() {
                    self.attributes.retain(|id| *id != attribute);
                    self.base.mark_dirty();
                }
            }
            // Mirrored only; render list assembly never reads it.
            (ChangeKind::PropertyUpdated, properties::BOUNDING_POSITION_ATTRIBUTE) => {
                if let Some(attribute) = change.value().as_node() {
                    self.bounding_position_attribute = attribute;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::NodeSnapshot;

    fn snapshot(attributes: Vec<NodeId>, bounding: NodeId) -> NodeSnapshot {
        NodeSnapshot {
            id: NodeId::mint(),
            parent: NodeId::NULL,
            enabled: true,
            data: NodeData::Geometry {
                attributes,
                bounding_position_attribute: bounding,
            },
        }
    }

    #[test]
    fn test_peer_property_mirroring() {
        let attrs: Vec<NodeId> = (0..4).map(|_| NodeId::mint()).collect();
        let snapshot = snapshot(attrs.clone(), attrs[0]);
        let mut geometry = Geometry::default();

        geometry.initialize_from_snapshot(&snapshot);

        assert_eq!(geometry.peer_id(), snapshot.id);
        assert!(!geometry.is_dirty());
        assert!(geometry.is_enabled());
        assert_eq!(geometry.attributes(), attrs.as_slice());
        assert_eq!(geometry.bounding_position_attribute(), attrs[0]);
    }

    #[test]
    fn test_initial_and_cleaned_up_state() {
        let mut geometry = Geometry::default();
        assert!(!geometry.is_dirty());
        assert!(geometry.attributes().is_empty());
        assert!(geometry.peer_id().is_null());
        assert!(geometry.bounding_position_attribute().is_null());

        let attrs: Vec<NodeId> = (0..4).map(|_| NodeId::mint()).collect();
        geometry.initialize_from_snapshot(&snapshot(attrs.clone(), attrs[0]));
        geometry.cleanup();

        assert_eq!(geometry, Geometry::default());
        geometry.cleanup();
        assert_eq!(geometry, Geometry::default());
    }

    #[test]
    fn test_property_changes() {
        let mut geometry = Geometry::default();
        let id = NodeId::mint();
        let attribute = NodeId::mint();

        geometry.scene_change_event(&ChangeRecord::node_added(id, properties::ATTRIBUTE, attribute));
        assert_eq!(geometry.attributes().len(), 1);
        assert!(geometry.is_dirty());

        geometry.unset_dirty();
        assert!(!geometry.is_dirty());

        geometry.scene_change_event(&ChangeRecord::node_removed(id, properties::ATTRIBUTE, attribute));
        assert!(geometry.attributes().is_empty());
        assert!(geometry.is_dirty());

        geometry.unset_dirty();

        let bounding = NodeId::mint();
        geometry.scene_change_event(&ChangeRecord::property_updated(id, properties::BOUNDING_POSITION_ATTRIBUTE, bounding));
        assert_eq!(geometry.bounding_position_attribute(), bounding);
        assert!(!geometry.is_dirty());
    }

    #[test]
    fn test_remove_drops_every_occurrence() {
        let mut geometry = Geometry::default();
        let id = NodeId::mint();
        let a = NodeId::mint();
        let b = NodeId::mint();
        for attribute in [a, b, a] {
            geometry.scene_change_event(&ChangeRecord::node_added(id, properties::ATTRIBUTE, attribute));
        }
        geometry.scene_change_event(&ChangeRecord::node_removed(id, properties::ATTRIBUTE, a));
        assert_eq!(geometry.attributes(), &[b]);
    }

    #[test]
    fn test_unknown_changes_are_ignored() {
        let mut geometry = Geometry::default();
        let id = NodeId::mint();
        geometry.scene_change_event(&ChangeRecord::property_updated(id, "vertexCount", 12));
        geometry.scene_change_event(&ChangeRecord::node_added(id, "material", NodeId::mint()));
        assert_eq!(geometry, Geometry::default());
    }
}
