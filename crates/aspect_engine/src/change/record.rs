//! Change records
//!
//! A record describes one mutation observed on a frontend node. It is built
//! synchronously by the mutating call, frozen behind an `Arc` when published,
//! and read by every interested backend peer.

use super::value::{NodeSnapshot, NodeType, PropertyValue};
use crate::core::node_id::NodeId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared, immutable change record
pub type ChangePtr = Arc<ChangeRecord>;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Property names understood by the built-in peers
pub mod properties {
    /// Node enabled flag
    pub const ENABLED: &str = "enabled";
    /// Geometry attribute list entry
    pub const ATTRIBUTE: &str = "attribute";
    /// Geometry bounding volume position attribute
    pub const BOUNDING_POSITION_ATTRIBUTE: &str = "boundingVolumeSpecifierPositionAttribute";
    /// Axis input buttons
    pub const BUTTONS: &str = "buttons";
    /// Axis input scale
    pub const SCALE: &str = "scale";
    /// Axis input source device
    pub const SOURCE_DEVICE: &str = "sourceDevice";
    /// Picking method
    pub const PICK_METHOD: &str = "pickMethod";
    /// Picking result mode
    pub const PICK_RESULT_MODE: &str = "pickResultMode";
    /// Picking face orientation
    pub const FACE_ORIENTATION_PICKING_MODE: &str = "faceOrientationPickingMode";
    /// Scene loader source URL
    pub const SOURCE: &str = "source";
    /// Scene loader imported subtree
    pub const SCENE: &str = "scene";
    /// Entity component list entry
    pub const COMPONENT: &str = "component";
    /// Node child list entry
    pub const CHILD: &str = "child";
}

/// What happened to the subject node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A property changed value
    PropertyUpdated,
    /// A reference was added to one of the node's lists
    NodeAdded,
    /// A reference was removed from one of the node's lists
    NodeRemoved,
    /// The node was created; the payload is its snapshot
    NodeCreated,
    /// The node was destroyed
    NodeDestroyed,
}

/// Which peers a record is meant for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeliveryScope {
    /// Only peers mirroring the subject node
    #[default]
    Node,
    /// The subject node and everything below it; broadcast to every aspect
    Subtree,
}

/// One observed mutation of a frontend node
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    subject: NodeId,
    kind: ChangeKind,
    property: &'static str,
    value: PropertyValue,
    scope: DeliveryScope,
    sequence: u64,
    timestamp: Instant,
}

impl ChangeRecord {
    fn new(subject: NodeId, kind: ChangeKind, property: &'static str, value: PropertyValue) -> Self {
        Self {
            subject,
            kind,
            property,
            value,
            scope: DeliveryScope::Node,
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            timestamp: Instant::now(),
        }
    }

    /// A property of `subject` now holds `value`
    pub fn property_updated(subject: NodeId, property: &'static str, value: impl Into<PropertyValue>) -> Self {
        Self::new(subject, ChangeKind::PropertyUpdated, property, value.into())
    }

    /// `added` was appended to the `property` list of `subject`
    pub fn node_added(subject: NodeId, property: &'static str, added: NodeId) -> Self {
        Self::new(subject, ChangeKind::NodeAdded, property, PropertyValue::Node(added))
    }

    /// `removed` was taken out of the `property` list of `subject`
    pub fn node_removed(subject: NodeId, property: &'static str, removed: NodeId) -> Self {
        Self::new(subject, ChangeKind::NodeRemoved, property, PropertyValue::Node(removed))
    }

    /// A node came into existence with the given state
    pub fn node_created(snapshot: NodeSnapshot) -> Self {
        Self::new(snapshot.id, ChangeKind::NodeCreated, "", PropertyValue::Snapshot(Box::new(snapshot)))
    }

    /// A node was destroyed
    pub fn node_destroyed(subject: NodeId) -> Self {
        Self::new(subject, ChangeKind::NodeDestroyed, "", PropertyValue::Empty)
    }

    /// Change the delivery scope (builder pattern)
    pub fn with_scope(mut self, scope: DeliveryScope) -> Self {
        self.scope = scope;
        self
    }

    /// Node that originated the change
    pub fn subject(&self) -> NodeId {
        self.subject
    }

    /// Kind of change
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Property name, empty for creation and destruction
    pub fn property(&self) -> &'static str {
        self.property
    }

    /// Payload
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Delivery scope
    pub fn scope(&self) -> DeliveryScope {
        self.scope
    }

    /// Global emission order, increasing across the whole process
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the mutation was observed
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Creation snapshot for `NodeCreated` records
    pub fn snapshot(&self) -> Option<&NodeSnapshot> {
        match self.kind {
            ChangeKind::NodeCreated => self.value.as_snapshot(),
            _ => None,
        }
    }

    /// Node type announced by a `NodeCreated` record
    pub fn created_node_type(&self) -> Option<NodeType> {
        self.snapshot().map(NodeSnapshot::node_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::value::NodeData;

    #[test]
    fn test_sequence_follows_emission_order() {
        let id = NodeId::mint();
        let first = ChangeRecord::property_updated(id, properties::SCALE, 1.0_f32);
        let second = ChangeRecord::property_updated(id, properties::SCALE, 2.0_f32);
        assert!(first.sequence() < second.sequence());
        assert!(first.timestamp() <= second.timestamp());
    }

    #[test]
    fn test_added_and_removed_carry_referenced_node() {
        let geometry = NodeId::mint();
        let attribute = NodeId::mint();

        let added = ChangeRecord::node_added(geometry, properties::ATTRIBUTE, attribute);
        assert_eq!(added.kind(), ChangeKind::NodeAdded);
        assert_eq!(added.subject(), geometry);
        assert_eq!(added.value().as_node(), Some(attribute));

        let removed = ChangeRecord::node_removed(geometry, properties::ATTRIBUTE, attribute);
        assert_eq!(removed.kind(), ChangeKind::NodeRemoved);
        assert_eq!(removed.property(), properties::ATTRIBUTE);
    }

    #[test]
    fn test_created_record_exposes_snapshot() {
        let id = NodeId::mint();
        let record = ChangeRecord::node_created(NodeSnapshot {
            id,
            parent: NodeId::NULL,
            enabled: true,
            data: NodeData::Attribute { name: "position".into() },
        });
        assert_eq!(record.subject(), id);
        assert_eq!(record.created_node_type(), Some(NodeType::Attribute));
        assert_eq!(record.scope(), DeliveryScope::Node);

        let destroyed = ChangeRecord::node_destroyed(id).with_scope(DeliveryScope::Subtree);
        assert!(destroyed.snapshot().is_none());
        assert_eq!(destroyed.scope(), DeliveryScope::Subtree);
    }
}
