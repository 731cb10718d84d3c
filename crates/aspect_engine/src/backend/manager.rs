//! Per-type pools of backend peers

use super::node::{BackendNode, PeerSlot, ProtocolViolation};
use crate::change::{ChangeKind, ChangeRecord, NodeSnapshot, NodeType};
use crate::core::node_id::NodeId;
use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};

/// Destroyed ids remembered per pool; the oldest are forgotten first
pub const RETIRED_CAPACITY: usize = 4096;

/// Owns every peer of one backend node type
#[derive(Debug)]
pub struct BackendNodeManager<T: BackendNode> {
    peers: HashMap<NodeId, PeerSlot<T>>,
    retired: HashSet<NodeId>,
    retired_order: VecDeque<NodeId>,
}

impl<T: BackendNode> Default for BackendNodeManager<T> {
    fn default() -> Self {
        Self {
            peers: HashMap::new(),
            retired: HashSet::new(),
            retired_order: VecDeque::new(),
        }
    }
}

impl<T: BackendNode> BackendNodeManager<T> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and synchronize the peer for a new node
    pub fn create(&mut self, snapshot: &NodeSnapshot) -> Result<&mut T, ProtocolViolation> {
        if self.retired.contains(&snapshot.id) {
            return Err(ProtocolViolation::AfterCleanup {
                node: snapshot.id,
                kind: ChangeKind::NodeCreated,
            });
        }
        let slot = self.peers.entry(snapshot.id).or_default();
        slot.synchronize(snapshot)?;
        Ok(slot.node_mut())
    }

    /// Deliver an incremental change to the subject's peer
    pub fn route(&mut self, change: &ChangeRecord) -> Result<(), ProtocolViolation> {
        let subject = change.subject();
        if self.retired.contains(&subject) {
            return Err(ProtocolViolation::AfterCleanup {
                node: subject,
                kind: change.kind(),
            });
        }
        self.peers
            .get_mut(&subject)
            .ok_or(ProtocolViolation::UnknownPeer(subject))?
            .apply(change)
    }

    /// Clean up and drop the peer of a destroyed node
    ///
    /// Returns `false` if no live peer existed.
    pub fn destroy(&mut self, id: NodeId) -> bool {
        match self.peers.remove(&id) {
            Some(mut slot) => {
                slot.teardown();
                self.retire(id);
                true
            }
            None => false,
        }
    }

    /// Clean up every peer
    pub fn shutdown(&mut self) {
        let drained: Vec<_> = self.peers.drain().collect();
        for (id, mut slot) in drained {
            slot.teardown();
            self.retire(id);
        }
    }

    fn retire(&mut self, id: NodeId) {
        if !self.retired.insert(id) {
            return;
        }
        self.retired_order.push_back(id);
        while self.retired_order.len() > RETIRED_CAPACITY {
            if let Some(oldest) = self.retired_order.pop_front() {
                self.retired.remove(&oldest);
            }
        }
    }

    /// Peer mirroring `id`
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.peers.get(&id).map(PeerSlot::node)
    }

    /// Peer mirroring `id`, mutably
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.peers.get_mut(&id).map(PeerSlot::node_mut)
    }

    /// Whether `id` had a peer that has since been destroyed
    ///
    /// Only the last [`RETIRED_CAPACITY`] destroyed ids are remembered.
    pub fn is_retired(&self, id: NodeId) -> bool {
        self.retired.contains(&id)
    }

    /// Number of remembered destroyed ids
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    /// Live peers
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.peers.values().map(PeerSlot::node)
    }

    /// Live peers, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.peers.values_mut().map(PeerSlot::node_mut)
    }

    /// Ids of peers with unconsumed changes
    pub fn dirty_ids(&self) -> Vec<NodeId> {
        self.iter().filter(|node| node.is_dirty()).map(BackendNode::peer_id).collect()
    }

    /// Number of live peers
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether there are no live peers
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// Type erased view of a [`BackendNodeManager`]
pub trait NodeMapper: Send {
    /// Node type handled by this mapper
    fn node_type(&self) -> NodeType;

    /// Create the peer for a new node
    fn create(&mut self, snapshot: &NodeSnapshot) -> Result<(), ProtocolViolation>;

    /// Deliver an incremental change
    fn route(&mut self, change: &ChangeRecord) -> Result<(), ProtocolViolation>;

    /// Destroy the peer of a node
    fn destroy(&mut self, id: NodeId) -> bool;

    /// Clean up every peer
    fn shutdown(&mut self);

    /// Whether the peer of `id` was destroyed recently
    fn is_retired(&self, id: NodeId) -> bool;

    /// Number of live peers
    fn peer_count(&self) -> usize;

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;

    /// Downcasting support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: BackendNode> NodeMapper for BackendNodeManager<T> {
    fn node_type(&self) -> NodeType {
        T::NODE_TYPE
    }

    fn create(&mut self, snapshot: &NodeSnapshot) -> Result<(), ProtocolViolation> {
        BackendNodeManager::create(self, snapshot).map(|_| ())
    }

    fn route(&mut self, change: &ChangeRecord) -> Result<(), ProtocolViolation> {
        BackendNodeManager::route(self, change)
    }

    fn destroy(&mut self, id: NodeId) -> bool {
        BackendNodeManager::destroy(self, id)
    }

    fn shutdown(&mut self) {
        BackendNodeManager::shutdown(self);
    }

    fn is_retired(&self, id: NodeId) -> bool {
        BackendNodeManager::is_retired(self, id)
    }

    fn peer_count(&self) -> usize {
        self.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
