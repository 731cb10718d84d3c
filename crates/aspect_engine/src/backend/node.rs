//! Backend peers and their lifecycle
//!
//! A backend node mirrors the state of one frontend node for one aspect. It
//! only ever stores identifiers of other nodes, never the nodes themselves.

use crate::change::{properties, ChangeKind, ChangeRecord, NodeData, NodeSnapshot, NodeType};
use crate::core::node_id::NodeId;
use thiserror::Error;

/// State shared by every backend node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendNodeBase {
    peer_id: NodeId,
    enabled: bool,
    dirty: bool,
}

impl BackendNodeBase {
    /// Identifier of the mirrored frontend node
    pub fn peer_id(&self) -> NodeId {
        self.peer_id
    }

    /// Mirrored enabled flag
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether mirrored state changed since the aspect last consumed it
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag mirrored state as changed
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Acknowledge the current state
    pub fn unset_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Backend mirror of a frontend node
///
/// Implementors only deal with their role specific state: the provided
/// methods take care of the peer id, the enabled flag and the dirty flag.
pub trait BackendNode: Default + Send + 'static {
    /// Frontend node type this backend node mirrors
    const NODE_TYPE: NodeType;

    /// Shared state
    fn base(&self) -> &BackendNodeBase;

    /// Shared state, mutably
    fn base_mut(&mut self) -> &mut BackendNodeBase;

    /// Copy role specific state out of a creation snapshot
    fn initialize_from_data(&mut self, data: &NodeData);

    /// Apply a role specific change
    ///
    /// Unknown properties and kinds must be ignored.
    fn apply_change(&mut self, change: &ChangeRecord);

    /// Reset every mirrored field to its default value
    fn cleanup(&mut self) {
        *self = Self::default();
    }

    /// Full state handoff; leaves the node clean
    fn initialize_from_snapshot(&mut self, snapshot: &NodeSnapshot) {
        {
            let base = self.base_mut();
            base.peer_id = snapshot.id;
            base.enabled = snapshot.enabled;
        }
        self.initialize_from_data(&snapshot.data);
        self.base_mut().unset_dirty();
    }

    /// Incremental update
    fn scene_change_event(&mut self, change: &ChangeRecord) {
        if change.kind() == ChangeKind::PropertyUpdated && change.property() == properties::ENABLED {
            if let Some(enabled) = change.value().as_bool() {
                let base = self.base_mut();
                base.enabled = enabled;
                base.mark_dirty();
            }
            return;
        }
        self.apply_change(change);
    }

    /// Identifier of the mirrored frontend node
    fn peer_id(&self) -> NodeId {
        self.base().peer_id()
    }

    /// Mirrored enabled flag
    fn is_enabled(&self) -> bool {
        self.base().is_enabled()
    }

    /// Whether mirrored state changed since the aspect last consumed it
    fn is_dirty(&self) -> bool {
        self.base().is_dirty()
    }

    /// Acknowledge the current state
    fn unset_dirty(&mut self) {
        self.base_mut().unset_dirty();
    }
}

/// Where a peer stands with respect to its frontend node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PeerState {
    /// Constructed, no snapshot received yet
    #[default]
    Uninitialized,
    /// Mirroring the frontend node
    Synchronized,
    /// Torn down; terminal
    CleanedUp,
}

/// Record delivered outside the peer lifecycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// Incremental change before the initial snapshot
    #[error("{kind:?} for {node} arrived before its snapshot")]
    NotSynchronized {
        /// Target node
        node: NodeId,
        /// Offending change kind
        kind: ChangeKind,
    },

    /// Anything after cleanup
    #[error("{kind:?} for {node} arrived after cleanup")]
    AfterCleanup {
        /// Target node
        node: NodeId,
        /// Offending change kind
        kind: ChangeKind,
    },

    /// Second snapshot for the same peer
    #[error("{0} is already synchronized")]
    AlreadySynchronized(NodeId),

    /// Record about another node
    #[error("record for {subject} delivered to peer {peer}")]
    SubjectMismatch {
        /// Peer that received the record
        peer: NodeId,
        /// Node the record is about
        subject: NodeId,
    },

    /// No peer exists for the node
    #[error("no peer for {0}")]
    UnknownPeer(NodeId),
}

/// A backend node together with its lifecycle state
#[derive(Debug, Default)]
pub struct PeerSlot<T: BackendNode> {
    state: PeerState,
    node: T,
}

impl<T: BackendNode> PeerSlot<T> {
    /// Fresh, uninitialized peer
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state
    pub fn state(&self) -> PeerState {
        self.state
    }

    /// Uninitialized -> Synchronized
    pub fn synchronize(&mut self, snapshot: &NodeSnapshot) -> Result<(), ProtocolViolation> {
        match self.state() {
            PeerState::Uninitialized => {
                self.node.initialize_from_snapshot(snapshot);
                self.state = PeerState::Synchronized;
                Ok(())
            }
            PeerState::Synchronized => Err(ProtocolViolation::AlreadySynchronized(snapshot.id)),
            PeerState::CleanedUp => Err(ProtocolViolation::AfterCleanup {
                node: snapshot.id,
                kind: ChangeKind::NodeCreated,
            }),
        }
    }

    /// Synchronized -> Synchronized
    pub fn apply(&mut self, change: &ChangeRecord) -> Result<(), ProtocolViolation> {
        match self.state() {
            PeerState::Uninitialized => Err(ProtocolViolation::NotSynchronized {
                node: change.subject(),
                kind: change.kind(),
            }),
            PeerState::CleanedUp => Err(ProtocolViolation::AfterCleanup {
                node: change.subject(),
                kind: change.kind(),
            }),
            PeerState::Synchronized if change.subject() != self.node.peer_id() => Err(ProtocolViolation::SubjectMismatch {
                peer: self.node.peer_id(),
                subject: change.subject(),
            }),
            PeerState::Synchronized => {
                self.node.scene_change_event(change);
                Ok(())
            }
        }
    }

    /// Any state -> CleanedUp; safe to call repeatedly
    pub fn teardown(&mut self) {
        self.node.cleanup();
        self.state = PeerState::CleanedUp;
    }

    /// Mirrored node
    pub fn node(&self) -> &T {
        &self.node
    }

    /// Mirrored node, mutably
    pub fn node_mut(&mut self) -> &mut T {
        &mut self.node
    }
}
