//! Routing of change records to the peer pools of one aspect

use super::manager::{BackendNodeManager, NodeMapper};
use super::node::{BackendNode, ProtocolViolation};
use crate::change::{ChangeKind, ChangeRecord, NodeType};
use crate::core::node_id::NodeId;
use std::collections::HashMap;

/// Drives peer creation, updates and destruction for one aspect
///
/// Creation picks the pool by the snapshot's node type; every later record
/// is routed by identifier alone. Records that break the peer lifecycle are
/// logged and dropped.
#[derive(Default)]
pub struct PeerRouter {
    mappers: HashMap<NodeType, Box<dyn NodeMapper>>,
    owners: HashMap<NodeId, NodeType>,
    violations: usize,
}

impl PeerRouter {
    /// Create a router without pools
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pool for backend node type `T` (builder pattern)
    pub fn with_manager<T: BackendNode>(mut self) -> Self {
        self.register_manager::<T>();
        self
    }

    /// Add a pool for backend node type `T`
    pub fn register_manager<T: BackendNode>(&mut self) {
        self.mappers
            .entry(T::NODE_TYPE)
            .or_insert_with(|| Box::new(BackendNodeManager::<T>::new()));
    }

    /// Node types this router mirrors
    pub fn handled_node_types(&self) -> Vec<NodeType> {
        self.mappers.keys().copied().collect()
    }

    /// Pool for backend node type `T`
    pub fn manager<T: BackendNode>(&self) -> Option<&BackendNodeManager<T>> {
        self.mappers
            .get(&T::NODE_TYPE)
            .and_then(|mapper| mapper.as_any().downcast_ref())
    }

    /// Pool for backend node type `T`, mutably
    pub fn manager_mut<T: BackendNode>(&mut self) -> Option<&mut BackendNodeManager<T>> {
        self.mappers
            .get_mut(&T::NODE_TYPE)
            .and_then(|mapper| mapper.as_any_mut().downcast_mut())
    }

    /// Apply one record
    pub fn process_change(&mut self, change: &ChangeRecord) {
        if let Err(violation) = self.try_process_change(change) {
            self.violations += 1;
            log::warn!("Dropping change record: {}", violation);
        }
    }

    fn try_process_change(&mut self, change: &ChangeRecord) -> Result<(), ProtocolViolation> {
        let subject = change.subject();
        match change.kind() {
            ChangeKind::NodeCreated => {
                let Some(snapshot) = change.snapshot() else {
                    log::warn!("Creation record for {} carries no snapshot", subject);
                    return Ok(());
                };
                let node_type = snapshot.node_type();
                let Some(mapper) = self.mappers.get_mut(&node_type) else {
                    log::trace!("Ignoring creation of unmanaged {:?} {}", node_type, subject);
                    return Ok(());
                };
                mapper.create(snapshot)?;
                self.owners.insert(subject, node_type);
                Ok(())
            }
            ChangeKind::NodeDestroyed => {
                match self.owners.remove(&subject).and_then(|ty| self.mappers.get_mut(&ty)) {
                    Some(mapper) => {
                        mapper.destroy(subject);
                    }
                    None => self.check_not_retired(change)?,
                }
                Ok(())
            }
            ChangeKind::PropertyUpdated | ChangeKind::NodeAdded | ChangeKind::NodeRemoved => {
                match self.owners.get(&subject).and_then(|ty| self.mappers.get_mut(ty)) {
                    Some(mapper) => mapper.route(change),
                    None => {
                        self.check_not_retired(change)?;
                        log::trace!("No peer for {:?} on {}", change.kind(), subject);
                        Ok(())
                    }
                }
            }
        }
    }

    fn check_not_retired(&self, change: &ChangeRecord) -> Result<(), ProtocolViolation> {
        let subject = change.subject();
        if self.mappers.values().any(|mapper| mapper.is_retired(subject)) {
            return Err(ProtocolViolation::AfterCleanup {
                node: subject,
                kind: change.kind(),
            });
        }
        Ok(())
    }

    /// Clean up every peer of every pool
    pub fn shutdown(&mut self) {
        for mapper in self.mappers.values_mut() {
            mapper.shutdown();
        }
        self.owners.clear();
    }

    /// Number of live peers across pools
    pub fn peer_count(&self) -> usize {
        self.mappers.values().map(|mapper| mapper.peer_count()).sum()
    }

    /// Number of nodes with a live peer in some pool
    pub fn tracked_node_count(&self) -> usize {
        self.owners.len()
    }

    /// Number of records dropped for breaking the peer lifecycle
    pub fn violation_count(&self) -> usize {
        self.violations
    }
}

impl std::fmt::Debug for PeerRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerRouter")
            .field("node_types", &self.handled_node_types())
            .field("peers", &self.peer_count())
            .field("violations", &self.violations)
            .finish()
    }
}
