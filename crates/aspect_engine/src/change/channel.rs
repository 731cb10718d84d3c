//! Ordered fan-out of change records to aspect subscribers
//!
//! Every subscriber owns one FIFO queue, so records for a given node reach a
//! subscriber in emission order. Interest is tracked per node on the producer
//! side: it is decided when the `NodeCreated` record is published and dropped
//! together with the `NodeDestroyed` record, both while the routing lock is
//! held. A subscriber therefore sees the snapshot of a node before any
//! incremental record for it, and nothing for it after the destruction.

use super::record::{ChangeKind, ChangePtr, ChangeRecord, DeliveryScope};
use super::value::NodeType;
use crate::core::node_id::NodeId;
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifier of a channel subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Subscriber {
    id: SubscriberId,
    name: String,
    node_types: HashSet<NodeType>,
    sender: Sender<ChangePtr>,
}

#[derive(Default)]
struct Routing {
    next_id: u64,
    subscribers: Vec<Subscriber>,
    interest: HashMap<NodeId, Vec<SubscriberId>>,
}

/// Change channel shared by the frontend scene and the aspect engine
#[derive(Default)]
pub struct ChangeChannel {
    routing: Mutex<Routing>,
}

impl ChangeChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    fn routing(&self) -> MutexGuard<'_, Routing> {
        self.routing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a subscriber interested in nodes of the given types
    ///
    /// Returns the subscriber id and the receiving end of its queue.
    pub fn subscribe(&self, name: impl Into<String>, node_types: &[NodeType]) -> (SubscriberId, Receiver<ChangePtr>) {
        let (sender, receiver) = unbounded();
        let mut routing = self.routing();
        let id = SubscriberId(routing.next_id);
        routing.next_id += 1;
        let name = name.into();
        log::debug!("Change channel subscriber '{}' registered for {:?}", name, node_types);
        routing.subscribers.push(Subscriber {
            id,
            name,
            node_types: node_types.iter().copied().collect(),
            sender,
        });
        (id, receiver)
    }

    /// Remove a subscriber; its queue disconnects once drained
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut routing = self.routing();
        routing.subscribers.retain(|subscriber| subscriber.id != id);
        routing.interest.retain(|_, subscribers| {
            subscribers.retain(|subscriber| *subscriber != id);
            !subscribers.is_empty()
        });
    }

    /// Publish a record; never blocks on consumers
    ///
    /// Returns the number of queues the record was pushed to.
    pub fn publish(&self, record: ChangeRecord) -> usize {
        let record: ChangePtr = Arc::new(record);
        let subject = record.subject();
        let mut routing = self.routing();

        if record.kind() == ChangeKind::NodeCreated {
            if let Some(node_type) = record.created_node_type() {
                let interested: Vec<SubscriberId> = routing
                    .subscribers
                    .iter()
                    .filter(|subscriber| subscriber.node_types.contains(&node_type))
                    .map(|subscriber| subscriber.id)
                    .collect();
                if !interested.is_empty() {
                    routing.interest.insert(subject, interested);
                }
            }
        }

        let targets: Vec<SubscriberId> = match record.scope() {
            DeliveryScope::Subtree => routing.subscribers.iter().map(|subscriber| subscriber.id).collect(),
            DeliveryScope::Node => routing.interest.get(&subject).cloned().unwrap_or_default(),
        };

        if record.kind() == ChangeKind::NodeDestroyed {
            routing.interest.remove(&subject);
        }

        let mut delivered = 0;
        for subscriber in routing.subscribers.iter().filter(|subscriber| targets.contains(&subscriber.id)) {
            if subscriber.sender.send(Arc::clone(&record)).is_ok() {
                delivered += 1;
            } else {
                log::debug!("Subscriber '{}' queue closed, dropping {:?} for {}", subscriber.name, record.kind(), subject);
            }
        }

        if delivered == 0 {
            log::trace!("No subscriber for {:?} on {}", record.kind(), subject);
        }
        delivered
    }

    /// Subscribers currently interested in `node`
    pub fn interested_in(&self, node: NodeId) -> Vec<SubscriberId> {
        self.routing().interest.get(&node).cloned().unwrap_or_default()
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.routing().subscribers.len()
    }
}

impl std::fmt::Debug for ChangeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routing = self.routing();
        f.debug_struct("ChangeChannel")
            .field("subscribers", &routing.subscribers.iter().map(|s| s.name.as_str()).collect::<Vec<_>>())
            .field("tracked_nodes", &routing.interest.len())
            .finish()
    }
}
