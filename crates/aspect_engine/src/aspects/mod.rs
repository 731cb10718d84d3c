//! Pluggable backend subsystems
//!
//! An aspect owns the backend peers for the node types it cares about and
//! runs on its own worker thread. It only ever sees the frontend through the
//! change records routed to it, and only talks back through the records its
//! frame job returns.

pub mod input;
pub mod render;
pub mod worker;

pub use worker::{AspectWorker, WorkerChannels, WorkerCommand, WorkerEvent};

use crate::backend::PeerRouter;
use crate::change::{ChangeRecord, NodeType};
use crate::services::ServiceLocator;
use std::any::Any;

/// What an aspect gets to see while running a frame
pub struct FrameContext<'a> {
    /// Frame number requested by the engine
    pub frame: u64,
    /// Services available to aspects
    pub services: &'a ServiceLocator,
}

/// Backend subsystem driven by the aspect engine
pub trait Aspect: Send {
    /// Name used for logging and worker thread naming
    fn name(&self) -> &str;

    /// Peer pools of this aspect
    fn router(&self) -> &PeerRouter;

    /// Peer pools of this aspect, mutably
    fn router_mut(&mut self) -> &mut PeerRouter;

    /// Node types this aspect mirrors
    fn handled_node_types(&self) -> Vec<NodeType> {
        self.router().handled_node_types()
    }

    /// Called on the controlling thread before the worker starts
    fn on_register(&mut self, _services: &ServiceLocator) {}

    /// Called on the controlling thread after the worker stopped
    fn on_unregister(&mut self, _services: &ServiceLocator) {}

    /// Apply one change record to the peers
    fn process_change(&mut self, change: &ChangeRecord) {
        self.router_mut().process_change(change);
    }

    /// Per-frame job; returned records are sent to the frontend
    fn run_frame(&mut self, context: &FrameContext<'_>) -> Vec<ChangeRecord>;

    /// Clean up every peer
    fn shutdown(&mut self) {
        self.router_mut().shutdown();
    }

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;
}
