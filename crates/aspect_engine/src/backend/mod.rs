//! Backend peer infrastructure shared by every aspect
//!
//! - [`BackendNode`]: mirror of one frontend node's state
//! - [`PeerSlot`]: lifecycle guard (uninitialized, synchronized, cleaned up)
//! - [`BackendNodeManager`]: pool of peers of one type
//! - [`PeerRouter`]: dispatches change records to the right pool

pub mod manager;
pub mod node;
pub mod router;

pub use manager::{BackendNodeManager, NodeMapper, RETIRED_CAPACITY};
pub use node::{BackendNode, BackendNodeBase, PeerSlot, PeerState, ProtocolViolation};
pub use router::PeerRouter;
