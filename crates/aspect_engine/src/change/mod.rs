//! Frontend to backend change propagation
//!
//! Mutations on frontend nodes become immutable [`ChangeRecord`]s that the
//! [`ChangeChannel`] fans out to every aspect mirroring the mutated node.

pub mod channel;
pub mod record;
pub mod value;

pub use channel::{ChangeChannel, SubscriberId};
pub use record::{properties, ChangeKind, ChangePtr, ChangeRecord, DeliveryScope};
pub use value::{LoadedScene, NodeData, NodeSnapshot, NodeType, PropertyValue};
