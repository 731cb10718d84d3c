//! # Core Engine Module
//!
//! Shared abstractions used by both halves of the engine: node identity,
//! the unified configuration and small value types that travel between the
//! frontend scene and the backend aspects.

pub mod config;
pub mod node_id;
pub mod picking;
pub mod scene_tree;

pub use config::{
    ApplicationConfig,
    Config,
    ConfigError,
    EngineConfig,
    InputAspectConfig,
    OpenGLInfoConfig,
    RenderAspectConfig,
};
pub use node_id::NodeId;
pub use picking::{FaceOrientation, PickMethod, PickResultMode};
pub use scene_tree::SceneTree;
