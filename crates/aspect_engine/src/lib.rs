//! # Aspect Engine
//!
//! A frontend scene graph mirrored into pluggable backend aspects.
//!
//! ## Features
//!
//! - **Change Propagation**: Every frontend mutation becomes an immutable change
//!   record, delivered in order to each aspect mirroring the node
//! - **Backend Peers**: Per-aspect mirrors of frontend nodes with a strict
//!   snapshot, update and cleanup lifecycle
//! - **Aspects**: Render and input subsystems, each on its own worker thread
//! - **Service Locator**: Typed services with safe defaults for aspects
//! - **Scene Loading**: Imported scenes grafted into the frontend on completion
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aspect_engine::prelude::*;
//! use std::sync::Arc;
//!
//! struct MyApp {
//!     scene: Option<Scene>,
//! }
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut AspectEngine, config: &ApplicationConfig) -> Result<(), AppError> {
//!         engine.register_aspect(RenderAspect::from_config(&config.render, Arc::new(NullSceneImporter)))?;
//!         let mut scene = engine.create_scene()?;
//!         let root = scene.create_entity("root", None)?;
//!         let loader = scene.create_scene_loader("level.ron");
//!         scene.add_component(root, loader)?;
//!         self.scene = Some(scene);
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, _engine: &mut AspectEngine, _frame: u64) -> Result<(), AppError> {
//!         if let Some(scene) = &mut self.scene {
//!             scene.process_backend_changes();
//!         }
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut AspectEngine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let mut app = MyApp { scene: None };
//!     AspectEngine::run(config, &mut app)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;
pub mod foundation;

// Synchronization protocol
pub mod change;
pub mod backend;
pub mod services;

// Scene and aspects
pub mod frontend;
pub mod aspects;

mod application;
mod engine;

#[cfg(test)]
mod tests;

pub use application::{Application, AppError};
pub use engine::{AspectEngine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Application, AppError,
        AspectEngine, EngineError,
        aspects::{
            Aspect, FrameContext,
            input::{InputAspect, InputState},
            render::{NullSceneImporter, RenderAspect, SceneImporter},
        },
        change::{ChangeRecord, NodeType},
        core::{
            config::{ApplicationConfig, Config, EngineConfig},
            node_id::NodeId,
            picking::{FaceOrientation, PickMethod, PickResultMode},
            scene_tree::SceneTree,
        },
        frontend::{Scene, SceneError, SceneLoaderStatus},
        services::{ServiceLocator, ServiceType},
    };
}
