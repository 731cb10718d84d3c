//! Application trait and lifecycle management

use crate::core::config::{ApplicationConfig, ConfigError};
use crate::engine::{AspectEngine, EngineError};
use crate::frontend::SceneError;
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive a scene with the aspect engine.
pub trait Application {
    /// Initialize the application
    ///
    /// Called once after the engine is created. Register aspects here, then
    /// create the scene: aspects only mirror nodes created after they were
    /// registered.
    fn initialize(&mut self, engine: &mut AspectEngine, config: &ApplicationConfig) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame, right after the frame was requested from the
    /// aspects. Apply backend results to the scene and mutate it here.
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `frame` - Number of the frame just requested
    fn update(&mut self, engine: &mut AspectEngine, frame: u64) -> Result<(), AppError>;

    /// Cleanup the application
    ///
    /// Called once the main loop exits, before the aspects are stopped.
    fn cleanup(&mut self, engine: &mut AspectEngine);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Scene manipulation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
