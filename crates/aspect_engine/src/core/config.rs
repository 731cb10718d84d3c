//! # Unified Configuration System
//!
//! Configuration for the aspect engine and the aspects shipped with it.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: Logging, worker thread naming, frame pacing
//! - **Render Aspect Config**: Whether the render aspect runs and which
//!   graphics context it advertises through the service locator
//! - **Input Aspect Config**: Whether the input aspect runs

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// # Engine Configuration
///
/// Core engine behavior: logging, aspect worker threads and the frame loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Prefix used to name aspect worker threads
    pub thread_name_prefix: String,
    /// Target frame interval of the run loop in milliseconds (0 = no pacing)
    pub frame_budget_ms: u64,
    /// Stop the run loop after this many frames
    pub max_frames: Option<u64>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            thread_name_prefix: "aspect".to_string(),
            frame_budget_ms: 16,
            max_frames: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the worker thread name prefix
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the frame interval
    pub fn with_frame_budget_ms(mut self, budget: u64) -> Self {
        self.frame_budget_ms = budget;
        self
    }

    /// Cap the number of frames the run loop executes
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
        if !LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(format!("Unknown log level: {}", self.log_level));
        }
        if self.thread_name_prefix.is_empty() {
            return Err("Thread name prefix cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Graphics context description published as the OpenGL information service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenGLInfoConfig {
    /// GL vendor string
    pub vendor: String,
    /// GL renderer string
    pub renderer: String,
    /// GL version string
    pub version: String,
}

/// # Render Aspect Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderAspectConfig {
    /// Whether the render aspect is registered
    pub enabled: bool,
    /// Context advertised through the service locator, if known
    pub opengl: Option<OpenGLInfoConfig>,
}

impl RenderAspectConfig {
    /// Create a new render aspect configuration
    pub fn new() -> Self {
        Self {
            enabled: true,
            opengl: None,
        }
    }

    /// Advertise a graphics context
    pub fn with_opengl(mut self, info: OpenGLInfoConfig) -> Self {
        self.opengl = Some(info);
        self
    }
}

impl Default for RenderAspectConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Input Aspect Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputAspectConfig {
    /// Whether the input aspect is registered
    pub enabled: bool,
}

impl Default for InputAspectConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Render aspect configuration
    pub render: RenderAspectConfig,
    /// Input aspect configuration
    pub input: InputAspectConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.engine.validate()?;
        if let Some(gl) = &self.render.opengl {
            if gl.version.is_empty() {
                return Err("OpenGL version cannot be empty when OpenGL info is given".to_string());
            }
        }
        Ok(())
    }
}

impl Config for ApplicationConfig {}
