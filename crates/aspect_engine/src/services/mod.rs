//! Cross-cutting services discovered by aspects at runtime
//!
//! Aspects look services up through the [`ServiceLocator`] by integer key.
//! Two keys are reserved for services every aspect can rely on: system
//! information and OpenGL information. Those always resolve, falling back to
//! do-nothing implementations when nothing better has been registered.

pub mod locator;
pub mod opengl_information;
pub mod system_information;

pub use locator::ServiceLocator;
pub use opengl_information::{NullOpenGLInformationService, OpenGLInformationService, StaticOpenGLInformation};
pub use system_information::{EngineSystemInformation, NullSystemInformationService, SystemInformationService};

use std::fmt;
use std::sync::Arc;

/// Integer key identifying a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceType(pub i32);

impl ServiceType {
    /// System information (frame count, worker threads)
    pub const SYSTEM_INFORMATION: Self = Self(0);
    /// OpenGL context information
    pub const OPENGL_INFORMATION: Self = Self(1);
    /// First key available to user defined services
    pub const USER_SERVICE: Self = Self(256);

    /// Number of reserved keys that always resolve to a provider
    pub const DEFAULT_SERVICE_COUNT: usize = 2;

    /// Whether this key has a built-in default provider
    pub fn is_default(self) -> bool {
        self == Self::SYSTEM_INFORMATION || self == Self::OPENGL_INFORMATION
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SYSTEM_INFORMATION => write!(f, "SystemInformation"),
            Self::OPENGL_INFORMATION => write!(f, "OpenGLInformation"),
            Self(key) => write!(f, "Service({key})"),
        }
    }
}

/// A service implementation that can be registered with the locator
///
/// The `into_*` hooks let the locator hand out the two reserved services
/// through their typed interfaces. Implementations of those services
/// override the matching hook to return themselves.
pub trait ServiceProvider: Send + Sync {
    /// Key this provider is meant to be registered under
    fn service_type(&self) -> ServiceType;

    /// Human readable description
    fn description(&self) -> &str;

    /// Typed view as a system information service
    fn into_system_information(self: Arc<Self>) -> Option<Arc<dyn SystemInformationService>> {
        None
    }

    /// Typed view as an OpenGL information service
    fn into_opengl_information(self: Arc<Self>) -> Option<Arc<dyn OpenGLInformationService>> {
        None
    }
}
