//! OpenGL information service

use super::{ServiceProvider, ServiceType};
use crate::core::config::OpenGLInfoConfig;
use std::sync::Arc;

/// Description of the graphics context in use
pub trait OpenGLInformationService: ServiceProvider {
    /// GL vendor string
    fn vendor(&self) -> &str;

    /// GL renderer string
    fn renderer(&self) -> &str;

    /// GL version string
    fn version(&self) -> &str;
}

/// Default provider with empty strings
#[derive(Debug, Default)]
pub struct NullOpenGLInformationService;

impl ServiceProvider for NullOpenGLInformationService {
    fn service_type(&self) -> ServiceType {
        ServiceType::OPENGL_INFORMATION
    }

    fn description(&self) -> &str {
        "Null OpenGL information service"
    }

    fn into_opengl_information(self: Arc<Self>) -> Option<Arc<dyn OpenGLInformationService>> {
        Some(self)
    }
}

impl OpenGLInformationService for NullOpenGLInformationService {
    fn vendor(&self) -> &str {
        ""
    }

    fn renderer(&self) -> &str {
        ""
    }

    fn version(&self) -> &str {
        ""
    }
}

/// Fixed context description, typically read from configuration
#[derive(Debug, Clone)]
pub struct StaticOpenGLInformation {
    info: OpenGLInfoConfig,
}

impl StaticOpenGLInformation {
    /// Wrap a configured context description
    pub fn new(info: OpenGLInfoConfig) -> Self {
        Self { info }
    }
}

impl ServiceProvider for StaticOpenGLInformation {
    fn service_type(&self) -> ServiceType {
        ServiceType::OPENGL_INFORMATION
    }

    fn description(&self) -> &str {
        "Configured OpenGL information"
    }

    fn into_opengl_information(self: Arc<Self>) -> Option<Arc<dyn OpenGLInformationService>> {
        Some(self)
    }
}

impl OpenGLInformationService for StaticOpenGLInformation {
    fn vendor(&self) -> &str {
        &self.info.vendor
    }

    fn renderer(&self) -> &str {
        &self.info.renderer
    }

    fn version(&self) -> &str {
        &self.info.version
    }
}
