//! Service locator used by aspects to reach concrete service providers

use super::opengl_information::{NullOpenGLInformationService, OpenGLInformationService};
use super::system_information::{NullSystemInformationService, SystemInformationService};
use super::{ServiceProvider, ServiceType};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

#[derive(Default)]
struct Registry {
    providers: HashMap<ServiceType, Weak<dyn ServiceProvider>>,
    non_null_default_services: usize,
}

/// Registry mapping service keys to providers
///
/// The locator never owns a provider: it keeps a weak reference and the
/// registering code stays responsible for the provider's lifetime. A provider
/// that is dropped without being unregistered simply stops resolving.
pub struct ServiceLocator {
    registry: RwLock<Registry>,
    null_system_information: Arc<NullSystemInformationService>,
    null_opengl_information: Arc<NullOpenGLInformationService>,
}

impl ServiceLocator {
    /// Create a locator with only the built-in default services
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            null_system_information: Arc::new(NullSystemInformationService),
            null_opengl_information: Arc::new(NullOpenGLInformationService),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `provider` for `service_type`, replacing any existing one
    pub fn register<P: ServiceProvider + 'static>(&self, service_type: ServiceType, provider: &Arc<P>) {
        let weak: Weak<P> = Arc::downgrade(provider);
        let provider: Weak<dyn ServiceProvider> = weak;
        let mut registry = self.write();
        let replaced = registry.providers.insert(service_type, provider).is_some();
        if service_type.is_default() && !replaced {
            registry.non_null_default_services += 1;
        }
        log::debug!("Registered provider for {} (replaced: {})", service_type, replaced);
    }

    /// Remove the provider for `service_type`, if any
    pub fn unregister(&self, service_type: ServiceType) {
        let mut registry = self.write();
        let removed = registry.providers.remove(&service_type).is_some();
        if service_type.is_default() && removed {
            registry.non_null_default_services -= 1;
        }
        if removed {
            log::debug!("Unregistered provider for {}", service_type);
        }
    }

    /// Remove the provider for `service_type` only if it is `provider`
    ///
    /// Returns whether it was removed. A provider registered later by
    /// someone else under the same key stays in place.
    pub fn unregister_provider<P: ServiceProvider + 'static>(&self, service_type: ServiceType, provider: &Arc<P>) -> bool {
        let mut registry = self.write();
        let owned = registry
            .providers
            .get(&service_type)
            .is_some_and(|registered| registered.as_ptr().cast::<()>() == Arc::as_ptr(provider).cast::<()>());
        if !owned {
            return false;
        }
        registry.providers.remove(&service_type);
        if service_type.is_default() {
            registry.non_null_default_services -= 1;
        }
        log::debug!("Unregistered provider for {}", service_type);
        true
    }

    /// Number of services available, built-in defaults included
    pub fn count(&self) -> usize {
        let registry = self.read();
        ServiceType::DEFAULT_SERVICE_COUNT + registry.providers.len() - registry.non_null_default_services
    }

    /// Whether a provider was explicitly registered for `service_type`
    pub fn is_registered(&self, service_type: ServiceType) -> bool {
        self.read().providers.contains_key(&service_type)
    }

    fn registered(&self, service_type: ServiceType) -> Option<Arc<dyn ServiceProvider>> {
        self.read().providers.get(&service_type).and_then(Weak::upgrade)
    }

    /// Provider for `service_type`
    ///
    /// Reserved keys always resolve, to the null implementation if needed.
    /// Other keys resolve to `None` when nothing is registered.
    pub fn service(&self, service_type: ServiceType) -> Option<Arc<dyn ServiceProvider>> {
        match service_type {
            ServiceType::SYSTEM_INFORMATION => Some(self.registered(service_type).unwrap_or_else(|| {
                let null: Arc<dyn ServiceProvider> = self.null_system_information.clone();
                null
            })),
            ServiceType::OPENGL_INFORMATION => Some(self.registered(service_type).unwrap_or_else(|| {
                let null: Arc<dyn ServiceProvider> = self.null_opengl_information.clone();
                null
            })),
            _ => self.registered(service_type),
        }
    }

    /// System information provider, never absent
    pub fn system_information(&self) -> Arc<dyn SystemInformationService> {
        self.registered(ServiceType::SYSTEM_INFORMATION)
            .and_then(|provider| {
                let typed = provider.into_system_information();
                if typed.is_none() {
                    log::warn!("Provider registered as {} does not implement it", ServiceType::SYSTEM_INFORMATION);
                }
                typed
            })
            .unwrap_or_else(|| self.null_system_information.clone())
    }

    /// OpenGL information provider, never absent
    pub fn opengl_information(&self) -> Arc<dyn OpenGLInformationService> {
        self.registered(ServiceType::OPENGL_INFORMATION)
            .and_then(|provider| {
                let typed = provider.into_opengl_information();
                if typed.is_none() {
                    log::warn!("Provider registered as {} does not implement it", ServiceType::OPENGL_INFORMATION);
                }
                typed
            })
            .unwrap_or_else(|| self.null_opengl_information.clone())
    }
}

impl Default for ServiceLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.read();
        let mut keys: Vec<ServiceType> = registry.providers.keys().copied().collect();
        keys.sort();
        f.debug_struct("ServiceLocator")
            .field("registered", &keys)
            .field("non_null_default_services", &registry.non_null_default_services)
            .finish()
    }
}
