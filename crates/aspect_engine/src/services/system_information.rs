//! System information service

use super::{ServiceProvider, ServiceType};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Information about the running engine
pub trait SystemInformationService: ServiceProvider {
    /// Frames processed so far
    fn frame_count(&self) -> u64;

    /// Number of aspect worker threads
    fn worker_thread_count(&self) -> usize;
}

/// Default provider reporting zeros
#[derive(Debug, Default)]
pub struct NullSystemInformationService;

impl ServiceProvider for NullSystemInformationService {
    fn service_type(&self) -> ServiceType {
        ServiceType::SYSTEM_INFORMATION
    }

    fn description(&self) -> &str {
        "Null system information service"
    }

    fn into_system_information(self: Arc<Self>) -> Option<Arc<dyn SystemInformationService>> {
        Some(self)
    }
}

impl SystemInformationService for NullSystemInformationService {
    fn frame_count(&self) -> u64 {
        0
    }

    fn worker_thread_count(&self) -> usize {
        0
    }
}

/// Provider registered by the aspect engine
///
/// Counters are updated by the engine on the controlling thread and read by
/// aspects on their workers.
#[derive(Debug, Default)]
pub struct EngineSystemInformation {
    frames: AtomicU64,
    workers: AtomicUsize,
}

impl EngineSystemInformation {
    /// Create a provider with zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a new frame started, returning its number
    pub fn advance_frame(&self) -> u64 {
        self.frames.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Update the worker thread count
    pub fn set_worker_thread_count(&self, count: usize) {
        self.workers.store(count, Ordering::Release);
    }
}

impl ServiceProvider for EngineSystemInformation {
    fn service_type(&self) -> ServiceType {
        ServiceType::SYSTEM_INFORMATION
    }

    fn description(&self) -> &str {
        "Aspect engine system information"
    }

    fn into_system_information(self: Arc<Self>) -> Option<Arc<dyn SystemInformationService>> {
        Some(self)
    }
}

impl SystemInformationService for EngineSystemInformation {
    fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    fn worker_thread_count(&self) -> usize {
        self.workers.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_counters() {
        let info = EngineSystemInformation::new();
        assert_eq!(info.frame_count(), 0);
        assert_eq!(info.advance_frame(), 1);
        assert_eq!(info.advance_frame(), 2);
        info.set_worker_thread_count(3);
        assert_eq!(info.frame_count(), 2);
        assert_eq!(info.worker_thread_count(), 3);
    }
}
