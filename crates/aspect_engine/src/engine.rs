//! Core engine implementation
//!
//! The aspect engine owns the service locator and the change channel, runs
//! one worker thread per registered aspect and drives frames. It never waits
//! on an aspect while publishing changes or requesting frames.

use crate::{
    application::Application,
    aspects::{Aspect, AspectWorker, WorkerChannels, WorkerEvent},
    change::{ChangeChannel, ChangeRecord, SubscriberId},
    core::config::{ApplicationConfig, ConfigError, EngineConfig},
    frontend::Scene,
    services::{EngineSystemInformation, ServiceLocator, ServiceType},
};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

struct RegisteredAspect {
    subscriber: SubscriberId,
    worker: AspectWorker,
}

/// Main engine struct
///
/// Aspects must be registered before the nodes they mirror are created:
/// a newly registered aspect only sees nodes created after it.
pub struct AspectEngine {
    config: EngineConfig,
    services: Arc<ServiceLocator>,
    system_information: Arc<EngineSystemInformation>,
    channel: Arc<ChangeChannel>,
    aspects: Vec<RegisteredAspect>,
    to_frontend: Sender<ChangeRecord>,
    from_backend: Receiver<ChangeRecord>,
    worker_events: Sender<WorkerEvent>,
    completed_frames: Receiver<WorkerEvent>,
    last_completed: HashMap<String, u64>,
    scene_created: bool,
    frame: u64,
    running: bool,
}

impl AspectEngine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        log::info!("Initializing aspect engine...");

        let services = Arc::new(ServiceLocator::new());
        let system_information = Arc::new(EngineSystemInformation::new());
        services.register(ServiceType::SYSTEM_INFORMATION, &system_information);

        let (to_frontend, from_backend) = unbounded();
        let (worker_events, completed_frames) = unbounded();

        Ok(Self {
            config,
            services,
            system_information,
            channel: Arc::new(ChangeChannel::new()),
            aspects: Vec::new(),
            to_frontend,
            from_backend,
            worker_events,
            completed_frames,
            last_completed: HashMap::new(),
            scene_created: false,
            frame: 0,
            running: true,
        })
    }

    /// Run the engine main loop with the given application
    pub fn run<T: Application>(config: ApplicationConfig, app: &mut T) -> Result<(), EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        let mut engine = Self::new(config.engine.clone())?;

        app.initialize(&mut engine, &config)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {}", e)))?;

        log::info!("Starting main loop...");
        let budget = Duration::from_millis(engine.config.frame_budget_ms);

        let result = loop {
            if !engine.running {
                break Ok(());
            }
            let frame_start = Instant::now();
            let frame = engine.process_frame();

            if let Err(e) = app.update(&mut engine, frame) {
                break Err(EngineError::ApplicationError(format!("App update: {}", e)));
            }

            if engine.config.max_frames.is_some_and(|max| frame >= max) {
                log::info!("Reached frame limit of {}", frame);
                engine.quit();
            }

            if !budget.is_zero() {
                let remaining = budget.saturating_sub(frame_start.elapsed());
                engine.wait_for_frame(frame, remaining);
                let remaining = budget.saturating_sub(frame_start.elapsed());
                if !remaining.is_zero() {
                    std::thread::sleep(remaining);
                }
            }
        };

        app.cleanup(&mut engine);
        engine.shutdown();

        log::info!("Engine shutdown complete");
        result
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Service locator shared with the aspects
    pub fn services(&self) -> &Arc<ServiceLocator> {
        &self.services
    }

    /// Change channel shared with the frontend scene
    pub fn channel(&self) -> &Arc<ChangeChannel> {
        &self.channel
    }

    /// Last frame requested
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether the run loop keeps going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Request engine shutdown at the end of the current frame
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Names of the registered aspects, in registration order
    pub fn aspect_names(&self) -> Vec<&str> {
        self.aspects.iter().map(|registered| registered.worker.name()).collect()
    }

    /// Register an aspect and start its worker thread
    pub fn register_aspect<A: Aspect + 'static>(&mut self, aspect: A) -> Result<(), EngineError> {
        self.register_boxed_aspect(Box::new(aspect))
    }

    /// Register an already boxed aspect
    pub fn register_boxed_aspect(&mut self, mut aspect: Box<dyn Aspect>) -> Result<(), EngineError> {
        let name = aspect.name().to_string();
        if self.aspects.iter().any(|registered| registered.worker.name() == name) {
            return Err(EngineError::AspectAlreadyRegistered(name));
        }

        aspect.on_register(&self.services);
        let node_types = aspect.handled_node_types();
        let (subscriber, changes) = self.channel.subscribe(name.clone(), &node_types);
        let channels = WorkerChannels {
            changes,
            to_frontend: self.to_frontend.clone(),
            events: self.worker_events.clone(),
        };
        let thread_name = format!("{}-{}", self.config.thread_name_prefix, name);

        // On failure the aspect was moved into the closure and is gone with it.
        let worker = match AspectWorker::spawn(thread_name, aspect, channels, Arc::clone(&self.services)) {
            Ok(worker) => worker,
            Err(source) => {
                self.channel.unsubscribe(subscriber);
                return Err(EngineError::WorkerSpawn { aspect: name, source });
            }
        };

        log::info!("Registered aspect '{}' mirroring {:?}", name, node_types);
        self.aspects.push(RegisteredAspect { subscriber, worker });
        self.system_information.set_worker_thread_count(self.aspects.len());
        Ok(())
    }

    /// Stop an aspect, clean up its peers and hand it back
    pub fn unregister_aspect(&mut self, name: &str) -> Result<Box<dyn Aspect>, EngineError> {
        let index = self
            .aspects
            .iter()
            .position(|registered| registered.worker.name() == name)
            .ok_or_else(|| EngineError::UnknownAspect(name.to_string()))?;
        let registered = self.aspects.remove(index);
        self.system_information.set_worker_thread_count(self.aspects.len());
        self.last_completed.remove(name);
        self.stop_aspect(registered)
    }

    fn stop_aspect(&self, registered: RegisteredAspect) -> Result<Box<dyn Aspect>, EngineError> {
        let name = registered.worker.name().to_string();
        self.channel.unsubscribe(registered.subscriber);
        let mut aspect = registered
            .worker
            .stop()
            .ok_or_else(|| EngineError::WorkerPanicked(name.clone()))?;
        aspect.on_unregister(&self.services);
        log::info!("Unregistered aspect '{}'", name);
        Ok(aspect)
    }

    /// Create the frontend scene
    ///
    /// The engine serves a single scene, which receives every record the
    /// aspects send back.
    pub fn create_scene(&mut self) -> Result<Scene, EngineError> {
        if self.scene_created {
            return Err(EngineError::SceneAlreadyCreated);
        }
        self.scene_created = true;
        Ok(Scene::new(Arc::clone(&self.channel), self.from_backend.clone()))
    }

    /// Start a new frame on every aspect; never blocks
    pub fn process_frame(&mut self) -> u64 {
        self.frame = self.system_information.advance_frame();
        for registered in &self.aspects {
            if !registered.worker.request_frame(self.frame) {
                log::warn!("Aspect '{}' worker is gone, frame {} skipped", registered.worker.name(), self.frame);
            }
        }
        log::trace!("Frame {} requested on {} aspects", self.frame, self.aspects.len());
        self.frame
    }

    /// Wait until every aspect finished `frame` or `timeout` elapsed
    ///
    /// Returns whether every aspect finished.
    pub fn wait_for_frame(&mut self, frame: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            while let Ok(WorkerEvent::FrameCompleted { aspect, frame: done }) = self.completed_frames.try_recv() {
                self.last_completed.insert(aspect, done);
            }
            let finished = self.aspects.iter().all(|registered| {
                self.last_completed
                    .get(registered.worker.name())
                    .is_some_and(|done| *done >= frame)
            });
            if finished {
                return true;
            }
            match self.completed_frames.recv_deadline(deadline) {
                Ok(WorkerEvent::FrameCompleted { aspect, frame: done }) => {
                    self.last_completed.insert(aspect, done);
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    /// Stop every aspect in reverse registration order
    pub fn shutdown(&mut self) {
        self.running = false;
        while let Some(registered) = self.aspects.pop() {
            if let Err(e) = self.stop_aspect(registered) {
                log::error!("Aspect shutdown failed: {}", e);
            }
        }
        self.system_information.set_worker_thread_count(0);
    }
}

impl Drop for AspectEngine {
    fn drop(&mut self) {
        if !self.aspects.is_empty() {
            self.shutdown();
        }
        self.services.unregister(ServiceType::SYSTEM_INFORMATION);
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An aspect with the same name is already registered
    #[error("Aspect '{0}' is already registered")]
    AspectAlreadyRegistered(String),

    /// No aspect with this name is registered
    #[error("Unknown aspect '{0}'")]
    UnknownAspect(String),

    /// Worker thread could not be started
    #[error("Failed to spawn worker for aspect '{aspect}': {source}")]
    WorkerSpawn {
        /// Aspect name
        aspect: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Worker thread panicked
    #[error("Worker for aspect '{0}' panicked")]
    WorkerPanicked(String),

    /// The engine already handed out its scene
    #[error("A scene was already created for this engine")]
    SceneAlreadyCreated,

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspects::input::{InputAspect, InputState};
    use crate::aspects::render::{NullSceneImporter, RenderAspect};

    fn engine() -> AspectEngine {
        AspectEngine::new(EngineConfig::new().with_thread_name_prefix("test")).unwrap()
    }

    #[test]
    fn test_registers_system_information() {
        let engine = engine();
        assert!(engine.services().is_registered(ServiceType::SYSTEM_INFORMATION));
        assert_eq!(engine.services().count(), 2);
        assert_eq!(engine.services().system_information().frame_count(), 0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = AspectEngine::new(EngineConfig::new().with_log_level("loud"));
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_aspect_registration() {
        let mut engine = engine();
        engine.register_aspect(RenderAspect::new(Arc::new(NullSceneImporter))).unwrap();
        engine.register_aspect(InputAspect::new(InputState::new())).unwrap();
        assert_eq!(engine.aspect_names(), vec!["render", "input"]);
        assert_eq!(engine.services().system_information().worker_thread_count(), 2);
        assert_eq!(engine.channel().subscriber_count(), 2);

        let duplicate = engine.register_aspect(RenderAspect::new(Arc::new(NullSceneImporter)));
        assert!(matches!(duplicate, Err(EngineError::AspectAlreadyRegistered(_))));

        let render = engine.unregister_aspect("render").unwrap();
        assert!(render.as_any().downcast_ref::<RenderAspect>().is_some());
        assert_eq!(engine.aspect_names(), vec!["input"]);
        assert_eq!(engine.channel().subscriber_count(), 1);
        assert!(matches!(engine.unregister_aspect("render"), Err(EngineError::UnknownAspect(_))));

        engine.shutdown();
        assert!(engine.aspect_names().is_empty());
        assert_eq!(engine.services().system_information().worker_thread_count(), 0);
    }

    #[test]
    fn test_frames_advance_system_information() {
        let mut engine = engine();
        engine.register_aspect(RenderAspect::new(Arc::new(NullSceneImporter))).unwrap();
        assert_eq!(engine.process_frame(), 1);
        assert_eq!(engine.process_frame(), 2);
        assert!(engine.wait_for_frame(2, Duration::from_secs(5)));
        assert_eq!(engine.services().system_information().frame_count(), 2);

        let aspect = engine.unregister_aspect("render").unwrap();
        let render = aspect.as_any().downcast_ref::<RenderAspect>().unwrap();
        assert_eq!(render.frames(), 2);
    }

    #[test]
    fn test_single_scene_per_engine() {
        let mut engine = engine();
        assert!(engine.create_scene().is_ok());
        assert!(matches!(engine.create_scene(), Err(EngineError::SceneAlreadyCreated)));
    }
}
