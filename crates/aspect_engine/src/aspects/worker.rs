//! Worker thread running one aspect
//!
//! The worker waits on two queues: the change records routed to its aspect
//! and the commands sent by the engine. Pending change records are always
//! drained before a frame runs and before shutdown, so a frame sees every
//! mutation published before it was requested.

use super::{Aspect, FrameContext};
use crate::change::{ChangePtr, ChangeRecord};
use crate::services::ServiceLocator;
use crossbeam::channel::{never, unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Command sent from the engine to a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Run the frame job
    Frame(u64),
    /// Clean up every peer and exit
    Shutdown,
}

/// Notification sent from a worker to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// Frame job finished
    FrameCompleted {
        /// Aspect name
        aspect: String,
        /// Frame number
        frame: u64,
    },
}

/// Everything a worker thread needs
pub struct WorkerChannels {
    /// Records routed to the aspect
    pub changes: Receiver<ChangePtr>,
    /// Records produced by the aspect for the frontend
    pub to_frontend: Sender<ChangeRecord>,
    /// Frame completion notifications
    pub events: Sender<WorkerEvent>,
}

/// Handle to a running aspect worker
pub struct AspectWorker {
    name: String,
    commands: Sender<WorkerCommand>,
    handle: Option<JoinHandle<Box<dyn Aspect>>>,
}

impl AspectWorker {
    /// Start a named thread running `aspect`
    pub fn spawn(
        thread_name: String,
        aspect: Box<dyn Aspect>,
        channels: WorkerChannels,
        services: Arc<ServiceLocator>,
    ) -> std::io::Result<Self> {
        let name = aspect.name().to_string();
        let (commands, command_rx) = unbounded();
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || run_worker(aspect, channels, command_rx, services))?;
        Ok(Self {
            name,
            commands,
            handle: Some(handle),
        })
    }

    /// Aspect name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the worker to run a frame; never blocks
    pub fn request_frame(&self, frame: u64) -> bool {
        self.commands.send(WorkerCommand::Frame(frame)).is_ok()
    }

    /// Stop the worker and get the aspect back
    ///
    /// Returns `None` if the worker thread panicked.
    pub fn stop(mut self) -> Option<Box<dyn Aspect>> {
        self.join()
    }

    fn join(&mut self) -> Option<Box<dyn Aspect>> {
        let handle = self.handle.take()?;
        let _ = self.commands.send(WorkerCommand::Shutdown);
        match handle.join() {
            Ok(aspect) => Some(aspect),
            Err(_) => {
                log::error!("Worker for aspect '{}' panicked", self.name);
                None
            }
        }
    }
}

impl Drop for AspectWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            log::debug!("Stopping worker for aspect '{}' on drop", self.name);
            self.join();
        }
    }
}

fn drain_changes(aspect: &mut dyn Aspect, changes: &Receiver<ChangePtr>) {
    while let Ok(change) = changes.try_recv() {
        aspect.process_change(&change);
    }
}

fn run_worker(
    mut aspect: Box<dyn Aspect>,
    channels: WorkerChannels,
    commands: Receiver<WorkerCommand>,
    services: Arc<ServiceLocator>,
) -> Box<dyn Aspect> {
    let WorkerChannels {
        changes,
        to_frontend,
        events,
    } = channels;
    let idle = never();
    let mut subscribed = true;
    log::debug!("Aspect '{}' worker started", aspect.name());

    loop {
        let change_queue = if subscribed { &changes } else { &idle };
        crossbeam::select! {
            recv(change_queue) -> change => match change {
                Ok(change) => aspect.process_change(&change),
                // Unsubscribed; keep serving commands until told to stop.
                Err(_) => subscribed = false,
            },
            recv(commands) -> command => {
                let Ok(WorkerCommand::Frame(frame)) = command else {
                    break;
                };
                drain_changes(aspect.as_mut(), &changes);
                let context = FrameContext {
                    frame,
                    services: &services,
                };
                for record in aspect.run_frame(&context) {
                    if to_frontend.send(record).is_err() {
                        log::debug!("Frontend gone, dropping record from '{}'", aspect.name());
                    }
                }
                let _ = events.send(WorkerEvent::FrameCompleted {
                    aspect: aspect.name().to_string(),
                    frame,
                });
            }
        }
    }

    drain_changes(aspect.as_mut(), &changes);
    aspect.shutdown();
    log::debug!("Aspect '{}' worker stopped", aspect.name());
    aspect
}
