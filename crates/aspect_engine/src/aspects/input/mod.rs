//! Input aspect
//!
//! Mirrors button axis inputs and evaluates them once per frame against the
//! button state fed in by the windowing layer through [`InputState`].

pub mod button_axis_input;

pub use button_axis_input::ButtonAxisInput;

use super::{Aspect, FrameContext};
use crate::backend::{BackendNode, PeerRouter};
use crate::change::ChangeRecord;
use crate::core::node_id::NodeId;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

/// Input state shared between the windowing layer and the input aspect
///
/// The windowing layer records button presses; the aspect publishes the axis
/// values it computes each frame. Cloning yields another handle to the same
/// state.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: Arc<RwLock<HashMap<NodeId, HashSet<i32>>>>,
    axes: Arc<RwLock<HashMap<NodeId, f32>>>,
}

impl InputState {
    /// Create an empty state table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a button press or release
    pub fn set_button(&self, device: NodeId, button: i32, pressed: bool) {
        let mut held = self.held.write().unwrap_or_else(PoisonError::into_inner);
        let buttons = held.entry(device).or_default();
        if pressed {
            buttons.insert(button);
        } else {
            buttons.remove(&button);
        }
    }

    /// Buttons held on `device`
    pub fn pressed(&self, device: NodeId) -> Vec<i32> {
        self.held
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&device)
            .map(|buttons| buttons.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Value of an axis input as of the last input frame
    pub fn axis_value(&self, axis: NodeId) -> Option<f32> {
        self.axes.read().unwrap_or_else(PoisonError::into_inner).get(&axis).copied()
    }

    fn publish_axes(&self, values: HashMap<NodeId, f32>) {
        *self.axes.write().unwrap_or_else(PoisonError::into_inner) = values;
    }
}

/// Input aspect
pub struct InputAspect {
    router: PeerRouter,
    state: InputState,
    bindings: HashMap<NodeId, Vec<NodeId>>,
}

impl InputAspect {
    /// Create an input aspect reading and publishing through `state`
    pub fn new(state: InputState) -> Self {
        Self {
            router: PeerRouter::new().with_manager::<ButtonAxisInput>(),
            state,
            bindings: HashMap::new(),
        }
    }

    /// Axis inputs bound to each source device
    pub fn bindings(&self) -> &HashMap<NodeId, Vec<NodeId>> {
        &self.bindings
    }

    /// Value computed for an axis input on the last frame
    pub fn axis_value(&self, axis: NodeId) -> Option<f32> {
        self.state.axis_value(axis)
    }

    fn rebuild_bindings(&mut self) {
        let Some(inputs) = self.router.manager_mut::<ButtonAxisInput>() else {
            return;
        };
        let live: HashSet<NodeId> = inputs.iter().map(BackendNode::peer_id).collect();
        let bound: HashSet<NodeId> = self.bindings.values().flatten().copied().collect();
        if inputs.dirty_ids().is_empty() && live == bound {
            return;
        }

        let mut bindings: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for input in inputs.iter_mut() {
            input.unset_dirty();
            bindings.entry(input.source_device()).or_default().push(input.peer_id());
        }
        for axes in bindings.values_mut() {
            axes.sort_unstable();
        }
        log::debug!("Input bindings rebuilt for {} devices", bindings.len());
        self.bindings = bindings;
    }
}

impl Aspect for InputAspect {
    fn name(&self) -> &str {
        "input"
    }

    fn router(&self) -> &PeerRouter {
        &self.router
    }

    fn router_mut(&mut self) -> &mut PeerRouter {
        &mut self.router
    }

    fn run_frame(&mut self, _context: &FrameContext<'_>) -> Vec<ChangeRecord> {
        self.rebuild_bindings();

        let Some(inputs) = self.router.manager::<ButtonAxisInput>() else {
            return Vec::new();
        };
        let mut values = HashMap::new();
        for (device, axes) in &self.bindings {
            let pressed = self.state.pressed(*device);
            for axis in axes {
                if let Some(input) = inputs.get(*axis) {
                    values.insert(*axis, input.axis_value(&pressed));
                }
            }
        }
        self.state.publish_axes(values);
        Vec::new()
    }

    fn shutdown(&mut self) {
        self.router.shutdown();
        self.bindings.clear();
        self.state.publish_axes(HashMap::new());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
