//! Input side mirror of a button driven axis input

use crate::backend::{BackendNode, BackendNodeBase};
use crate::change::{properties, ChangeKind, ChangeRecord, NodeData, NodeType};
use crate::core::node_id::NodeId;

/// Axis input peer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonAxisInput {
    base: BackendNodeBase,
    buttons: Vec<i32>,
    scale: f32,
    source_device: NodeId,
}

impl ButtonAxisInput {
    /// Buttons feeding the axis
    pub fn buttons(&self) -> &[i32] {
        &self.buttons
    }

    /// Scale applied to the axis value
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Device the buttons are read from
    pub fn source_device(&self) -> NodeId {
        self.source_device
    }

    /// Axis contribution given the buttons currently held on the source device
    pub fn axis_value(&self, pressed: &[i32]) -> f32 {
        if self.is_enabled() && self.buttons.iter().any(|button| pressed.contains(button)) {
            self.scale
        } else {
            0.0
        }
    }
}

impl BackendNode for ButtonAxisInput {
    const NODE_TYPE: NodeType = NodeType::ButtonAxisInput;

    fn base(&self) -> &BackendNodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BackendNodeBase {
        &mut self.base
    }

    fn initialize_from_data(&mut self, data: &NodeData) {
        if let NodeData::ButtonAxisInput {
            buttons,
            scale,
            source_device,
        } = data
        {
            self.buttons.clone_from(buttons);
            self.scale = *scale;
            self.source_device = *source_device;
        }
    }

    fn apply_change(&mut self, change: &ChangeRecord) {
        if change.kind() != ChangeKind::PropertyUpdated {
            return;
        }
        let value = change.value();
        let applied = match change.property() {
            properties::BUTTONS => value.as_int_list().map(|buttons| self.buttons = buttons.to_vec()).is_some(),
            properties::SCALE => value.as_float().map(|scale| self.scale = scale).is_some(),
            properties::SOURCE_DEVICE => value.as_node().map(|device| self.source_device = device).is_some(),
            _ => false,
        };
        if applied {
            self.base.mark_dirty();
        }
    }
}
