//! Render side mirror of the picking settings

use crate::backend::{BackendNode, BackendNodeBase};
use crate::change::{properties, ChangeKind, ChangeRecord, NodeData, NodeType};
use crate::core::picking::{FaceOrientation, PickMethod, PickResultMode};

/// Picking settings peer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickingSettings {
    base: BackendNodeBase,
    pick_method: PickMethod,
    pick_result_mode: PickResultMode,
    face_orientation: FaceOrientation,
}

impl PickingSettings {
    /// Hit computation method
    pub fn pick_method(&self) -> PickMethod {
        self.pick_method
    }

    /// Which hits get reported
    pub fn pick_result_mode(&self) -> PickResultMode {
        self.pick_result_mode
    }

    /// Pickable faces
    pub fn face_orientation(&self) -> FaceOrientation {
        self.face_orientation
    }
}

impl BackendNode for PickingSettings {
    const NODE_TYPE: NodeType = NodeType::PickingSettings;

    fn base(&self) -> &BackendNodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BackendNodeBase {
        &mut self.base
    }

    fn initialize_from_data(&mut self, data: &NodeData) {
        if let NodeData::PickingSettings {
            pick_method,
            pick_result_mode,
            face_orientation,
        } = data
        {
            self.pick_method = *pick_method;
            self.pick_result_mode = *pick_result_mode;
            self.face_orientation = *face_orientation;
        }
    }

    fn apply_change(&mut self, change: &ChangeRecord) {
        if change.kind() != ChangeKind::PropertyUpdated {
            return;
        }
        let Some(raw) = change.value().as_int() else {
            return;
        };
        let applied = match change.property() {
            properties::PICK_METHOD => PickMethod::try_from(raw).map(|method| self.pick_method = method).is_ok(),
            properties::PICK_RESULT_MODE => PickResultMode::try_from(raw).map(|mode| self.pick_result_mode = mode).is_ok(),
            properties::FACE_ORIENTATION_PICKING_MODE => {
                FaceOrientation::try_from(raw).map(|flags| self.face_orientation = flags).is_ok()
            }
            _ => false,
        };
        if applied {
            self.base.mark_dirty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::NodeSnapshot;
    use crate::core::node_id::NodeId;

    #[test]
    fn test_peer_property_mirroring() {
        let snapshot = NodeSnapshot {
            id: NodeId::mint(),
            parent: NodeId::NULL,
            enabled: true,
            data: NodeData::PickingSettings {
                pick_method: PickMethod::Triangle,
                pick_result_mode: PickResultMode::All,
                face_orientation: FaceOrientation::FRONT_AND_BACK_FACE,
            },
        };
        let mut settings = PickingSettings::default();
        settings.initialize_from_snapshot(&snapshot);

        assert_eq!(settings.peer_id(), snapshot.id);
        assert_eq!(settings.pick_method(), PickMethod::Triangle);
        assert_eq!(settings.pick_result_mode(), PickResultMode::All);
        assert_eq!(settings.face_orientation(), FaceOrientation::FRONT_AND_BACK_FACE);
        assert!(!settings.is_dirty());

        settings.cleanup();
        assert_eq!(settings, PickingSettings::default());
    }

    #[test]
    fn test_property_changes() {
        let id = NodeId::mint();
        let mut settings = PickingSettings::default();

        settings.scene_change_event(&ChangeRecord::property_updated(id, properties::PICK_METHOD, i32::from(PickMethod::Triangle)));
        assert_eq!(settings.pick_method(), PickMethod::Triangle);
        assert!(settings.is_dirty());
        settings.unset_dirty();

        settings.scene_change_event(&ChangeRecord::property_updated(id, properties::FACE_ORIENTATION_PICKING_MODE, 2));
        assert_eq!(settings.face_orientation(), FaceOrientation::BACK_FACE);
        assert!(settings.is_dirty());
        settings.unset_dirty();

        // Out of range values are ignored
        settings.scene_change_event(&ChangeRecord::property_updated(id, properties::PICK_RESULT_MODE, 9));
        assert_eq!(settings.pick_result_mode(), PickResultMode::Nearest);
        assert!(!settings.is_dirty());
    }
}
