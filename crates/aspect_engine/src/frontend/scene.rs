//! Frontend scene arena

use super::nodes::{FrontendNode, LoaderState, SceneLoaderStatus};
use super::SceneError;
use crate::change::{properties, ChangeChannel, ChangeKind, ChangeRecord, NodeData, NodeType, PropertyValue};
use crate::core::node_id::NodeId;
use crate::core::picking::{FaceOrientation, PickMethod, PickResultMode};
use crossbeam::channel::Receiver;
use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked when a scene loader's status changes
pub type StatusListener = Box<dyn FnMut(NodeId, SceneLoaderStatus) + Send>;

/// Frontend scene
///
/// Owns every frontend node. Setters only emit a change record when the
/// stored value actually changes.
pub struct Scene {
    pub(super) nodes: HashMap<NodeId, FrontendNode>,
    pub(super) loaders: HashMap<NodeId, LoaderState>,
    pub(super) listeners: HashMap<NodeId, Vec<StatusListener>>,
    channel: Arc<ChangeChannel>,
    from_backend: Receiver<ChangeRecord>,
}

impl Scene {
    /// Create an empty scene publishing into `channel`
    ///
    /// `from_backend` carries the records produced by aspect frame jobs.
    pub fn new(channel: Arc<ChangeChannel>, from_backend: Receiver<ChangeRecord>) -> Self {
        Self {
            nodes: HashMap::new(),
            loaders: HashMap::new(),
            listeners: HashMap::new(),
            channel,
            from_backend,
        }
    }

    pub(super) fn emit(&self, record: ChangeRecord) {
        self.channel.publish(record);
    }

    /// Node with identifier `id`
    pub fn node(&self, id: NodeId) -> Option<&FrontendNode> {
        self.nodes.get(&id)
    }

    /// Whether `id` names a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `id`
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], SceneError> {
        self.nodes
            .get(&id)
            .map(FrontendNode::children)
            .ok_or(SceneError::NodeNotFound(id))
    }

    /// First node named `name`, if any
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut matches: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| node.name == name)
            .map(FrontendNode::id)
            .collect();
        matches.sort_unstable();
        matches.first().copied()
    }

    pub(super) fn node_of_type(&self, id: NodeId, expected: NodeType) -> Result<&FrontendNode, SceneError> {
        let node = self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))?;
        if node.node_type() != expected {
            return Err(SceneError::WrongNodeType {
                node: id,
                expected,
                actual: node.node_type(),
            });
        }
        Ok(node)
    }

    fn node_mut_of_type(&mut self, id: NodeId, expected: NodeType) -> Result<&mut FrontendNode, SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        if node.node_type() != expected {
            return Err(SceneError::WrongNodeType {
                node: id,
                expected,
                actual: node.node_type(),
            });
        }
        Ok(node)
    }

    fn check_reference(&self, id: NodeId, expected: NodeType) -> Result<(), SceneError> {
        if id.is_null() {
            Ok(())
        } else {
            self.node_of_type(id, expected).map(|_| ())
        }
    }

    pub(super) fn insert(&mut self, name: impl Into<String>, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId::mint();
        if data.node_type() == NodeType::SceneLoader {
            self.loaders.insert(id, LoaderState::default());
        }
        let node = FrontendNode::new(id, name.into(), parent, data);
        let snapshot = node.snapshot();
        self.nodes.insert(id, node);

        self.emit(ChangeRecord::node_created(snapshot));
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
            self.emit(ChangeRecord::node_added(parent, properties::CHILD, id));
        }
        log::trace!("Created node {}", id);
        id
    }

    /// Create an entity, optionally as the child of another entity
    pub fn create_entity(&mut self, name: impl Into<String>, parent: Option<NodeId>) -> Result<NodeId, SceneError> {
        let parent = parent.unwrap_or(NodeId::NULL);
        self.check_reference(parent, NodeType::Entity)?;
        Ok(self.insert(name, parent, NodeData::Entity { components: Vec::new() }))
    }

    /// Create a named vertex attribute
    pub fn create_attribute(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        self.insert(name.clone(), NodeId::NULL, NodeData::Attribute { name })
    }

    /// Create a geometry without attributes
    pub fn create_geometry(&mut self) -> NodeId {
        self.insert(
            "geometry",
            NodeId::NULL,
            NodeData::Geometry {
                attributes: Vec::new(),
                bounding_position_attribute: NodeId::NULL,
            },
        )
    }

    /// Create a button axis input with no buttons and unit scale
    pub fn create_button_axis_input(&mut self) -> NodeId {
        self.insert(
            "buttonAxisInput",
            NodeId::NULL,
            NodeData::ButtonAxisInput {
                buttons: Vec::new(),
                scale: 1.0,
                source_device: NodeId::NULL,
            },
        )
    }

    /// Create an input device
    pub fn create_input_device(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        self.insert(name.clone(), NodeId::NULL, NodeData::InputDevice { name })
    }

    /// Create picking settings with default values
    pub fn create_picking_settings(&mut self) -> NodeId {
        self.insert(
            "pickingSettings",
            NodeId::NULL,
            NodeData::PickingSettings {
                pick_method: PickMethod::default(),
                pick_result_mode: PickResultMode::default(),
                face_orientation: FaceOrientation::default(),
            },
        )
    }

    fn update_property<F>(
        &mut self,
        id: NodeId,
        expected: NodeType,
        property: &'static str,
        apply: F,
    ) -> Result<bool, SceneError>
    where
        F: FnOnce(&mut NodeData) -> Option<PropertyValue>,
    {
        let node = self.node_mut_of_type(id, expected)?;
        match apply(&mut node.data) {
            Some(value) => {
                self.emit(ChangeRecord::property_updated(id, property, value));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Enable or disable any node
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        if node.enabled != enabled {
            node.enabled = enabled;
            self.emit(ChangeRecord::property_updated(id, properties::ENABLED, enabled));
        }
        Ok(())
    }

    /// Append an attribute to a geometry, unless already present
    pub fn add_attribute(&mut self, geometry: NodeId, attribute: NodeId) -> Result<(), SceneError> {
        self.node_of_type(attribute, NodeType::Attribute)?;
        let node = self.node_mut_of_type(geometry, NodeType::Geometry)?;
        if let NodeData::Geometry { attributes, .. } = &mut node.data {
            if attributes.contains(&attribute) {
                return Ok(());
            }
            attributes.push(attribute);
        }
        self.emit(ChangeRecord::node_added(geometry, properties::ATTRIBUTE, attribute));
        Ok(())
    }

    /// Remove an attribute from a geometry
    pub fn remove_attribute(&mut self, geometry: NodeId, attribute: NodeId) -> Result<(), SceneError> {
        let node = self.node_mut_of_type(geometry, NodeType::Geometry)?;
        if let NodeData::Geometry { attributes, .. } = &mut node.data {
            if !attributes.contains(&attribute) {
                return Ok(());
            }
            attributes.retain(|id| *id != attribute);
        }
        self.emit(ChangeRecord::node_removed(geometry, properties::ATTRIBUTE, attribute));
        Ok(())
    }

    /// Choose the attribute used to compute the bounding volume
    pub fn set_bounding_position_attribute(&mut self, geometry: NodeId, attribute: NodeId) -> Result<(), SceneError> {
        self.check_reference(attribute, NodeType::Attribute)?;
        self.update_property(
            geometry,
            NodeType::Geometry,
            properties::BOUNDING_POSITION_ATTRIBUTE,
            |data| match data {
                NodeData::Geometry {
                    bounding_position_attribute,
                    ..
                } if *bounding_position_attribute != attribute => {
                    *bounding_position_attribute = attribute;
                    Some(attribute.into())
                }
                _ => None,
            },
        )
        .map(|_| ())
    }

    /// Set the buttons feeding an axis input
    pub fn set_buttons(&mut self, axis: NodeId, buttons: Vec<i32>) -> Result<(), SceneError> {
        self.update_property(axis, NodeType::ButtonAxisInput, properties::BUTTONS, |data| match data {
            NodeData::ButtonAxisInput { buttons: current, .. } if *current != buttons => {
                current.clone_from(&buttons);
                Some(buttons.into())
            }
            _ => None,
        })
        .map(|_| ())
    }

    /// Set the scale of an axis input
    #[allow(clippy::float_cmp)]
    pub fn set_scale(&mut self, axis: NodeId, scale: f32) -> Result<(), SceneError> {
        self.update_property(axis, NodeType::ButtonAxisInput, properties::SCALE, |data| match data {
            NodeData::ButtonAxisInput { scale: current, .. } if *current != scale => {
                *current = scale;
                Some(scale.into())
            }
            _ => None,
        })
        .map(|_| ())
    }

    /// Set the device an axis input reads from
    pub fn set_source_device(&mut self, axis: NodeId, device: NodeId) -> Result<(), SceneError> {
        self.check_reference(device, NodeType::InputDevice)?;
        self.update_property(axis, NodeType::ButtonAxisInput, properties::SOURCE_DEVICE, |data| match data {
            NodeData::ButtonAxisInput { source_device, .. } if *source_device != device => {
                *source_device = device;
                Some(device.into())
            }
            _ => None,
        })
        .map(|_| ())
    }

    /// Set the picking method
    pub fn set_pick_method(&mut self, settings: NodeId, method: PickMethod) -> Result<(), SceneError> {
        self.update_property(settings, NodeType::PickingSettings, properties::PICK_METHOD, |data| match data {
            NodeData::PickingSettings { pick_method, .. } if *pick_method != method => {
                *pick_method = method;
                Some(i32::from(method).into())
            }
            _ => None,
        })
        .map(|_| ())
    }

    /// Set which picking hits get reported
    pub fn set_pick_result_mode(&mut self, settings: NodeId, mode: PickResultMode) -> Result<(), SceneError> {
        self.update_property(settings, NodeType::PickingSettings, properties::PICK_RESULT_MODE, |data| match data {
            NodeData::PickingSettings { pick_result_mode, .. } if *pick_result_mode != mode => {
                *pick_result_mode = mode;
                Some(i32::from(mode).into())
            }
            _ => None,
        })
        .map(|_| ())
    }

    /// Set which faces can be picked
    pub fn set_face_orientation(&mut self, settings: NodeId, faces: FaceOrientation) -> Result<(), SceneError> {
        self.update_property(
            settings,
            NodeType::PickingSettings,
            properties::FACE_ORIENTATION_PICKING_MODE,
            |data| match data {
                NodeData::PickingSettings { face_orientation, .. } if *face_orientation != faces => {
                    *face_orientation = faces;
                    Some(i32::from(faces).into())
                }
                _ => None,
            },
        )
        .map(|_| ())
    }

    /// Attach a component to an entity
    pub fn add_component(&mut self, entity: NodeId, component: NodeId) -> Result<(), SceneError> {
        let node = self.nodes.get(&component).ok_or(SceneError::NodeNotFound(component))?;
        if !node.is_component() {
            return Err(SceneError::NotAComponent(component));
        }
        if !node.is_shareable() {
            if let Some(owner) = self.entities_for_component(component).into_iter().find(|owner| *owner != entity) {
                return Err(SceneError::ComponentNotShareable { component, entity: owner });
            }
        }

        let node = self.node_mut_of_type(entity, NodeType::Entity)?;
        if let NodeData::Entity { components } = &mut node.data {
            if components.contains(&component) {
                return Ok(());
            }
            components.push(component);
        }
        self.emit(ChangeRecord::node_added(entity, properties::COMPONENT, component));
        Ok(())
    }

    /// Detach a component from an entity
    pub fn remove_component(&mut self, entity: NodeId, component: NodeId) -> Result<(), SceneError> {
        let node = self.node_mut_of_type(entity, NodeType::Entity)?;
        if let NodeData::Entity { components } = &mut node.data {
            if !components.contains(&component) {
                return Ok(());
            }
            components.retain(|id| *id != component);
        }
        self.emit(ChangeRecord::node_removed(entity, properties::COMPONENT, component));
        Ok(())
    }

    /// Entities `component` is attached to, in id order
    pub fn entities_for_component(&self, component: NodeId) -> Vec<NodeId> {
        let mut entities: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| matches!(&node.data, NodeData::Entity { components } if components.contains(&component)))
            .map(FrontendNode::id)
            .collect();
        entities.sort_unstable();
        entities
    }

    /// Destroy a node and everything below it
    ///
    /// Children go first, depth first. A scene loader destroys its loaded
    /// subtree before itself. References held by other nodes are released
    /// with the matching change records.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), SceneError> {
        if !self.nodes.contains_key(&id) {
            return Err(SceneError::NodeNotFound(id));
        }
        self.destroy_recursive(id);
        Ok(())
    }

    pub(super) fn destroy_recursive(&mut self, id: NodeId) {
        if let Some(root) = self.loaders.get_mut(&id).and_then(|loader| loader.subtree_root.take()) {
            if self.nodes.contains_key(&root) {
                self.destroy_recursive(root);
            }
        }

        let children = self.nodes.get(&id).map(|node| node.children.clone()).unwrap_or_default();
        for child in children {
            self.destroy_recursive(child);
        }

        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(&node.parent) {
            parent.children.retain(|child| *child != id);
            self.emit(ChangeRecord::node_removed(node.parent, properties::CHILD, id));
        }
        self.release_references(id);
        self.loaders.remove(&id);
        self.listeners.remove(&id);
        self.emit(ChangeRecord::node_destroyed(id));
        log::trace!("Destroyed node {}", id);
    }

    fn release_references(&mut self, id: NodeId) {
        let mut records = Vec::new();
        for node in self.nodes.values_mut() {
            match &mut node.data {
                NodeData::Entity { components } if components.contains(&id) => {
                    components.retain(|component| *component != id);
                    records.push(ChangeRecord::node_removed(node.id, properties::COMPONENT, id));
                }
                NodeData::Geometry {
                    attributes,
                    bounding_position_attribute,
                } => {
                    if attributes.contains(&id) {
                        attributes.retain(|attribute| *attribute != id);
                        records.push(ChangeRecord::node_removed(node.id, properties::ATTRIBUTE, id));
                    }
                    if *bounding_position_attribute == id {
                        *bounding_position_attribute = NodeId::NULL;
                        records.push(ChangeRecord::property_updated(
                            node.id,
                            properties::BOUNDING_POSITION_ATTRIBUTE,
                            NodeId::NULL,
                        ));
                    }
                }
                NodeData::ButtonAxisInput { source_device, .. } if *source_device == id => {
                    *source_device = NodeId::NULL;
                    records.push(ChangeRecord::property_updated(node.id, properties::SOURCE_DEVICE, NodeId::NULL));
                }
                _ => {}
            }
        }
        for loader in self.loaders.values_mut() {
            if loader.subtree_root == Some(id) {
                loader.subtree_root = None;
            }
        }
        for record in records {
            self.emit(record);
        }
    }

    /// Apply every record the backend sent since the last call
    ///
    /// Never blocks. Returns the number of records processed.
    pub fn process_backend_changes(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(record) = self.from_backend.try_recv() {
            self.scene_change_event(&record);
            processed += 1;
        }
        processed
    }

    fn scene_change_event(&mut self, record: &ChangeRecord) {
        let subject = record.subject();
        let Some(node) = self.nodes.get(&subject) else {
            log::trace!("Backend {:?} for destroyed node {}", record.kind(), subject);
            return;
        };
        if node.node_type() == NodeType::SceneLoader
            && record.kind() == ChangeKind::PropertyUpdated
            && record.property() == properties::SCENE
        {
            if let Some(loaded) = record.value().as_scene() {
                self.receive_loaded_scene(subject, loaded);
            }
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.nodes.len())
            .field("scene_loaders", &self.loaders.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangePtr;
    use crossbeam::channel::unbounded;

    const ALL_TYPES: [NodeType; 7] = [
        NodeType::Entity,
        NodeType::Attribute,
        NodeType::Geometry,
        NodeType::ButtonAxisInput,
        NodeType::InputDevice,
        NodeType::PickingSettings,
        NodeType::SceneLoader,
    ];

    fn scene() -> (Scene, Receiver<ChangePtr>) {
        let channel = Arc::new(ChangeChannel::new());
        let (_, records) = channel.subscribe("observer", &ALL_TYPES);
        let (_, from_backend) = unbounded();
        (Scene::new(channel, from_backend), records)
    }

    fn drain(records: &Receiver<ChangePtr>) -> Vec<ChangePtr> {
        records.try_iter().collect()
    }

    #[test]
    fn test_creation_publishes_snapshot() {
        let (mut scene, records) = scene();
        let root = scene.create_entity("root", None).unwrap();
        let child = scene.create_entity("child", Some(root)).unwrap();

        let published = drain(&records);
        let kinds: Vec<_> = published.iter().map(|record| (record.subject(), record.kind())).collect();
        assert_eq!(
            kinds,
            vec![
                (root, ChangeKind::NodeCreated),
                (child, ChangeKind::NodeCreated),
                (root, ChangeKind::NodeAdded),
            ]
        );
        assert_eq!(published[1].snapshot().unwrap().parent, root);
        assert_eq!(scene.children(root).unwrap(), &[child]);
        assert_eq!(scene.find_by_name("child"), Some(child));
    }

    #[test]
    fn test_setters_only_emit_on_change() {
        let (mut scene, records) = scene();
        let axis = scene.create_button_axis_input();
        drain(&records);

        scene.set_scale(axis, 1.0).unwrap();
        scene.set_buttons(axis, Vec::new()).unwrap();
        scene.set_enabled(axis, true).unwrap();
        assert!(drain(&records).is_empty());

        scene.set_scale(axis, 0.5).unwrap();
        scene.set_scale(axis, 0.5).unwrap();
        scene.set_buttons(axis, vec![64]).unwrap();
        scene.set_enabled(axis, false).unwrap();
        let published = drain(&records);
        let names: Vec<_> = published.iter().map(|record| record.property()).collect();
        assert_eq!(names, vec![properties::SCALE, properties::BUTTONS, properties::ENABLED]);
        assert_eq!(published[1].value().as_int_list(), Some(&[64][..]));
    }

    #[test]
    fn test_setters_check_node_types() {
        let (mut scene, _records) = scene();
        let geometry = scene.create_geometry();
        let entity = scene.create_entity("e", None).unwrap();

        assert_eq!(
            scene.set_scale(geometry, 2.0),
            Err(SceneError::WrongNodeType {
                node: geometry,
                expected: NodeType::ButtonAxisInput,
                actual: NodeType::Geometry,
            })
        );
        assert!(scene.add_attribute(geometry, entity).is_err());
        let missing = NodeId::mint();
        assert_eq!(scene.set_enabled(missing, false), Err(SceneError::NodeNotFound(missing)));
        assert_eq!(scene.add_component(entity, entity), Err(SceneError::NotAComponent(entity)));
    }

    #[test]
    fn test_geometry_attribute_records() {
        let (mut scene, records) = scene();
        let geometry = scene.create_geometry();
        let position = scene.create_attribute("position");
        drain(&records);

        scene.add_attribute(geometry, position).unwrap();
        scene.add_attribute(geometry, position).unwrap();
        scene.set_bounding_position_attribute(geometry, position).unwrap();
        scene.remove_attribute(geometry, position).unwrap();
        scene.remove_attribute(geometry, position).unwrap();

        let kinds: Vec<_> = drain(&records).iter().map(|record| record.kind()).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::NodeAdded, ChangeKind::PropertyUpdated, ChangeKind::NodeRemoved]
        );
    }

    #[test]
    fn test_scene_loader_cannot_be_shared() {
        let (mut scene, _records) = scene();
        let a = scene.create_entity("a", None).unwrap();
        let b = scene.create_entity("b", None).unwrap();
        let loader = scene.create_scene_loader("level.ron");
        let geometry = scene.create_geometry();

        scene.add_component(a, loader).unwrap();
        scene.add_component(a, loader).unwrap();
        assert_eq!(
            scene.add_component(b, loader),
            Err(SceneError::ComponentNotShareable { component: loader, entity: a })
        );

        scene.add_component(a, geometry).unwrap();
        scene.add_component(b, geometry).unwrap();
        let mut owners = vec![a, b];
        owners.sort_unstable();
        assert_eq!(scene.entities_for_component(geometry), owners);
    }

    #[test]
    fn test_destroy_releases_references() {
        let (mut scene, records) = scene();
        let entity = scene.create_entity("e", None).unwrap();
        let child = scene.create_entity("child", Some(entity)).unwrap();
        let geometry = scene.create_geometry();
        let position = scene.create_attribute("position");
        let keyboard = scene.create_input_device("keyboard");
        let axis = scene.create_button_axis_input();
        scene.add_attribute(geometry, position).unwrap();
        scene.set_bounding_position_attribute(geometry, position).unwrap();
        scene.set_source_device(axis, keyboard).unwrap();
        scene.add_component(entity, geometry).unwrap();
        drain(&records);

        scene.destroy(position).unwrap();
        scene.destroy(keyboard).unwrap();
        scene.destroy(geometry).unwrap();
        match scene.node(scene.find_by_name("buttonAxisInput").unwrap()).unwrap().data() {
            NodeData::ButtonAxisInput { source_device, .. } => assert!(source_device.is_null()),
            other => panic!("unexpected data {other:?}"),
        }
        assert!(scene.entities_for_component(geometry).is_empty());

        let published = drain(&records);
        let destroyed: Vec<_> = published
            .iter()
            .filter(|record| record.kind() == ChangeKind::NodeDestroyed)
            .map(|record| record.subject())
            .collect();
        assert_eq!(destroyed, vec![position, keyboard, geometry]);
        assert!(published
            .iter()
            .any(|record| record.subject() == entity && record.kind() == ChangeKind::NodeRemoved));

        scene.destroy(entity).unwrap();
        assert!(!scene.contains(child));
        assert!(!scene.contains(entity));
        assert_eq!(scene.destroy(entity), Err(SceneError::NodeNotFound(entity)));
    }

    #[test]
    fn test_no_records_for_a_node_after_its_destruction() {
        let (mut scene, records) = scene();
        let parent = scene.create_entity("parent", None).unwrap();
        let child = scene.create_entity("child", Some(parent)).unwrap();
        drain(&records);

        scene.destroy(parent).unwrap();
        let published = drain(&records);
        for id in [parent, child] {
            let last = published.iter().rposition(|record| record.subject() == id).unwrap();
            assert_eq!(published[last].kind(), ChangeKind::NodeDestroyed);
        }
        let child_gone = published.iter().position(|record| record.subject() == child).unwrap();
        let parent_gone = published
            .iter()
            .position(|record| record.subject() == parent && record.kind() == ChangeKind::NodeDestroyed)
            .unwrap();
        assert!(child_gone < parent_gone);
    }
}
