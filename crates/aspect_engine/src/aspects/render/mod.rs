//! Render aspect
//!
//! Mirrors geometry, picking settings and scene loaders. The per-frame job
//! assembles the render list from dirty geometry, picks up new picking
//! settings and resolves pending scene loads through the configured
//! [`SceneImporter`]. No GPU work happens here.

pub mod geometry;
pub mod picking_settings;
pub mod scene_loader;

pub use geometry::Geometry;
pub use picking_settings::PickingSettings;
pub use scene_loader::{NullSceneImporter, SceneImporter, SceneLoader};

use super::{Aspect, FrameContext};
use crate::backend::{BackendNode, PeerRouter};
use crate::change::ChangeRecord;
use crate::core::config::RenderAspectConfig;
use crate::core::node_id::NodeId;
use crate::core::picking::{FaceOrientation, PickMethod, PickResultMode};
use crate::services::{ServiceLocator, ServiceType, StaticOpenGLInformation};
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

/// Picking parameters used to resolve hits on the next pick request
///
/// Taken from the enabled picking settings node with the lowest id, or the
/// defaults when there is none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickingConfiguration {
    /// Hit computation method
    pub method: PickMethod,
    /// Which hits get reported
    pub result_mode: PickResultMode,
    /// Pickable faces
    pub faces: FaceOrientation,
}

/// Render aspect
pub struct RenderAspect {
    router: PeerRouter,
    importer: Arc<dyn SceneImporter>,
    opengl: Option<Arc<StaticOpenGLInformation>>,
    render_list: Vec<NodeId>,
    render_list_rebuilds: u64,
    known_geometries: HashSet<NodeId>,
    picking: PickingConfiguration,
    known_picking_settings: HashSet<NodeId>,
    frames: u64,
    last_frame: u64,
}

impl RenderAspect {
    /// Create a render aspect resolving scenes with `importer`
    pub fn new(importer: Arc<dyn SceneImporter>) -> Self {
        Self {
            router: PeerRouter::new()
                .with_manager::<Geometry>()
                .with_manager::<PickingSettings>()
                .with_manager::<SceneLoader>(),
            importer,
            opengl: None,
            render_list: Vec::new(),
            render_list_rebuilds: 0,
            known_geometries: HashSet::new(),
            picking: PickingConfiguration::default(),
            known_picking_settings: HashSet::new(),
            frames: 0,
            last_frame: 0,
        }
    }

    /// Create a render aspect from configuration
    pub fn from_config(config: &RenderAspectConfig, importer: Arc<dyn SceneImporter>) -> Self {
        let mut aspect = Self::new(importer);
        aspect.opengl = config.opengl.clone().map(|info| Arc::new(StaticOpenGLInformation::new(info)));
        aspect
    }

    /// Geometry currently submitted for drawing, in id order
    pub fn render_list(&self) -> &[NodeId] {
        &self.render_list
    }

    /// How many times the render list was rebuilt
    pub fn render_list_rebuilds(&self) -> u64 {
        self.render_list_rebuilds
    }

    /// Picking parameters in effect
    pub fn picking(&self) -> PickingConfiguration {
        self.picking
    }

    /// Frames run by this aspect
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frame number reported by the system information service on the last frame
    pub fn last_frame(&self) -> u64 {
        self.last_frame
    }

    fn update_render_list(&mut self) {
        let Some(geometries) = self.router.manager_mut::<Geometry>() else {
            return;
        };
        let dirty = geometries.dirty_ids();
        let live: HashSet<NodeId> = geometries.iter().map(BackendNode::peer_id).collect();
        if dirty.is_empty() && live == self.known_geometries {
            return;
        }
        for id in &dirty {
            if let Some(geometry) = geometries.get_mut(*id) {
                geometry.unset_dirty();
            }
        }
        let mut render_list: Vec<NodeId> = geometries
            .iter()
            .filter(|geometry| geometry.is_enabled() && !geometry.attributes().is_empty())
            .map(BackendNode::peer_id)
            .collect();
        render_list.sort_unstable();

        self.known_geometries = live;
        self.render_list = render_list;
        self.render_list_rebuilds += 1;
        log::trace!(
            "Render list rebuilt with {} of {} geometries",
            self.render_list.len(),
            self.known_geometries.len()
        );
    }

    fn update_picking(&mut self) {
        let Some(settings) = self.router.manager_mut::<PickingSettings>() else {
            return;
        };
        let dirty = settings.dirty_ids();
        let live: HashSet<NodeId> = settings.iter().map(BackendNode::peer_id).collect();
        if dirty.is_empty() && live == self.known_picking_settings {
            return;
        }
        for id in &dirty {
            if let Some(node) = settings.get_mut(*id) {
                node.unset_dirty();
            }
        }
        let picking = settings
            .iter()
            .filter(|node| node.is_enabled())
            .min_by_key(|node| node.peer_id())
            .map(|node| PickingConfiguration {
                method: node.pick_method(),
                result_mode: node.pick_result_mode(),
                faces: node.face_orientation(),
            })
            .unwrap_or_default();

        self.known_picking_settings = live;
        if picking != self.picking {
            log::debug!("Picking now {:?}", picking);
            self.picking = picking;
        }
    }

    fn load_scenes(&mut self) -> Vec<ChangeRecord> {
        let importer = Arc::clone(&self.importer);
        let Some(loaders) = self.router.manager_mut::<SceneLoader>() else {
            return Vec::new();
        };
        loaders
            .iter_mut()
            .filter(|loader| loader.is_load_pending())
            .map(|loader| loader.load(importer.as_ref()))
            .collect()
    }
}

impl Aspect for RenderAspect {
    fn name(&self) -> &str {
        "render"
    }

    fn router(&self) -> &PeerRouter {
        &self.router
    }

    fn router_mut(&mut self) -> &mut PeerRouter {
        &mut self.router
    }

    fn on_register(&mut self, services: &ServiceLocator) {
        if let Some(opengl) = &self.opengl {
            services.register(ServiceType::OPENGL_INFORMATION, opengl);
        }
    }

    fn on_unregister(&mut self, services: &ServiceLocator) {
        if let Some(opengl) = &self.opengl {
            services.unregister_provider(ServiceType::OPENGL_INFORMATION, opengl);
        }
    }

    fn run_frame(&mut self, context: &FrameContext<'_>) -> Vec<ChangeRecord> {
        self.frames += 1;
        self.last_frame = context.services.system_information().frame_count();
        if self.frames == 1 {
            let gl = context.services.opengl_information();
            log::info!("Render aspect running on '{}' '{}' ({})", gl.vendor(), gl.renderer(), gl.version());
        }

        self.update_render_list();
        self.update_picking();
        self.load_scenes()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{properties, LoadedScene, NodeData, NodeSnapshot, PropertyValue};
    use crate::core::config::OpenGLInfoConfig;
    use crate::core::scene_tree::SceneTree;

    struct OneLevel;

    impl SceneImporter for OneLevel {
        fn import(&self, source: &str) -> Option<SceneTree> {
            (source == "level.ron").then(|| SceneTree::new("level"))
        }
    }

    fn created(data: NodeData) -> (NodeId, ChangeRecord) {
        let id = NodeId::mint();
        let record = ChangeRecord::node_created(NodeSnapshot {
            id,
            parent: NodeId::NULL,
            enabled: true,
            data,
        });
        (id, record)
    }

    fn frame<'a>(services: &'a ServiceLocator) -> FrameContext<'a> {
        FrameContext { frame: 1, services }
    }

    #[test]
    fn test_render_list_tracks_geometry() {
        let services = ServiceLocator::new();
        let mut aspect = RenderAspect::new(Arc::new(NullSceneImporter));
        let (geometry, record) = created(NodeData::Geometry {
            attributes: Vec::new(),
            bounding_position_attribute: NodeId::NULL,
        });
        aspect.process_change(&record);
        aspect.run_frame(&frame(&services));
        assert!(aspect.render_list().is_empty());
        let rebuilds = aspect.render_list_rebuilds();

        aspect.process_change(&ChangeRecord::node_added(geometry, properties::ATTRIBUTE, NodeId::mint()));
        aspect.run_frame(&frame(&services));
        assert_eq!(aspect.render_list(), &[geometry]);
        assert_eq!(aspect.render_list_rebuilds(), rebuilds + 1);

        aspect.run_frame(&frame(&services));
        assert_eq!(aspect.render_list_rebuilds(), rebuilds + 1);

        aspect.process_change(&ChangeRecord::node_destroyed(geometry));
        aspect.run_frame(&frame(&services));
        assert!(aspect.render_list().is_empty());
    }

    #[test]
    fn test_bounding_attribute_does_not_rebuild_render_list() {
        let services = ServiceLocator::new();
        let mut aspect = RenderAspect::new(Arc::new(NullSceneImporter));
        let (geometry, record) = created(NodeData::Geometry {
            attributes: vec![NodeId::mint()],
            bounding_position_attribute: NodeId::NULL,
        });
        aspect.process_change(&record);
        aspect.run_frame(&frame(&services));
        let rebuilds = aspect.render_list_rebuilds();

        aspect.process_change(&ChangeRecord::property_updated(
            geometry,
            properties::BOUNDING_POSITION_ATTRIBUTE,
            NodeId::mint(),
        ));
        aspect.run_frame(&frame(&services));
        assert_eq!(aspect.render_list_rebuilds(), rebuilds);
    }

    #[test]
    fn test_pending_loads_are_reported() {
        let services = ServiceLocator::new();
        let mut aspect = RenderAspect::new(Arc::new(OneLevel));
        let (loader, record) = created(NodeData::SceneLoader { source: "level.ron".into() });
        aspect.process_change(&record);

        let records = aspect.run_frame(&frame(&services));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject(), loader);
        assert_eq!(records[0].property(), properties::SCENE);
        assert!(records[0].value().as_scene().is_some_and(|loaded| loaded.tree.is_some()));
        assert!(aspect.run_frame(&frame(&services)).is_empty());

        aspect.process_change(&ChangeRecord::property_updated(loader, properties::SOURCE, "missing.ron"));
        let records = aspect.run_frame(&frame(&services));
        assert_eq!(records[0].value(), &PropertyValue::Scene(LoadedScene::new("missing.ron", None)));
    }

    #[test]
    fn test_publishes_configured_opengl_information() {
        let services = ServiceLocator::new();
        let config = RenderAspectConfig::new().with_opengl(OpenGLInfoConfig {
            vendor: "Mesa".into(),
            renderer: "llvmpipe".into(),
            version: "4.5".into(),
        });
        let mut aspect = RenderAspect::from_config(&config, Arc::new(NullSceneImporter));

        aspect.on_register(&services);
        assert_eq!(services.opengl_information().renderer(), "llvmpipe");
        assert_eq!(services.count(), 2);

        aspect.on_unregister(&services);
        assert_eq!(services.opengl_information().renderer(), "");
        assert!(!services.is_registered(ServiceType::OPENGL_INFORMATION));
    }

    #[test]
    fn test_picking_follows_enabled_settings() {
        let services = ServiceLocator::new();
        let mut aspect = RenderAspect::new(Arc::new(NullSceneImporter));
        let (settings, record) = created(NodeData::PickingSettings {
            pick_method: PickMethod::Triangle,
            pick_result_mode: PickResultMode::All,
            face_orientation: FaceOrientation::BACK_FACE,
        });
        aspect.process_change(&record);
        aspect.run_frame(&frame(&services));
        assert_eq!(
            aspect.picking(),
            PickingConfiguration {
                method: PickMethod::Triangle,
                result_mode: PickResultMode::All,
                faces: FaceOrientation::BACK_FACE,
            }
        );

        aspect.process_change(&ChangeRecord::property_updated(
            settings,
            properties::PICK_METHOD,
            i32::from(PickMethod::BoundingVolume),
        ));
        aspect.run_frame(&frame(&services));
        assert_eq!(aspect.picking().method, PickMethod::BoundingVolume);

        aspect.process_change(&ChangeRecord::property_updated(settings, properties::ENABLED, false));
        aspect.run_frame(&frame(&services));
        assert_eq!(aspect.picking(), PickingConfiguration::default());

        aspect.process_change(&ChangeRecord::node_destroyed(settings));
        aspect.run_frame(&frame(&services));
        assert_eq!(aspect.picking(), PickingConfiguration::default());
    }

    #[test]
    fn test_unregister_keeps_foreign_opengl_information() {
        let services = ServiceLocator::new();
        let config = RenderAspectConfig::new().with_opengl(OpenGLInfoConfig {
            vendor: "Mesa".into(),
            renderer: "llvmpipe".into(),
            version: "4.5".into(),
        });
        let mut aspect = RenderAspect::from_config(&config, Arc::new(NullSceneImporter));
        aspect.on_register(&services);

        let replacement = Arc::new(StaticOpenGLInformation::new(OpenGLInfoConfig {
            vendor: "NVIDIA".into(),
            renderer: "RTX".into(),
            version: "4.6".into(),
        }));
        services.register(ServiceType::OPENGL_INFORMATION, &replacement);

        aspect.on_unregister(&services);
        assert!(services.is_registered(ServiceType::OPENGL_INFORMATION));
        assert_eq!(services.opengl_information().vendor(), "NVIDIA");
    }
}
