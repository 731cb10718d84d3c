//! Scene viewer
//!
//! Loads the application configuration, registers the render and input
//! aspects and mirrors a small scene into them. The scene holds a loader for
//! a RON scene description, some geometry and an axis input; the viewer runs
//! frames until the loader settles or the frame limit is reached.

mod importer;

use aspect_engine::foundation::logging;
use aspect_engine::prelude::*;
use importer::RonSceneImporter;
use std::sync::Arc;

const DEFAULT_CONFIG: &str = "config.toml";
const DEFAULT_SCENE: &str = "scenes/level.ron";

/// Button code driving the thrust axis
const THRUST_BUTTON: i32 = 87;

struct SceneViewerApp {
    source: String,
    input: InputState,
    scene: Option<Scene>,
    loader: NodeId,
    keyboard: NodeId,
    thrust: NodeId,
}

impl SceneViewerApp {
    fn new(source: String) -> Self {
        Self {
            source,
            input: InputState::new(),
            scene: None,
            loader: NodeId::NULL,
            keyboard: NodeId::NULL,
            thrust: NodeId::NULL,
        }
    }

    fn build_scene(&mut self, scene: &mut Scene) -> Result<(), AppError> {
        let root = scene.create_entity("root", None)?;

        let ship = scene.create_entity("ship_hull", Some(root))?;
        let geometry = scene.create_geometry();
        let position = scene.create_attribute("vertexPosition");
        let normal = scene.create_attribute("vertexNormal");
        scene.add_attribute(geometry, position)?;
        scene.add_attribute(geometry, normal)?;
        scene.set_bounding_position_attribute(geometry, position)?;
        scene.add_component(ship, geometry)?;

        let picking = scene.create_picking_settings();
        scene.set_pick_method(picking, PickMethod::Triangle)?;
        scene.set_face_orientation(picking, FaceOrientation::FRONT_AND_BACK_FACE)?;
        scene.add_component(root, picking)?;

        self.keyboard = scene.create_input_device("keyboard");
        self.thrust = scene.create_button_axis_input();
        scene.set_buttons(self.thrust, vec![THRUST_BUTTON])?;
        scene.set_scale(self.thrust, 0.5)?;
        scene.set_source_device(self.thrust, self.keyboard)?;
        scene.add_component(ship, self.thrust)?;

        self.loader = scene.create_scene_loader(self.source.clone());
        scene.add_component(root, self.loader)?;
        scene.on_status_changed(self.loader, |loader, status| {
            log::info!("Scene loader {} is now {}", loader, status);
        })?;
        Ok(())
    }
}

impl Application for SceneViewerApp {
    fn initialize(&mut self, engine: &mut AspectEngine, config: &ApplicationConfig) -> Result<(), AppError> {
        if config.render.enabled {
            let base_dir = std::env::current_dir().map_err(|e| AppError::Custom(e.to_string()))?;
            let importer = Arc::new(RonSceneImporter::new(base_dir));
            engine.register_aspect(RenderAspect::from_config(&config.render, importer))?;
        }
        if config.input.enabled {
            engine.register_aspect(InputAspect::new(self.input.clone()))?;
        }

        let mut scene = engine.create_scene()?;
        self.build_scene(&mut scene)?;
        log::info!("Scene built with {} nodes", scene.len());
        self.scene = Some(scene);
        Ok(())
    }

    fn update(&mut self, engine: &mut AspectEngine, frame: u64) -> Result<(), AppError> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        scene.process_backend_changes();

        // Hold thrust for a while to exercise the input aspect.
        self.input.set_button(self.keyboard, THRUST_BUTTON, frame % 60 < 30);
        if let Some(value) = self.input.axis_value(self.thrust) {
            log::trace!("Frame {}: thrust {}", frame, value);
        }

        match scene.scene_loader_status(self.loader)? {
            SceneLoaderStatus::Ready | SceneLoaderStatus::Error if frame > 60 => engine.quit(),
            _ => {}
        }
        Ok(())
    }

    fn cleanup(&mut self, _engine: &mut AspectEngine) {
        if let Some(scene) = self.scene.as_mut() {
            scene.process_backend_changes();
            if let Ok(Some(root)) = scene.scene_loader_subtree(self.loader) {
                let children = scene.children(root).map_or(0, <[NodeId]>::len);
                log::info!("Loaded subtree root {} with {} direct children", root, children);
            }
            log::info!("Final scene holds {} nodes", scene.len());
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let scene_source = args.next().unwrap_or_else(|| DEFAULT_SCENE.to_string());

    let config = ApplicationConfig::load_or_default(&config_path)?;
    logging::init_with_level(&config.engine.log_level);

    log::info!("Starting scene viewer with {}", config_path);
    let mut app = SceneViewerApp::new(scene_source);

    match AspectEngine::run(config, &mut app) {
        Ok(()) => {
            log::info!("Scene viewer finished");
            Ok(())
        }
        Err(e) => {
            log::error!("Scene viewer failed: {}", e);
            Err(e.into())
        }
    }
}
