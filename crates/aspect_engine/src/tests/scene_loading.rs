//! Scene loading round trip: frontend loader, render worker, importer and
//! back to the frontend

use crate::aspects::render::{RenderAspect, SceneImporter};
use crate::core::config::EngineConfig;
use crate::core::scene_tree::SceneTree;
use crate::frontend::SceneLoaderStatus;
use crate::AspectEngine;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Importer serving a single known document
#[derive(Default)]
struct LevelImporter {
    imports: AtomicUsize,
}

impl SceneImporter for LevelImporter {
    fn import(&self, source: &str) -> Option<SceneTree> {
        self.imports.fetch_add(1, Ordering::SeqCst);
        match source {
            "level.ron" => Some(
                SceneTree::new("level")
                    .with_child(SceneTree::new("ship"))
                    .with_child(SceneTree::new("asteroid")),
            ),
            "arena.ron" => Some(SceneTree::new("arena")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    fn engine(importer: Arc<LevelImporter>) -> AspectEngine {
        crate::foundation::logging::init_for_tests();
        let mut engine = AspectEngine::new(EngineConfig::new()).unwrap();
        engine.register_aspect(RenderAspect::new(importer)).unwrap();
        engine
    }

    fn run_frame(engine: &mut AspectEngine) {
        let frame = engine.process_frame();
        assert!(engine.wait_for_frame(frame, WAIT));
    }

    #[test]
    fn test_load_then_replace_then_fail() {
        let importer = Arc::new(LevelImporter::default());
        let mut engine = engine(Arc::clone(&importer));
        let mut scene = engine.create_scene().unwrap();
        let root = scene.create_entity("root", None).unwrap();
        let loader = scene.create_scene_loader("level.ron");
        scene.add_component(root, loader).unwrap();

        let statuses = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&statuses);
        scene
            .on_status_changed(loader, move |_, status| sink.lock().unwrap().push(status))
            .unwrap();
        assert_eq!(scene.scene_loader_status(loader), Ok(SceneLoaderStatus::Loading));

        run_frame(&mut engine);
        assert_eq!(scene.process_backend_changes(), 1);
        let level = scene.scene_loader_subtree(loader).unwrap().unwrap();
        assert_eq!(scene.children(root).unwrap(), &[level]);
        assert_eq!(scene.children(level).unwrap().len(), 2);
        assert_eq!(scene.scene_loader_status(loader), Ok(SceneLoaderStatus::Ready));

        scene.set_source(loader, "arena.ron").unwrap();
        run_frame(&mut engine);
        scene.process_backend_changes();
        let arena = scene.scene_loader_subtree(loader).unwrap().unwrap();
        assert!(!scene.contains(level));
        assert!(scene.find_by_name("ship").is_none());
        assert_eq!(scene.children(root).unwrap(), &[arena]);

        scene.set_source(loader, "missing.ron").unwrap();
        run_frame(&mut engine);
        scene.process_backend_changes();
        assert!(!scene.contains(arena));
        assert!(scene.children(root).unwrap().is_empty());
        assert_eq!(scene.scene_loader_status(loader), Ok(SceneLoaderStatus::Error));

        assert_eq!(
            *statuses.lock().unwrap(),
            vec![
                SceneLoaderStatus::Ready,
                SceneLoaderStatus::Loading,
                SceneLoaderStatus::Ready,
                SceneLoaderStatus::Loading,
                SceneLoaderStatus::Error,
            ]
        );
        assert_eq!(importer.imports.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_each_source_is_imported_once() {
        let importer = Arc::new(LevelImporter::default());
        let mut engine = engine(Arc::clone(&importer));
        let mut scene = engine.create_scene().unwrap();
        let root = scene.create_entity("root", None).unwrap();
        let loader = scene.create_scene_loader("level.ron");
        scene.add_component(root, loader).unwrap();

        for _ in 0..3 {
            run_frame(&mut engine);
            scene.process_backend_changes();
        }
        assert_eq!(importer.imports.load(Ordering::SeqCst), 1);
        assert_eq!(scene.scene_loader_status(loader), Ok(SceneLoaderStatus::Ready));
    }

    #[test]
    fn test_destroying_the_owner_releases_the_loaded_subtree() {
        let importer = Arc::new(LevelImporter::default());
        let mut engine = engine(importer);
        let mut scene = engine.create_scene().unwrap();
        let root = scene.create_entity("root", None).unwrap();
        let loader = scene.create_scene_loader("level.ron");
        scene.add_component(root, loader).unwrap();

        run_frame(&mut engine);
        scene.process_backend_changes();
        let level = scene.scene_loader_subtree(loader).unwrap().unwrap();

        scene.destroy(root).unwrap();
        assert!(!scene.contains(level));
        assert!(scene.contains(loader));
        assert_eq!(scene.scene_loader_subtree(loader), Ok(None));

        run_frame(&mut engine);
        assert_eq!(scene.process_backend_changes(), 0);
        let aspect = engine.unregister_aspect("render").unwrap();
        assert_eq!(aspect.router().violation_count(), 0);
    }
}
