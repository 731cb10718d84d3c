//! End-to-end scenarios across the frontend, the change channel and the
//! aspect worker threads

mod scene_loading;
