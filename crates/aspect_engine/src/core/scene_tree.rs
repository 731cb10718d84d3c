//! Plain description of an entity subtree produced by a scene importer
//!
//! The importer runs on a backend thread, so it never builds frontend nodes
//! directly. It hands back this value and the frontend materializes it into
//! real entities when the scene loader grafts it in.

use serde::{Deserialize, Serialize};

/// One entity of an imported subtree and its children
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneTree {
    /// Entity name as found in the source document
    pub name: String,
    /// Child entities
    #[serde(default)]
    pub children: Vec<SceneTree>,
}

impl SceneTree {
    /// Create a leaf entity
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Add a child (builder pattern)
    pub fn with_child(mut self, child: SceneTree) -> Self {
        self.children.push(child);
        self
    }

    /// Number of entities in this subtree, root included
    pub fn entity_count(&self) -> usize {
        1 + self.children.iter().map(SceneTree::entity_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_count_includes_root() {
        let tree = SceneTree::new("root")
            .with_child(SceneTree::new("a").with_child(SceneTree::new("a1")))
            .with_child(SceneTree::new("b"));
        assert_eq!(tree.entity_count(), 4);
        assert_eq!(SceneTree::new("leaf").entity_count(), 1);
    }
}
