//! [`SourceRegistry`] – explicit dependency set of named cloud sources.
//!
//! Services never look sources up in a global table.  The caller builds a
//! registry, registers every driver it owns, and passes the registry into
//! the service constructor.

use std::collections::HashMap;
use std::sync::Arc;

use odist_types::VisionError;

use crate::source::CloudSource;

/// Name-keyed set of [`CloudSource`] drivers.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn CloudSource>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under its own [`id`][CloudSource::id].  Any
    /// previously registered source with the same id is replaced.
    pub fn register(&mut self, source: Arc<dyn CloudSource>) {
        self.sources.insert(source.id().to_string(), source);
    }

    /// Builder-style [`register`][Self::register].
    pub fn with(mut self, source: Arc<dyn CloudSource>) -> Self {
        self.register(source);
        self
    }

    /// Resolve `name` to a shared handle.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::SourceNotFound`] when nothing is registered
    /// under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn CloudSource>, VisionError> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| VisionError::SourceNotFound(name.to_string()))
    }

    /// True when a source named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True when no sources are registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&String> = self.sources.keys().collect();
        ids.sort();
        f.debug_struct("SourceRegistry").field("sources", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ScriptedCloudSource;

    #[test]
    fn register_and_resolve() {
        let registry = SourceRegistry::new().with(Arc::new(ScriptedCloudSource::new("depth", vec![])));
        assert!(registry.contains("depth"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("depth").unwrap().id(), "depth");
    }

    #[test]
    fn unknown_source_is_not_found() {
        let registry = SourceRegistry::new();
        assert!(registry.is_empty());
        match registry.get("ghost") {
            Err(VisionError::SourceNotFound(name)) => assert_eq!(name, "ghost"),
            other => panic!("unexpected result: {:?}", other.map(|s| s.id().to_string())),
        }
    }

    #[test]
    fn reregister_replaces_source() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(ScriptedCloudSource::new("depth", vec![])));
        registry.register(Arc::new(ScriptedCloudSource::new("depth", vec![])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn debug_lists_sorted_ids() {
        let registry = SourceRegistry::new()
            .with(Arc::new(ScriptedCloudSource::new("b", vec![])))
            .with(Arc::new(ScriptedCloudSource::new("a", vec![])));
        assert_eq!(format!("{registry:?}"), r#"SourceRegistry { sources: ["a", "b"] }"#);
    }
}
