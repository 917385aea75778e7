//! Name → tool lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::batch::BatchOrchestrator;
use crate::config::BatchConfig;
use crate::ops::{OperationKind, OperationRegistry};
use crate::tools::builtin::{BatchOperationsTool, SlidesOperationTool};
use crate::tools::tool::{Tool, ToolSchema};

/// Registry of callable tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!("Replaced already registered tool: {}", name);
        } else {
            tracing::debug!("Registered tool: {}", name);
        }
    }

    /// One tool per operation kind plus `batch_operations`.
    pub fn register_slides_tools(&mut self, operations: Arc<OperationRegistry>, batch: &BatchConfig) {
        for kind in OperationKind::ALL {
            self.register(Arc::new(SlidesOperationTool::new(kind, operations.clone())));
        }
        let orchestrator = BatchOrchestrator::new(operations).with_config(batch);
        self.register(Arc::new(BatchOperationsTool::new(Arc::new(orchestrator))));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.names()
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.schema())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::OperationServices;
    use crate::slides::fake::{FakeDocuments, FakeTranslator};

    #[test]
    fn test_slides_tools_cover_every_kind() {
        let operations = Arc::new(OperationRegistry::new(OperationServices {
            documents: Arc::new(FakeDocuments::with_slides(&[])),
            translator: Arc::new(FakeTranslator::default()),
        }));
        let mut registry = ToolRegistry::new();
        registry.register_slides_tools(operations, &BatchConfig::default());

        assert_eq!(registry.len(), OperationKind::ALL.len() + 1);
        assert!(registry.get("batch_operations").is_some());
        assert!(registry.get("translate_text").is_some());
        assert!(registry.get("translate").is_none());

        let schemas = registry.schemas();
        assert_eq!(schemas.len(), registry.len());
        assert!(schemas.iter().all(|s| s.parameters["type"] == "object"));
    }
}
