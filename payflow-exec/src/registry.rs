use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use payflow_core::document::WorkflowDocument;
use payflow_core::{
    compile_document, DefinitionError, Record, RegistryError, RunError, Services,
    WorkflowBuilder, WorkflowDefinition,
};
use tracing::{debug, warn};

use crate::executor::{EventSink, Executor, ExecutorConfig};

/// Named workflow definitions plus the executor that runs them.
///
/// Create one at startup and share it (`Arc<Registry>`) with every caller. Definitions are
/// stored behind an `RwLock`; no lock is held while a workflow runs, so runs proceed
/// concurrently with each other and with later registrations.
pub struct Registry {
    workflows: RwLock<HashMap<String, Arc<WorkflowDefinition>>>,
    executor: Executor,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_executor(Executor::default())
    }

    pub fn with_executor(executor: Executor) -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
            executor,
        }
    }

    pub fn with_config(self, config: ExecutorConfig) -> Self {
        let executor = Executor::new(
            config,
            self.executor.services().clone(),
            self.executor.event_sink().clone(),
        );
        Self { executor, ..self }
    }

    /// Collaborators made available to actions through `StepContext::service`.
    pub fn with_services(self, services: Services) -> Self {
        let executor = Executor::new(
            self.executor.config().clone(),
            Arc::new(services),
            self.executor.event_sink().clone(),
        );
        Self { executor, ..self }
    }

    pub fn with_event_sink(self, sink: Arc<dyn EventSink>) -> Self {
        let executor = Executor::new(
            self.executor.config().clone(),
            self.executor.services().clone(),
            sink,
        );
        Self { executor, ..self }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Build a definition named `name` and store it, replacing any previous one.
    pub fn define<F>(&self, name: impl Into<String>, build: F) -> Arc<WorkflowDefinition>
    where
        F: FnOnce(&mut WorkflowBuilder),
    {
        let mut builder = WorkflowBuilder::new(name);
        build(&mut builder);
        let definition = Arc::new(builder.build());
        self.insert(definition.clone());
        definition
    }

    /// Store an already-built definition under its own name. Returns the one it replaced.
    pub fn register(&self, definition: WorkflowDefinition) -> Option<Arc<WorkflowDefinition>> {
        self.insert(Arc::new(definition))
    }

    /// Validate and compile every workflow of `document`, then register them all.
    ///
    /// Nothing is registered when the document has violations.
    pub fn define_document(&self, document: &WorkflowDocument) -> Result<Vec<String>, DefinitionError> {
        let definitions = compile_document(document)?;
        Ok(definitions
            .into_iter()
            .map(|definition| {
                let name = definition.name().to_string();
                self.register(definition);
                name
            })
            .collect())
    }

    pub fn find(&self, name: &str) -> Result<Arc<WorkflowDefinition>, RegistryError> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// Run the workflow called `name` against `data`.
    ///
    /// An unknown name returns [`RunError::Registry`] carrying `data` untouched; no handler
    /// runs.
    pub async fn run(&self, name: &str, data: Record) -> Result<Option<Record>, RunError> {
        let definition = match self.find(name) {
            Ok(definition) => definition,
            Err(source) => {
                warn!(workflow = name, "workflow not found");
                return Err(RunError::Registry { source, data });
            }
        };
        Ok(self.executor.run(&definition, data).await?)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<WorkflowDefinition>> {
        let removed = self.write().remove(name);
        if removed.is_some() {
            debug!(workflow = name, "workflow removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn insert(&self, definition: Arc<WorkflowDefinition>) -> Option<Arc<WorkflowDefinition>> {
        let name = definition.name().to_string();
        let previous = self.write().insert(name.clone(), definition);
        debug!(workflow = %name, replaced = previous.is_some(), "workflow defined");
        previous
    }

    // Writers only insert or remove whole entries, so a poisoned map is still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<WorkflowDefinition>>> {
        self.workflows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<WorkflowDefinition>>> {
        self.workflows.write().unwrap_or_else(PoisonError::into_inner)
    }
}
