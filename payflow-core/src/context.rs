use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::types::Format;

/// Collaborator handles injected by the host (HTTP clients, credential stores, ...),
/// keyed by type.
#[derive(Clone, Default)]
pub struct Services {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.insert_arc(Arc::new(value))
    }

    pub fn insert_arc<T: Send + Sync + 'static>(&mut self, value: Arc<T>) -> &mut Self {
        self.entries.insert(TypeId::of::<T>(), value);
        self
    }

    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_arc<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let entry = self.entries.get(&TypeId::of::<T>())?.clone();
        entry.downcast::<T>().ok()
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("no service of type {type_name} was provided")]
pub struct MissingService {
    pub type_name: &'static str,
}

/// Per-run execution context handed to actions and error handlers.
#[derive(Debug, Clone)]
pub struct StepContext {
    run_id: Uuid,
    workflow: Arc<str>,
    step: Option<String>,
    format: Format,
    services: Arc<Services>,
}

impl StepContext {
    pub fn new(workflow: &str, format: Format, services: Arc<Services>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workflow: Arc::from(workflow),
            step: None,
            format,
            services,
        }
    }

    /// A copy of this context scoped to one step.
    pub fn for_step(&self, step: &str) -> Self {
        Self {
            step: Some(step.to_string()),
            ..self.clone()
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    pub fn step(&self) -> Option<&str> {
        self.step.as_deref()
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn service<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.services.get::<T>()
    }

    /// Like [`StepContext::service`], but a missing collaborator is an error the
    /// action can propagate with `?`.
    pub fn require<T: Send + Sync + 'static>(&self) -> Result<&T, MissingService> {
        self.services.get::<T>().ok_or(MissingService {
            type_name: std::any::type_name::<T>(),
        })
    }
}
