use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::BoxError;

pub type TransformFn = Arc<dyn Fn(JsonValue) -> Result<JsonValue, BoxError> + Send + Sync>;

/// Where a mapped value is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Key(String),
    /// Nested placement; intermediate records are created on demand.
    Path(Vec<String>),
}

impl Target {
    pub fn segments(&self) -> Vec<String> {
        match self {
            Target::Key(k) => vec![k.clone()],
            Target::Path(p) => p.clone(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Key(k) => f.write_str(k),
            Target::Path(p) => f.write_str(&p.join(".")),
        }
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Target::Key(value.to_string())
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Target::Key(value)
    }
}

impl From<Vec<String>> for Target {
    fn from(value: Vec<String>) -> Self {
        Target::Path(value)
    }
}

impl From<Vec<&str>> for Target {
    fn from(value: Vec<&str>) -> Self {
        Target::Path(value.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Target {
    fn from(value: [&str; N]) -> Self {
        Target::Path(value.iter().map(|s| s.to_string()).collect())
    }
}

#[derive(Clone)]
pub enum Transform {
    /// Resolved through the built-in table in [`crate::transforms`].
    Named(String),
    Function(TransformFn),
}

impl Transform {
    pub fn named(name: impl Into<String>) -> Self {
        Transform::Named(name.into())
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(JsonValue) -> Result<JsonValue, BoxError> + Send + Sync + 'static,
    {
        Transform::Function(Arc::new(f))
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Transform::Function(_) => f.write_str("Function(<fn>)"),
        }
    }
}

impl From<&str> for Transform {
    fn from(value: &str) -> Self {
        Transform::Named(value.to_string())
    }
}

impl From<String> for Transform {
    fn from(value: String) -> Self {
        Transform::Named(value)
    }
}

#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub from: String,
    pub to: Target,
    pub transform: Option<Transform>,
}

impl FieldMapping {
    pub fn new(from: impl Into<String>, to: impl Into<Target>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: impl Into<Transform>) -> Self {
        self.transform = Some(transform.into());
        self
    }
}
