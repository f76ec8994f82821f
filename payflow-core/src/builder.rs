use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::context::StepContext;
use crate::error::{BoxError, WorkflowError};
use crate::types::{
    Action, ActionStep, BranchNothing, BranchRule, Check, ErrorHandler, FieldMapping,
    FnErrorHandler, Format, Record, Step, Target, Transform, WorkflowDefinition,
};

/// Ordered-append builder frozen into a [`WorkflowDefinition`] by [`WorkflowBuilder::build`].
pub struct WorkflowBuilder {
    name: String,
    format: Format,
    source: Option<String>,
    mappings: Vec<FieldMapping>,
    steps: Vec<Step>,
    branches: IndexMap<String, Vec<BranchRule>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    branch_nothing: BranchNothing,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: Format::default(),
            source: None,
            mappings: Vec::new(),
            steps: Vec::new(),
            branches: IndexMap::new(),
            error_handler: None,
            branch_nothing: BranchNothing::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&mut self, format: Format) -> &mut Self {
        self.format = format;
        self
    }

    pub fn source(&mut self, source: impl Into<String>) -> &mut Self {
        self.source = Some(source.into());
        self
    }

    pub fn add_mapping(&mut self, mapping: FieldMapping) -> &mut Self {
        self.mappings.push(mapping);
        self
    }

    pub fn map(&mut self, from: impl Into<String>, to: impl Into<Target>) -> &mut Self {
        self.add_mapping(FieldMapping::new(from, to))
    }

    pub fn map_with(
        &mut self,
        from: impl Into<String>,
        to: impl Into<Target>,
        transform: impl Into<Transform>,
    ) -> &mut Self {
        self.add_mapping(FieldMapping::new(from, to).with_transform(transform))
    }

    pub fn add_step(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn check<P>(&mut self, message: impl Into<String>, predicate: P) -> &mut Self
    where
        P: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.add_step(Step::Check(Check {
            message: message.into(),
            predicate: Arc::new(predicate),
        }))
    }

    pub fn step<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Record, &StepContext) -> Result<Option<Record>, BoxError> + Send + Sync + 'static,
    {
        self.add_step(Step::Action(ActionStep::from_fn(name, f)))
    }

    pub fn step_with(&mut self, name: impl Into<String>, action: impl Action + 'static) -> &mut Self {
        self.add_step(Step::Action(ActionStep::new(name, action)))
    }

    /// Define every rule for `attribute`, replacing any earlier definition for it.
    pub fn branch<F>(&mut self, attribute: impl Into<String>, f: F) -> &mut Self
    where
        F: FnOnce(&mut BranchBuilder),
    {
        let attribute = attribute.into();
        let mut b = BranchBuilder::new(attribute.clone());
        f(&mut b);
        self.branches.insert(attribute, b.rules);
        self
    }

    /// Append one rule under its attribute, after any rules already there.
    pub fn add_branch_rule(&mut self, rule: BranchRule) -> &mut Self {
        self.branches
            .entry(rule.attribute.clone())
            .or_default()
            .push(rule);
        self
    }

    pub fn on_error<H>(&mut self, handler: H) -> &mut Self
    where
        H: Fn(WorkflowError, Record) -> Result<Record, WorkflowError> + Send + Sync + 'static,
    {
        self.on_error_with(FnErrorHandler(handler))
    }

    pub fn on_error_with(&mut self, handler: impl ErrorHandler + 'static) -> &mut Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn branch_nothing(&mut self, policy: BranchNothing) -> &mut Self {
        self.branch_nothing = policy;
        self
    }

    pub fn build(self) -> WorkflowDefinition {
        WorkflowDefinition {
            name: self.name,
            format: self.format,
            source: self.source,
            mappings: self.mappings,
            steps: self.steps,
            branches: self.branches,
            error_handler: self.error_handler,
            branch_nothing: self.branch_nothing,
        }
    }
}

/// Collects the rules of one `branch` block.
pub struct BranchBuilder {
    attribute: String,
    rules: Vec<BranchRule>,
}

impl BranchBuilder {
    fn new(attribute: String) -> Self {
        Self {
            attribute,
            rules: Vec::new(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Add a rule that runs when the attribute equals `value`. Rules sharing a value all run.
    pub fn when<F>(&mut self, value: impl Into<JsonValue>, f: F) -> &mut Self
    where
        F: FnOnce(&mut RuleBuilder),
    {
        let mut rb = RuleBuilder { steps: Vec::new() };
        f(&mut rb);
        self.rules
            .push(BranchRule::new(self.attribute.clone(), value, rb.steps));
        self
    }
}

pub struct RuleBuilder {
    steps: Vec<ActionStep>,
}

impl RuleBuilder {
    pub fn step<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Record, &StepContext) -> Result<Option<Record>, BoxError> + Send + Sync + 'static,
    {
        self.steps.push(ActionStep::from_fn(name, f));
        self
    }

    pub fn step_with(&mut self, name: impl Into<String>, action: impl Action + 'static) -> &mut Self {
        self.steps.push(ActionStep::new(name, action));
        self
    }
}
