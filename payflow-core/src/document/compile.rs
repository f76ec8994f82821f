use std::sync::Arc;

use crate::builder::WorkflowBuilder;
use crate::document::condition::Condition;
use crate::document::ops::{DocumentErrorHandler, OpAction, Operation};
use crate::document::{DocStep, DocTarget, DocWorkflow, WorkflowDocument};
use crate::error::DefinitionError;
use crate::types::{
    ActionStep, BranchRule, Check, FieldMapping, Record, Step, Target, WorkflowDefinition,
};
use crate::validate::validate_workflow_document;

/// Validate `doc` and turn each of its workflows into a [`WorkflowDefinition`].
pub fn compile_document(doc: &WorkflowDocument) -> Result<Vec<WorkflowDefinition>, DefinitionError> {
    validate_workflow_document(doc)?;
    Ok(doc.workflows.iter().map(build_workflow).collect())
}

/// Compile a single workflow, validating it on its own.
pub fn compile_workflow(wf: &DocWorkflow) -> Result<WorkflowDefinition, DefinitionError> {
    let doc = WorkflowDocument {
        workflows: vec![wf.clone()],
        extensions: Default::default(),
    };
    validate_workflow_document(&doc)?;
    Ok(build_workflow(wf))
}

// Callers have validated `wf`, so every step parses and carries one operation.
fn build_workflow(wf: &DocWorkflow) -> WorkflowDefinition {
    let mut b = WorkflowBuilder::new(wf.name.clone());
    if let Some(format) = wf.format {
        b.format(format);
    }
    if let Some(source) = &wf.source {
        b.source(source.clone());
    }
    if let Some(policy) = wf.branch_nothing {
        b.branch_nothing(policy);
    }

    for m in &wf.mappings {
        let mut mapping = FieldMapping::new(m.from.clone(), target(&m.to));
        if let Some(t) = &m.transform {
            mapping = mapping.with_transform(t.as_str());
        }
        b.add_mapping(mapping);
    }

    for (idx, s) in wf.steps.iter().enumerate() {
        if let Some(step) = build_step(s, idx) {
            b.add_step(step);
        }
    }

    for (attribute, rules) in &wf.branches {
        for rule in rules {
            let steps = rule
                .steps
                .iter()
                .enumerate()
                .filter_map(|(idx, s)| build_action(s, idx))
                .collect();
            b.add_branch_rule(BranchRule::new(attribute.clone(), rule.when.clone(), steps));
        }
    }

    if let Some(handler) = &wf.on_error {
        b.on_error_with(DocumentErrorHandler::new(handler.clone()));
    }

    b.build()
}

fn target(t: &DocTarget) -> Target {
    match t {
        DocTarget::Key(k) => Target::Key(k.clone()),
        DocTarget::Path(p) => Target::Path(p.clone()),
    }
}

fn build_step(s: &DocStep, idx: usize) -> Option<Step> {
    if let Some(cond) = &s.check {
        let condition = Condition::parse(cond).ok()?;
        let message = s
            .message
            .clone()
            .unwrap_or_else(|| format!("check failed: {condition}"));
        return Some(Step::Check(Check {
            message,
            predicate: Arc::new(move |record: &Record| condition.evaluate(record)),
        }));
    }
    build_action(s, idx).map(Step::Action)
}

fn build_action(s: &DocStep, idx: usize) -> Option<ActionStep> {
    let op = Operation::from_step(s)?;
    let name = s
        .name
        .clone()
        .unwrap_or_else(|| format!("{}#{idx}", op.kind()));
    Some(ActionStep::new(name, OpAction::new(op)))
}
