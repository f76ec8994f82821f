use std::collections::HashSet;

use crate::document::{Condition, DocStep, DocWorkflow, WorkflowDocument};
use crate::transforms::is_builtin;
use crate::validate::validator::Validator;

pub(crate) fn validate_document(v: &mut Validator, doc: &WorkflowDocument) {
    v.validate_extensions("$", &doc.extensions);

    if doc.workflows.is_empty() {
        v.push("$.workflows", "must have at least one entry");
    }

    let mut names = HashSet::<String>::new();
    for (idx, wf) in doc.workflows.iter().enumerate() {
        let path = format!("$.workflows[{idx}]");
        v.validate_extensions(&path, &wf.extensions);
        v.require_non_empty(format!("{path}.name"), &wf.name);
        if !names.insert(wf.name.clone()) {
            v.push(format!("{path}.name"), "must be unique");
        }
        validate_workflow(v, wf, &path);
    }
}

fn validate_workflow(v: &mut Validator, wf: &DocWorkflow, path: &str) {
    for (idx, m) in wf.mappings.iter().enumerate() {
        let mpath = format!("{path}.mappings[{idx}]");
        v.validate_extensions(&mpath, &m.extensions);
        v.require_non_empty(format!("{mpath}.from"), &m.from);
        v.validate_target(&format!("{mpath}.to"), &m.to.segments());
        if let Some(t) = &m.transform {
            if !is_builtin(t) {
                v.push(format!("{mpath}.transform"), format!("unknown transform '{t}'"));
            }
        }
    }

    for (idx, s) in wf.steps.iter().enumerate() {
        validate_step(v, s, &format!("{path}.steps[{idx}]"), true);
    }

    for (attribute, rules) in &wf.branches {
        let bpath = format!("{path}.branches.{attribute}");
        v.require_non_empty(bpath.clone(), attribute);
        for (ridx, rule) in rules.iter().enumerate() {
            let rpath = format!("{bpath}[{ridx}]");
            v.validate_extensions(&rpath, &rule.extensions);
            if rule.steps.is_empty() {
                v.push(format!("{rpath}.steps"), "must have at least one entry");
            }
            for (sidx, s) in rule.steps.iter().enumerate() {
                validate_step(v, s, &format!("{rpath}.steps[{sidx}]"), false);
            }
        }
    }

    if let Some(handler) = &wf.on_error {
        let hpath = format!("{path}.on_error");
        v.validate_extensions(&hpath, &handler.extensions);
        if handler.propagate && (handler.set.is_some() || handler.error_field.is_some()) {
            v.push(hpath, "propagate cannot be combined with set or error_field");
        }
    }
}

fn validate_step(v: &mut Validator, s: &DocStep, path: &str, allow_check: bool) {
    v.validate_extensions(path, &s.extensions);
    let ops = s.operation_count();

    if let Some(cond) = &s.check {
        if !allow_check {
            v.push(format!("{path}.check"), "checks are not allowed inside branch rules");
        }
        if ops != 0 {
            v.push(path, "a check step cannot also carry an operation");
        }
        if let Err(e) = Condition::parse(cond) {
            v.push(format!("{path}.check"), e.to_string());
        }
        return;
    }

    if s.message.is_some() {
        v.push(format!("{path}.message"), "only allowed on check steps");
    }
    if ops != 1 {
        v.push(
            path,
            "exactly one of set, remove, copy, increment, append, round must be provided",
        );
    }
    if let Some(name) = &s.name {
        v.require_non_empty(format!("{path}.name"), name);
    }
    if let Some(copy) = &s.copy {
        v.require_non_empty(format!("{path}.copy.from"), &copy.from);
        v.validate_target(&format!("{path}.copy.to"), &copy.to.segments());
    }
    if let Some(inc) = &s.increment {
        v.require_non_empty(format!("{path}.increment.field"), &inc.field);
        if !inc.by.is_finite() {
            v.push(format!("{path}.increment.by"), "must be a finite number");
        }
    }
    if let Some(app) = &s.append {
        v.require_non_empty(format!("{path}.append.field"), &app.field);
    }
    if let Some(round) = &s.round {
        v.require_non_empty(format!("{path}.round.field"), &round.field);
        if round.places > 15 {
            v.push(format!("{path}.round.places"), "must be at most 15");
        }
    }
}
