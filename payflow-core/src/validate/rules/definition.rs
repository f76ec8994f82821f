use crate::transforms::is_builtin;
use crate::types::{Step, Transform, WorkflowDefinition};
use crate::validate::validator::Validator;

pub(crate) fn validate_definition(v: &mut Validator, def: &WorkflowDefinition) {
    v.require_non_empty("$.name", def.name());

    for (idx, m) in def.mappings().iter().enumerate() {
        let path = format!("$.mappings[{idx}]");
        v.require_non_empty(format!("{path}.from"), &m.from);
        v.validate_target(&format!("{path}.to"), &m.to.segments());
        if let Some(Transform::Named(name)) = &m.transform {
            if !is_builtin(name) {
                v.push(format!("{path}.transform"), format!("unknown transform '{name}'"));
            }
        }
    }

    for (idx, s) in def.steps().iter().enumerate() {
        let path = format!("$.steps[{idx}]");
        match s {
            Step::Check(c) => v.require_non_empty(format!("{path}.message"), &c.message),
            Step::Action(a) => v.require_non_empty(format!("{path}.name"), &a.name),
        }
    }

    for (attribute, rules) in def.branches() {
        let path = format!("$.branches.{attribute}");
        v.require_non_empty(path.clone(), attribute);
        for (ridx, rule) in rules.iter().enumerate() {
            let rpath = format!("{path}[{ridx}]");
            if rule.steps.is_empty() {
                v.push(format!("{rpath}.steps"), "must have at least one entry");
            }
            for (sidx, step) in rule.steps.iter().enumerate() {
                v.require_non_empty(format!("{rpath}.steps[{sidx}].name"), &step.name);
            }
        }
    }
}
