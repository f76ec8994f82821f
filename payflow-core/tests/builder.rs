use std::sync::Arc;

use payflow_core::types::{Action, BranchNothing, Format, Step, Target, Transform};
use payflow_core::{
    validate_definition, BranchRule, FieldMapping, Record, Services, StepContext, Validate,
    WorkflowBuilder,
};
use serde_json::json;

fn ctx() -> StepContext {
    StepContext::new("wf", Format::Json, Arc::new(Services::new()))
}

#[test]
fn builder_defaults() {
    let def = WorkflowBuilder::new("wf").build();
    assert_eq!(def.name(), "wf");
    assert_eq!(def.format(), Format::Json);
    assert_eq!(def.source(), None);
    assert!(def.mappings().is_empty());
    assert!(def.steps().is_empty());
    assert!(def.branches().is_empty());
    assert!(!def.has_error_handler());
    assert_eq!(def.branch_nothing(), BranchNothing::Replace);
}

#[test]
fn builder_preserves_declaration_order() {
    let mut b = WorkflowBuilder::new("wise_openbanking_pisp");
    b.format(Format::Xml)
        .source("payment_initiation")
        .map("transaction_id", "transactionId")
        .map_with("currency", "currency", "upcase")
        .map("payer_account", ["debtor", "account"])
        .check("Amount must be > 0", |r| r.contains_key("amount"))
        .step("Round amount", |r, _ctx| Ok(Some(r)))
        .step("Initiate Payment", |r, _ctx| Ok(Some(r)))
        .on_error(|e, _r| Err(e));
    let def = b.build();

    assert_eq!(def.format(), Format::Xml);
    assert_eq!(def.source(), Some("payment_initiation"));
    let targets: Vec<String> = def.mappings().iter().map(|m| m.to.to_string()).collect();
    assert_eq!(targets, vec!["transactionId", "currency", "debtor.account"]);
    assert!(matches!(
        def.mappings()[1].transform,
        Some(Transform::Named(ref n)) if n == "upcase"
    ));

    let labels: Vec<&str> = def.steps().iter().map(Step::label).collect();
    assert_eq!(
        labels,
        vec!["Amount must be > 0", "Round amount", "Initiate Payment"]
    );
    assert!(def.steps()[0].is_check());
    assert!(def.has_error_handler());
}

#[test]
fn branch_keeps_every_rule_and_overwrites_on_redefinition() {
    let mut b = WorkflowBuilder::new("wf");
    b.branch("payment_status", |br| {
        assert_eq!(br.attribute(), "payment_status");
        br.when("pending", |r| {
            r.step("Retry Payment", |r, _ctx| Ok(Some(r)));
        })
        .when("pending", |r| {
            r.step("Log", |r, _ctx| Ok(Some(r)));
        })
        .when("failed", |r| {
            r.step("Notify Failure", |r, _ctx| Ok(Some(r)))
                .step("Audit", |r, _ctx| Ok(Some(r)));
        });
    })
    .branch("channel", |br| {
        br.when("web", |r| {
            r.step("Web", |r, _ctx| Ok(Some(r)));
        });
    });
    let def = b.build();

    let rules = &def.branches()["payment_status"];
    assert_eq!(rules.len(), 3);
    assert_eq!(rules[2].value, json!("failed"));
    assert_eq!(rules[2].steps.len(), 2);

    let mut b = WorkflowBuilder::new("wf");
    b.branch("payment_status", |br| {
        br.when("pending", |r| {
            r.step("Old", |r, _ctx| Ok(Some(r)));
        });
    })
    .branch("channel", |_| {})
    .branch("payment_status", |br| {
        br.when("failed", |r| {
            r.step("New", |r, _ctx| Ok(Some(r)));
        });
    });
    let def = b.build();

    let keys: Vec<&str> = def.branches().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["payment_status", "channel"]);
    let rules = &def.branches()["payment_status"];
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].steps[0].name, "New");
}

#[test]
fn add_branch_rule_appends() {
    let mut b = WorkflowBuilder::new("wf");
    b.add_branch_rule(BranchRule::new("status", "pending", Vec::new()))
        .add_branch_rule(BranchRule::new("status", "pending", Vec::new()));
    assert_eq!(b.build().branches()["status"].len(), 2);
}

#[tokio::test]
async fn built_steps_are_callable() {
    let mut b = WorkflowBuilder::new("wf");
    b.step("Add flag", |mut r, ctx| {
        r.insert("step".into(), json!(ctx.step()));
        Ok(Some(r))
    });
    let def = b.build();

    let Step::Action(step) = &def.steps()[0] else {
        panic!("expected an action");
    };
    let ctx = ctx().for_step(&step.name);
    let out = step.action.call(Record::new(), &ctx).await.unwrap().unwrap();
    assert_eq!(out.get("step"), Some(&json!("Add flag")));
}

#[test]
fn definitions_are_cloneable_and_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<payflow_core::WorkflowDefinition>();

    let mut b = WorkflowBuilder::new("wf");
    b.check("always", |_r| true);
    let def = b.build();
    let copy = def.clone();
    let Step::Check(check) = &copy.steps()[0] else {
        panic!("expected a check");
    };
    assert!((check.predicate)(&Record::new()));
}

#[test]
fn lint_accepts_well_formed_definition() {
    let mut b = WorkflowBuilder::new("wf");
    b.map_with("amount", "instructedAmount", "to_f")
        .map_with("amount", "raw", Transform::function(Ok))
        .check("positive", |_r| true)
        .step("Round", |r, _ctx| Ok(Some(r)));
    let def = b.build();
    assert!(def.validate().is_ok());
}

#[test]
fn lint_reports_every_violation() {
    let mut b = WorkflowBuilder::new(" ");
    b.add_mapping(FieldMapping::new("", Target::Path(Vec::new())))
        .map_with("amount", "amount", "shout")
        .check("", |_r| true)
        .step("", |r, _ctx| Ok(Some(r)))
        .add_branch_rule(BranchRule::new("", "x", Vec::new()));
    let err = validate_definition(&b.build()).unwrap_err();

    let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "$.name",
            "$.mappings[0].from",
            "$.mappings[0].to",
            "$.mappings[1].transform",
            "$.steps[0].message",
            "$.steps[1].name",
            "$.branches.",
            "$.branches.[0].steps",
        ]
    );
    assert_eq!(
        err.to_string(),
        "workflow definition failed validation (8 violations)"
    );
}
