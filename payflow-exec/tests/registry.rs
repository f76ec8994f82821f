use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use payflow_core::types::{Action, Format};
use payflow_core::{
    parse_document_str, BoxError, DocumentFormat, MissingService, Record, RegistryError, RunError,
    Services, StepContext, WorkflowError,
};
use payflow_exec::{NoOpEventSink, Registry};
use serde_json::{json, Value};

fn record(v: Value) -> Record {
    v.as_object().cloned().expect("object literal")
}

fn registry() -> Registry {
    Registry::new().with_event_sink(Arc::new(NoOpEventSink))
}

#[tokio::test]
async fn unknown_workflow_returns_data_unchanged() {
    let reg = registry();
    let data = record(json!({"amount": "10", "nested": {"a": [1, 2]}}));

    let err = reg.run("missing", data.clone()).await.unwrap_err();

    assert_eq!(err.to_string(), "workflow not found: missing");
    match err {
        RunError::Registry { source, data: returned } => {
            assert!(matches!(source, RegistryError::NotFound { ref name } if name == "missing"));
            assert_eq!(returned, data);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_workflow_never_calls_a_handler() {
    let reg = registry();
    reg.define("present", |b| {
        b.on_error(|_e, _r| panic!("must not run"));
    });

    let err = reg.run("absent", Record::new()).await.unwrap_err();

    assert_eq!(err.into_data(), Some(Record::new()));
}

#[test]
fn find_reports_not_found() {
    let reg = registry();
    let err = reg.find("nope").unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { ref name } if name == "nope"));
}

#[tokio::test]
async fn define_overwrites_previous_definition() {
    let reg = registry();
    reg.define("wf", |b| {
        b.step("v1", |mut r, _ctx| {
            r.insert("version".into(), json!(1));
            Ok(Some(r))
        });
    });
    reg.define("wf", |b| {
        b.step("v2", |mut r, _ctx| {
            r.insert("version".into(), json!(2));
            Ok(Some(r))
        });
    });

    assert_eq!(reg.len(), 1);
    let out = reg.run("wf", Record::new()).await.unwrap();
    assert_eq!(out, Some(record(json!({"version": 2}))));
}

#[test]
fn names_contains_remove() {
    let reg = registry();
    assert!(reg.is_empty());
    reg.define("b", |_| {});
    reg.define("a", |_| {});

    assert_eq!(reg.names(), vec!["a".to_string(), "b".to_string()]);
    assert!(reg.contains("a"));

    let removed = reg.remove("a").expect("removed");
    assert_eq!(removed.name(), "a");
    assert!(!reg.contains("a"));
    assert!(reg.remove("a").is_none());
    assert_eq!(reg.len(), 1);
}

#[test]
fn register_returns_replaced_definition() {
    let reg = registry();
    let mut b = payflow_core::WorkflowBuilder::new("wf");
    b.format(Format::Xml);
    assert!(reg.register(b.build()).is_none());

    let replaced = reg
        .register(payflow_core::WorkflowBuilder::new("wf").build())
        .expect("previous definition");
    assert_eq!(replaced.format(), Format::Xml);
    assert_eq!(reg.find("wf").unwrap().format(), Format::Json);
}

struct FxRates {
    gbp_eur: f64,
}

#[tokio::test]
async fn actions_reach_injected_services() {
    let reg = registry().with_services(Services::new().with(FxRates { gbp_eur: 1.25 }));
    reg.define("convert", |b| {
        b.format(Format::Xml).step("Convert", |mut r, ctx| {
            let rates = ctx.require::<FxRates>()?;
            let amount = r.get("amount").and_then(Value::as_f64).unwrap_or(0.0);
            r.insert("eur".into(), json!(amount * rates.gbp_eur));
            r.insert("workflow".into(), json!(ctx.workflow()));
            r.insert("step".into(), json!(ctx.step()));
            r.insert("format".into(), json!(ctx.format().as_str()));
            Ok(Some(r))
        });
    });

    let out = reg.run("convert", record(json!({"amount": 10.0}))).await.unwrap().unwrap();

    assert_eq!(out.get("eur"), Some(&json!(12.5)));
    assert_eq!(out.get("workflow"), Some(&json!("convert")));
    assert_eq!(out.get("step"), Some(&json!("Convert")));
    assert_eq!(out.get("format"), Some(&json!("xml")));
}

#[tokio::test]
async fn missing_service_is_a_step_error() {
    let reg = registry();
    reg.define("convert", |b| {
        b.step("Convert", |r, ctx| {
            ctx.require::<FxRates>()?;
            Ok(Some(r))
        });
    });

    let err = reg.run("convert", Record::new()).await.unwrap_err();

    match err {
        RunError::Workflow(WorkflowError::Step { source, .. }) => {
            assert!(source.downcast_ref::<MissingService>().is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

struct ConvertInBackground;

#[async_trait]
impl Action for ConvertInBackground {
    async fn call(&self, mut record: Record, ctx: &StepContext) -> Result<Option<Record>, BoxError> {
        let rates = ctx.services().get_arc::<FxRates>().ok_or(MissingService {
            type_name: "FxRates",
        })?;
        let amount = record.get("amount").and_then(Value::as_f64).unwrap_or(0.0);
        let eur = tokio::spawn(async move { amount * rates.gbp_eur }).await?;
        record.insert("eur".into(), json!(eur));
        Ok(Some(record))
    }
}

#[tokio::test]
async fn async_actions_can_hold_owned_service_handles() {
    let reg = registry().with_services(Services::new().with(FxRates { gbp_eur: 2.0 }));
    reg.define("convert", |b| {
        b.step_with("Convert", ConvertInBackground);
    });

    let out = reg.run("convert", record(json!({"amount": 3.0}))).await.unwrap().unwrap();

    assert_eq!(out.get("eur"), Some(&json!(6.0)));
}

struct SlowInitiate;

#[async_trait]
impl Action for SlowInitiate {
    async fn call(&self, mut record: Record, ctx: &StepContext) -> Result<Option<Record>, BoxError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        record.insert("run_id".into(), json!(ctx.run_id().to_string()));
        record.insert("status".into(), json!("initiated"));
        Ok(Some(record))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_runs_are_isolated() {
    let reg = Arc::new(registry());
    reg.define("initiate", |b| {
        b.map_with("id", "transactionId", "to_s").step_with("Initiate", SlowInitiate);
    });

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let reg = reg.clone();
            tokio::spawn(async move { reg.run("initiate", record(json!({"id": i}))).await })
        })
        .collect();

    let mut run_ids = Vec::new();
    for (i, handle) in handles.into_iter().enumerate() {
        let out = handle.await.unwrap().unwrap().unwrap();
        assert_eq!(out.get("transactionId"), Some(&json!(i.to_string())));
        assert_eq!(out.get("status"), Some(&json!("initiated")));
        run_ids.push(out.get("run_id").cloned().unwrap());
    }
    run_ids.sort_by_key(|v| v.to_string());
    run_ids.dedup();
    assert_eq!(run_ids.len(), 16);
}

#[tokio::test]
async fn define_document_registers_every_workflow() {
    let yaml = r#"
workflows:
  - name: wise_openbanking_pisp
    format: json
    source: payment_initiation
    mappings:
      - { from: transaction_id, to: transactionId }
      - { from: amount, to: instructedAmount, transform: number }
      - { from: currency, to: currency, transform: upcase }
      - { from: payer_account, to: [debtor, account] }
    steps:
      - check: "instructedAmount > 0"
        message: Amount must be > 0
      - name: Round amount
        round: { field: instructedAmount, places: 2 }
    branches:
      payment_status:
        - when: failed
          steps:
            - { name: Flag failure, set: { notified: true } }
    on_error:
      set: { error: true }
      error_field: reason
  - name: counter
    steps:
      - increment: { field: counter }
      - increment: { field: counter }
"#;
    let parsed = parse_document_str(yaml, DocumentFormat::Auto).unwrap();
    let reg = registry();

    let names = reg.define_document(&parsed.document).unwrap();

    assert_eq!(names, vec!["wise_openbanking_pisp", "counter"]);

    let ok = reg
        .run(
            "wise_openbanking_pisp",
            record(json!({
                "transaction_id": "txn_001",
                "amount": "100.456",
                "currency": "gbp",
                "payer_account": "A123",
                "payment_status": "failed"
            })),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ok.get("instructedAmount"), Some(&json!(100.46)));
    assert_eq!(ok.get("currency"), Some(&json!("GBP")));
    assert_eq!(ok.get("debtor"), Some(&json!({"account": "A123"})));
    assert_eq!(ok.get("notified"), Some(&json!(true)));

    let handled = reg
        .run(
            "wise_openbanking_pisp",
            record(json!({"amount": "-5", "currency": "gbp"})),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(handled.get("error"), Some(&json!(true)));
    assert_eq!(handled.get("instructedAmount"), Some(&json!(-5)));
    assert_eq!(
        handled.get("reason"),
        Some(&json!("validation failed: Amount must be > 0"))
    );

    let counted = reg.run("counter", Record::new()).await.unwrap();
    assert_eq!(counted, Some(record(json!({"counter": 2}))));
}

#[test]
fn invalid_document_registers_nothing() {
    let yaml = r#"
workflows:
  - name: ok
  - name: broken
    steps:
      - { set: { a: 1 }, remove: [b] }
"#;
    let parsed = parse_document_str(yaml, DocumentFormat::Yaml).unwrap();
    let reg = registry();

    let err = reg.define_document(&parsed.document).unwrap_err();

    assert!(!err.violations.is_empty());
    assert!(reg.is_empty());
}
