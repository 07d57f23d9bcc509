mod common;

use agent_pipeline::{
    AgentError, BatchOptions, ErrorMode, OutputFormat, PipelineOptions, ProviderKind,
    SKIPPED_SENTINEL,
};
use common::scripted_session;
use serde_json::json;

#[tokio::test]
async fn test_batch_substitutes_item_and_index() {
    let (session, invoker, _clock) = scripted_session();
    invoker.respond(ProviderKind::Claude, "A");
    invoker.respond(ProviderKind::Claude, "B");

    let results = session
        .batch(
            "upper",
            BatchOptions {
                items: vec![json!("a"), json!("b")],
                question: "Uppercase {{item}} (#{{index}})".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(results, vec![json!("A"), json!("B")]);

    let calls = invoker.calls();
    assert_eq!(calls[0].prompt, "Uppercase a (#0)");
    assert_eq!(calls[1].prompt, "Uppercase b (#1)");

    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].step_name, "upper[0]");
    assert_eq!(history[1].step_name, "upper[1]");
}

#[tokio::test]
async fn test_batch_object_fields() {
    let (session, invoker, _clock) = scripted_session();
    invoker.respond(ProviderKind::Codex, "Hi Ada");

    let results = session
        .batch(
            "greet",
            BatchOptions {
                items: vec![json!({"name": "Ada", "role": "admin"})],
                question: "Greet {{item.name}} the {{item.role}}".to_string(),
                provider: ProviderKind::Codex,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(results, vec![json!("Hi Ada")]);
    assert_eq!(invoker.calls()[0].prompt, "Greet Ada the admin");
}

#[tokio::test]
async fn test_batch_aborts_on_exhausted_item() {
    let (session, invoker, _clock) = scripted_session();
    invoker.respond(ProviderKind::Claude, "2");
    invoker.fail(ProviderKind::Claude, "down");
    invoker.respond(ProviderKind::Claude, "6");

    let err = session
        .batch(
            "double",
            BatchOptions {
                items: vec![json!(1), json!(2), json!(3)],
                question: "Double {{item}}".to_string(),
                expected_output: OutputFormat::Number,
                retries: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    match err {
        AgentError::Exhausted { step, attempts, .. } => {
            assert_eq!(step, "double[1]");
            assert_eq!(attempts, 1);
        }
        other => panic!("expected exhausted error, got {:?}", other),
    }
    assert_eq!(invoker.calls().len(), 2);
}

#[tokio::test]
async fn test_batch_skip_mode_keeps_going() {
    let (session, invoker, _clock) = scripted_session();
    invoker.respond(ProviderKind::Claude, "2");
    invoker.fail(ProviderKind::Claude, "down");
    invoker.respond(ProviderKind::Claude, "6");

    let results = session
        .batch(
            "double",
            BatchOptions {
                items: vec![json!(1), json!(2), json!(3)],
                question: "Double {{item}}".to_string(),
                expected_output: OutputFormat::Number,
                retries: Some(0),
                on_error: Some(ErrorMode::Skip),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(results, vec![json!(2), json!(SKIPPED_SENTINEL), json!(6)]);
    assert_eq!(session.cost().errors, 1);
}

#[tokio::test]
async fn test_batch_never_uses_fallback_provider() {
    let (session, invoker, _clock) = scripted_session();
    invoker.fail(ProviderKind::Claude, "down");
    invoker.respond(ProviderKind::Codex, "rescued");
    session.pipeline(PipelineOptions {
        retries: Some(0),
        fallback: Some(ProviderKind::Codex),
        on_error: Some(ErrorMode::Fallback),
        ..Default::default()
    });

    let result = session
        .batch(
            "summaries",
            BatchOptions {
                items: vec![json!("doc")],
                question: "Summarize {{item}}".to_string(),
                ..Default::default()
            },
        )
        .await;

    assert!(result.is_err());
    assert_eq!(invoker.call_count(ProviderKind::Codex), 0);
}

#[tokio::test]
async fn test_batch_uses_cache_for_repeated_items() {
    let (session, invoker, _clock) = scripted_session();
    invoker.respond(ProviderKind::Claude, "X");
    session.pipeline(PipelineOptions {
        cache: Some(true),
        ..Default::default()
    });

    let results = session
        .batch(
            "upper",
            BatchOptions {
                items: vec![json!("x"), json!("x")],
                question: "Uppercase {{item}}".to_string(),
                concurrency: Some(8),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(results, vec![json!("X"), json!("X")]);
    assert_eq!(invoker.calls().len(), 1);
    assert!(session.history()[1].cached);
}

#[tokio::test]
async fn test_batch_requires_question_template() {
    let (session, _invoker, _clock) = scripted_session();

    let err = session
        .batch(
            "empty",
            BatchOptions {
                items: vec![json!(1)],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::Validation(_)));
}
