use ecs_context_logger::{FutureExt, JsonFormatter, LogContext};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

pub mod common;

#[test]
fn test_smoke() {
    let output = common::init_captured_logger(JsonFormatter);

    {
        let _guard = LogContext::new().record("z", "zzz").enter();
        log::info!(answer = 42; "hello");
    }
    log::info!("outside the scope");

    let lines = output.lines();
    assert_eq!(lines.len(), 2);

    let first: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(first["message"], json!("hello"));
    assert_eq!(first["log.level"], json!("INFO"));
    assert_eq!(first["z"], json!("zzz"));
    assert_eq!(first["answer"], json!(42));
    assert_eq!(first["log"]["logger"], json!("smoke"));
    assert!(first["process"]["pid"].is_number());
    let timestamp = first["@timestamp"].as_str().unwrap();
    assert!(timestamp.ends_with('Z'), "unexpected timestamp: {timestamp}");

    // Head keys come first, in order.
    assert!(lines[0].starts_with(r#"{"@timestamp":"#), "unexpected: {}", lines[0]);

    let second: Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(second["message"], json!("outside the scope"));
    assert_eq!(second["z"], Value::Null);

    // Context also propagates through futures polled on other threads.
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        tokio::spawn(
            async {
                log::info!("from a task");
                tokio::task::yield_now().await;
                log::info!("after a yield");
            }
            .in_log_context(LogContext::new().record("task", "worker")),
        )
        .await
        .unwrap();
    });

    let lines = output.lines();
    assert_eq!(lines.len(), 4);
    for line in &lines[2..] {
        let event: Value = serde_json::from_str(line).unwrap();
        assert_eq!(event["task"], json!("worker"));
    }
}
