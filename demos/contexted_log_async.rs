use std::time::Duration;

use ecs_context_logger::{ContextValue, FutureExt, JsonFormatter, LogContext, try_initialize_logging};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Operation {
    action: String,
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    try_initialize_logging(
        Some(log::LevelFilter::Info),
        None,
        Some(Box::new(JsonFormatter)),
    )?;

    log::info!("Initialized logging");

    // Create a new context with properties.
    let log_context = LogContext::new().record("user_id", "12345");
    let first_future = async move {
        log::info!("Logging in");
        // Create a nested context with additional properties
        let log_context = LogContext::new().record(
            "operation",
            ContextValue::serde(Operation {
                action: "login".to_string(),
                name: "user".to_string(),
            }),
        );
        async move {
            log::info!("User logged in successfully");
            tokio::task::yield_now().await;
        }
        .in_log_context(log_context)
        .await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        log::info!("Login completed");
    }
    .in_log_context(log_context);

    let log_context = LogContext::new()
        .record("name", "Alice")
        .record("age", 25)
        .record("married", true);
    let second_future = tokio::spawn(
        async move {
            tokio::task::yield_now().await;

            log::info!("Another task pending");
            tokio::time::sleep(Duration::from_millis(100)).await;

            LogContext::add_record("operation", "logout");
            log::info!("Another task completed");
        }
        .in_log_context(log_context),
    );

    let ((), res) = tokio::join!(first_future, second_future);
    res?;

    let _guard = LogContext::new()
        .record("name", "Charlie")
        .record("age", 35)
        .enter();

    log::info!("Last call completed");

    Ok(())
}
