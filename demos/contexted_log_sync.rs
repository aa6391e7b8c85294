use ecs_context_logger::{ContextValue, EcsLogger, LogContext, PlainTextFormatter};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Operation {
    action: String,
    name: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    EcsLogger::new(PlainTextFormatter)
        .with_level(log::LevelFilter::Info)
        .try_init()?;

    log::info!("Initialized logging");

    // Create a new context with properties
    {
        let _guard = LogContext::new().record("user_id", "12345").enter();

        log::info!("Logging in");

        // Create a nested context with additional properties
        {
            let _nested_guard = LogContext::new()
                .record(
                    "operation",
                    ContextValue::serde(Operation {
                        action: "login".to_string(),
                        name: "user".to_string(),
                    }),
                )
                .enter();
            log::info!("User logged in successfully");
        }

        log::info!("Login completed");
    }

    Ok(())
}
