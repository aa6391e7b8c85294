use crate::{
    ContextValue, StaticCowStr,
    fields::FieldMap,
    guard::LogContextGuard,
    stack::CONTEXT_STACK,
};

/// A set of properties to attach to every log statement emitted while the
/// context is active.
///
/// Keys may be dotted (`"http.method"`); they stay flat inside the context
/// and are expanded to nested form by the JSON formatter.
///
/// # Example
///
/// ```
/// use ecs_context_logger::LogContext;
///
/// let _guard = LogContext::new()
///     .record("request_id", "req-123")
///     .record("user_id", 42)
///     .enter();
///
/// log::info!("processing request"); // carries request_id and user_id
/// ```
#[derive(Debug, Default)]
pub struct LogContext(pub(crate) Vec<(StaticCowStr, ContextValue)>);

impl LogContext {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a property to this context.
    #[must_use]
    pub fn record(mut self, key: impl Into<StaticCowStr>, value: impl Into<ContextValue>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// Adds a property to the innermost active context on the current
    /// thread. Does nothing when no context is active, or when the stack is
    /// already destroyed during thread teardown.
    pub fn add_record(key: impl Into<StaticCowStr>, value: impl Into<ContextValue>) {
        let (key, value) = (key.into(), value.into());
        let _ = CONTEXT_STACK.try_with(|stack| {
            if let Some(mut top) = stack.top_mut() {
                top.insert(key.into_owned(), value.as_json());
            }
        });
    }

    /// Activates the context on the current thread until the returned guard
    /// is dropped.
    #[must_use]
    pub fn enter<'a>(self) -> LogContextGuard<'a> {
        LogContextGuard::enter(self)
    }

    /// Materializes the recorded properties. A key recorded twice keeps its
    /// original position with the later value.
    pub(crate) fn into_fields(self) -> FieldMap {
        let mut fields = FieldMap::new();
        for (key, value) in self.0 {
            fields.insert(key.into_owned(), value.as_json());
        }
        fields
    }
}
