//! A current logging context guard.

use std::marker::PhantomData;

use crate::{
    LogContext,
    stack::CONTEXT_STACK,
};

/// A guard representing a current logging context in the context stack.
///
/// When the guard is dropped, the context is removed from the stack and the
/// parent frame is restored exactly as it was, on every exit path including
/// panics. This is returned by the [`LogContext::enter`] method.
///
/// # Examples
///
/// ```
/// use ecs_context_logger::LogContext;
///
/// let context = LogContext::new().record("user_id", 123);
///
/// // Enter the context (pushes to stack)
/// let guard = context.enter();
///
/// // Log operations here will have access to the context
/// // ...
///
/// // When `guard` goes out of scope, the context is automatically removed
/// ```
#[non_exhaustive]
#[derive(Debug)]
pub struct LogContextGuard<'a> {
    // Make this guard unsendable.
    _marker: PhantomData<&'a *mut ()>,
}

impl LogContextGuard<'_> {
    pub(crate) fn enter(context: LogContext) -> Self {
        // During thread teardown the stack may already be destroyed; the
        // scope then simply never materializes, and the drop below pops
        // nothing. Both sides stay balanced.
        let _ = CONTEXT_STACK.try_with(|stack| stack.push(context.into_fields()));
        Self {
            _marker: PhantomData,
        }
    }
}

impl Drop for LogContextGuard<'_> {
    fn drop(&mut self) {
        // ContextStack::pop tolerates an empty stack, and `try_with` covers
        // a drop that runs from another thread-local's destructor during
        // thread teardown, when the stack itself may already be gone.
        let _ = CONTEXT_STACK.try_with(|stack| stack.pop());
    }
}
