//! Propagating a log context across `await` points and task boundaries.

use std::task::Poll;

use pin_project::pin_project;

use crate::{
    LogContext,
    stack::{ContextFrame, CONTEXT_STACK},
};

/// Extension trait that attaches a [`LogContext`] to a future.
pub trait FutureExt: Future + Sized {
    /// Wraps the future so its body observes `context` on every poll, no
    /// matter which thread the runtime polls it from.
    fn in_log_context(self, context: LogContext) -> LogContextFuture<Self>;
}

impl<F> FutureExt for F
where
    F: Future,
{
    fn in_log_context(self, context: LogContext) -> LogContextFuture<Self> {
        LogContextFuture {
            inner: self,
            fields: Some(context.into_fields()),
            frame: None,
        }
    }
}

#[pin_project]
#[derive(Debug)]
pub struct LogContextFuture<F> {
    #[pin]
    inner: F,
    fields: Option<ContextFrame>,
    frame: Option<ContextFrame>,
}

impl<F> Future for LogContextFuture<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: std::pin::Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        // The first poll merges the context with whatever is on the polling
        // thread's stack; afterwards the popped snapshot is re-installed
        // verbatim so `LogContext::add_record` mutations survive.
        match (this.fields.take(), this.frame.take()) {
            (Some(fields), _) => {
                CONTEXT_STACK.with(|stack| stack.push(fields));
            }
            (None, Some(frame)) => {
                CONTEXT_STACK.with(|stack| stack.push_frame(frame));
            }
            (None, None) => {
                CONTEXT_STACK.with(|stack| stack.push_frame(ContextFrame::new()));
            }
        }
        let result = this.inner.poll(cx);
        this.frame.replace(CONTEXT_STACK.with(|stack| stack.pop()));

        result
    }
}
