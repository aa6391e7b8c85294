use std::cell::{RefCell, RefMut};

use serde_json::Value;

use crate::fields::{FieldMap, merge_values};

thread_local! {
    pub(crate) static CONTEXT_STACK: ContextStack = const { ContextStack::new() };
}

/// One level of the context stack: a snapshot of all fields accumulated by
/// the active scopes, innermost scope winning on collisions.
pub type ContextFrame = FieldMap;

/// A stack of context frames owned by a single thread.
///
/// Each thread gets its own stack through [`CONTEXT_STACK`], so no locking
/// is needed and no field ever leaks between threads. Spawned threads start
/// with an empty stack; use [`crate::FutureExt`] to carry a context across
/// task boundaries.
#[derive(Debug)]
pub struct ContextStack {
    inner: RefCell<Vec<ContextFrame>>,
}

impl ContextStack {
    pub const fn new() -> Self {
        ContextStack {
            inner: RefCell::new(Vec::new()),
        }
    }

    /// Pushes a scope's fields, returning a copy of the resulting frame.
    ///
    /// The new frame is the current top merged with `fields`, `fields`
    /// winning on collisions. Fields of outer scopes not overwritten are
    /// carried forward, so the top of the stack always reflects the union
    /// of every active scope.
    pub fn push(&self, fields: FieldMap) -> ContextFrame {
        let mut inner = self.inner.borrow_mut();
        let frame = match inner.last() {
            Some(top) => {
                match merge_values(
                    Some(&Value::Object(fields)),
                    Some(&Value::Object(top.clone())),
                ) {
                    Value::Object(merged) => merged,
                    // merge_values over two maps always yields a map.
                    _ => FieldMap::new(),
                }
            }
            None => fields,
        };
        inner.push(frame.clone());
        frame
    }

    /// Pushes a prebuilt frame without merging. Used to re-install a
    /// snapshot taken by a previous [`pop`](Self::pop).
    pub fn push_frame(&self, frame: ContextFrame) {
        self.inner.borrow_mut().push(frame);
    }

    /// Removes and returns the top frame.
    ///
    /// Popping the empty stack is a no-op that returns an empty frame; it
    /// never panics and never leaves the stack in a corrupt state.
    pub fn pop(&self) -> ContextFrame {
        self.inner.borrow_mut().pop().unwrap_or_default()
    }

    /// A copy of the top frame, or an empty frame when no scope is active.
    /// Mutating the returned map does not affect the stack.
    pub fn current(&self) -> ContextFrame {
        self.inner.borrow().last().cloned().unwrap_or_default()
    }

    pub fn top_mut(&self) -> Option<RefMut<'_, ContextFrame>> {
        let inner = self.inner.borrow_mut();
        if inner.is_empty() {
            None
        } else {
            Some(RefMut::map(inner, |inner| {
                inner.last_mut().expect("stack checked non-empty")
            }))
        }
    }
}

impl Default for ContextStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a copy of the fields visible to log statements on this thread.
///
/// During thread teardown the stack may already be destroyed; a log call
/// from another thread-local's destructor then sees an empty context
/// instead of panicking.
pub fn current_logging_context() -> FieldMap {
    CONTEXT_STACK
        .try_with(ContextStack::current)
        .unwrap_or_default()
}

#[cfg(test)]
impl ContextStack {
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn fields(value: serde_json::Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn test_push_merges_with_parent() {
        let stack = ContextStack::new();
        stack.push(fields(json!({"foo": "bar", "keep": 1})));
        let top = stack.push(fields(json!({"foo": "baz"})));

        assert_eq!(top, fields(json!({"keep": 1, "foo": "baz"})));
        assert_eq!(stack.current(), fields(json!({"keep": 1, "foo": "baz"})));

        assert_eq!(stack.pop(), fields(json!({"keep": 1, "foo": "baz"})));
        // The parent frame comes back exactly as it was.
        assert_eq!(stack.current(), fields(json!({"foo": "bar", "keep": 1})));
    }

    #[test]
    fn test_pop_on_empty_stack_is_noop() {
        let stack = ContextStack::new();
        assert_eq!(stack.current(), FieldMap::new());
        assert_eq!(stack.pop(), FieldMap::new());
        assert_eq!(stack.current(), FieldMap::new());

        stack.push(fields(json!({"foo": "bar"})));
        stack.push(fields(json!({"foo": "baz"})));
        stack.pop();
        stack.pop();
        assert_eq!(stack.current(), FieldMap::new());
        // Extra pops shouldn't panic.
        assert_eq!(stack.pop(), FieldMap::new());
    }

    #[test]
    fn test_current_returns_a_copy() {
        let stack = ContextStack::new();
        stack.push(fields(json!({"foo": "bar"})));

        let mut copy = stack.current();
        copy.insert("sneaky".to_owned(), json!(true));
        assert_eq!(stack.current(), fields(json!({"foo": "bar"})));
    }

    #[test]
    fn test_context_usable_during_tls_teardown() {
        struct LogsOnDrop;

        impl Drop for LogsOnDrop {
            fn drop(&mut self) {
                // Destructor ordering is unspecified, so the stack may
                // already be destroyed here. Neither call may panic.
                let _ = current_logging_context();
                drop(crate::LogContext::new().record("late", true).enter());
            }
        }

        thread_local! {
            static LATE: RefCell<Option<LogsOnDrop>> = const { RefCell::new(None) };
        }

        let handle = std::thread::spawn(|| {
            LATE.with(|slot| *slot.borrow_mut() = Some(LogsOnDrop));
        });
        handle.join().expect("thread teardown must not panic");
    }

    #[test]
    fn test_inner_map_fields_deep_merge() {
        let stack = ContextStack::new();
        stack.push(fields(json!({"http": {"method": "GET", "path": "/"}})));
        stack.push(fields(json!({"http": {"status": 200}})));

        assert_eq!(
            stack.current(),
            fields(json!({"http": {"method": "GET", "path": "/", "status": 200}}))
        );
    }
}
