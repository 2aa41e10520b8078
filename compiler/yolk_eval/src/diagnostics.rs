//! Call stack tracking.
//!
//! Every user function call pushes a [`CallFrame`]; the depth check lives in
//! [`CallStack::push`]. When a hard error unwinds through a call, the live
//! frames are snapshotted into an [`EvalBacktrace`].

use yolk_ir::Span;

use crate::errors::{recursion_limit_exceeded, BacktraceFrame, EvalBacktrace, EvalError};

/// Backtraces keep only the innermost frames.
const MAX_BACKTRACE_FRAMES: usize = 32;

#[derive(Clone, Debug)]
pub struct CallFrame {
    pub name: String,
    /// Where the call was made, not where the function was defined.
    pub call_span: Span,
}

/// Live call stack of one task.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame. The frame is not pushed when the limit is hit.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(recursion_limit_exceeded(max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(!self.frames.is_empty(), "CallStack::pop on empty stack");
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Snapshot, innermost call first, truncated to `MAX_BACKTRACE_FRAMES`.
    pub fn capture(&self) -> EvalBacktrace {
        EvalBacktrace::new(
            self.frames
                .iter()
                .rev()
                .take(MAX_BACKTRACE_FRAMES)
                .map(|frame| BacktraceFrame {
                    name: frame.name.clone(),
                    span: (!frame.call_span.is_dummy()).then_some(frame.call_span),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(name: &str) -> CallFrame {
        CallFrame {
            name: name.to_string(),
            call_span: Span::new(1, 1),
        }
    }

    #[test]
    fn test_push_respects_limit() {
        let mut stack = CallStack::new(Some(2));
        assert!(stack.push(frame("a")).is_ok());
        assert!(stack.push(frame("b")).is_ok());
        let err = stack.push(frame("c")).unwrap_err();
        assert_eq!(err.message, "maximum recursion depth exceeded (limit: 2)");
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_capture_is_innermost_first() {
        let mut stack = CallStack::new(None);
        stack.push(frame("outer")).unwrap();
        stack.push(frame("inner")).unwrap();
        let names: Vec<_> = stack
            .capture()
            .frames()
            .iter()
            .map(|f| f.name.clone())
            .collect();
        assert_eq!(names, vec!["inner".to_string(), "outer".to_string()]);
    }

    #[test]
    fn test_capture_is_truncated() {
        let mut stack = CallStack::new(None);
        for _ in 0..100 {
            stack.push(frame("f")).unwrap();
        }
        assert_eq!(stack.capture().len(), MAX_BACKTRACE_FRAMES);
    }
}
