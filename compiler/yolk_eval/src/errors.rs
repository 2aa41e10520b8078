//! Hard runtime errors.
//!
//! Two failure channels exist at runtime:
//!
//! - **Raised error values** ([`Value::Error`](crate::Value::Error)) are
//!   ordinary values that also stop the enclosing block. Most runtime
//!   failures (bad index, failed conversion, type mismatch on assignment)
//!   take this path.
//! - **Hard errors** ([`EvalError`]) abort evaluation through `Result`. They
//!   are reserved for structurally impossible programs: missing conditions,
//!   unresolved types, builtin arity mismatches, non-bool conditions.
//!
//! Factory functions below are the public way to build hard errors; they
//! fill both `kind` and `message`.

use std::fmt;

use yolk_ir::Span;
use yolk_types::TypeError;

use crate::environment::{AssignError, DefineError};
use crate::value::ErrorValue;

/// Typed category of a hard error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    #[error("wrong number of arguments to {name}: want {expected}, got {got}")]
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("missing condition in {construct} statement")]
    MissingCondition { construct: &'static str },

    #[error("non-bool {got} used as {construct} condition")]
    NonBoolCondition { construct: &'static str, got: String },

    #[error("operator {op} requires bool operands, got {got}")]
    NonBoolOperand { op: &'static str, got: String },

    #[error("missing initializer for constant {name}")]
    ConstWithoutInitializer { name: String },

    #[error("invalid type assertion: {got} is not a thing")]
    InvalidTypeAssertion { got: String },

    #[error("invalid range: {reason}")]
    InvalidRangeForm { reason: String },

    #[error("{keyword} is not in a loop")]
    BreakOutsideLoop { keyword: &'static str },

    #[error("maximum recursion depth exceeded (limit: {depth})")]
    RecursionLimit { depth: usize },

    /// An error value reached the top of the program.
    #[error("{message}")]
    Uncaught { message: String },

    #[error(transparent)]
    Define(#[from] DefineError),

    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error("{message}")]
    Custom { message: String },
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    pub name: String,
    /// Call site of this frame.
    pub span: Option<Span>,
}

/// Snapshot of the call stack at an error site.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span {
                write!(f, " at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A hard runtime error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Equals `kind.to_string()` unless extended by a failing defer.
    pub message: String,
    pub span: Option<Span>,
    pub backtrace: Option<EvalBacktrace>,
}

impl EvalError {
    /// Uncategorized error.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
            span: None,
            backtrace: None,
        }
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            span: None,
            backtrace: None,
        }
    }

    /// Attach a position unless one is already recorded.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() && !span.is_dummy() {
            self.span = Some(span);
        }
        self
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        if self.backtrace.is_none() && !backtrace.is_empty() {
            self.backtrace = Some(backtrace);
        }
        self
    }

    /// Extend the message with a failure that happened while unwinding.
    #[must_use]
    pub fn with_context(mut self, extra: &str) -> Self {
        self.message = format!("{}; {extra}", self.message);
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{span}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<TypeError> for EvalError {
    fn from(err: TypeError) -> Self {
        EvalError::from_kind(EvalErrorKind::Type(err))
    }
}

impl From<DefineError> for EvalError {
    fn from(err: DefineError) -> Self {
        EvalError::from_kind(EvalErrorKind::Define(err))
    }
}

impl From<AssignError> for EvalError {
    fn from(err: AssignError) -> Self {
        EvalError::from_kind(EvalErrorKind::Assign(err))
    }
}

// Calls

#[cold]
pub fn arity_mismatch(name: &str, expected: impl fmt::Display, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        got,
    })
}

#[cold]
pub fn recursion_limit_exceeded(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::RecursionLimit { depth })
}

// Control flow

#[cold]
pub fn missing_condition(construct: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingCondition { construct })
}

#[cold]
pub fn non_bool_condition(construct: &'static str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NonBoolCondition {
        construct,
        got: got.to_string(),
    })
}

#[cold]
pub fn non_bool_operand(op: &'static str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NonBoolOperand {
        op,
        got: got.to_string(),
    })
}

#[cold]
pub fn break_outside_loop(keyword: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::BreakOutsideLoop { keyword })
}

#[cold]
pub fn invalid_range_form(reason: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidRangeForm {
        reason: reason.to_string(),
    })
}

// Declarations and types

#[cold]
pub fn const_without_initializer(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ConstWithoutInitializer {
        name: name.to_string(),
    })
}

#[cold]
pub fn invalid_type_assertion(got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidTypeAssertion {
        got: got.to_string(),
    })
}

/// An error value escaped the program.
#[cold]
pub fn uncaught(error: &ErrorValue) -> EvalError {
    let err = EvalError::from_kind(EvalErrorKind::Uncaught {
        message: error.message.to_string(),
    });
    match error.span {
        Some(span) => err.with_span(span),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_factory_sets_message_from_kind() {
        let err = arity_mismatch("len", 1, 2);
        assert_eq!(err.message, "wrong number of arguments to len: want 1, got 2");
        assert!(matches!(err.kind, EvalErrorKind::ArityMismatch { got: 2, .. }));
    }

    #[test]
    fn test_display_includes_position() {
        let err = missing_condition("if").with_span(Span::new(3, 7));
        assert_eq!(err.to_string(), "3:7: missing condition in if statement");
        // The first recorded position wins.
        let err = err.with_span(Span::new(9, 9));
        assert_eq!(err.span, Some(Span::new(3, 7)));
    }

    #[test]
    fn test_uncaught_keeps_error_position() {
        let value = ErrorValue::new("boom").at(Span::new(2, 1));
        let err = uncaught(&value);
        assert_eq!(err.to_string(), "2:1: boom");
    }

    #[test]
    fn test_type_error_converts() {
        let err: EvalError = TypeError::Unresolved {
            name: "Foo".to_string(),
        }
        .into();
        assert_eq!(err.message, "undefined type: Foo");
    }

    #[test]
    fn test_backtrace_display() {
        let bt = EvalBacktrace::new(vec![BacktraceFrame {
            name: "fib".to_string(),
            span: Some(Span::new(4, 2)),
        }]);
        assert_eq!(bt.to_string(), "stack backtrace:\n  0: fib at 4:2\n");
    }
}
