//! Lexical scope chain.
//!
//! An [`Environment`] is a reference-counted handle to one frame. Frames link
//! to their parent; child frames are cheap and nothing ever copies the
//! chain. Spawned tasks share frames with the code that launched them, so
//! each frame guards its state with its own `parking_lot` locks. Single
//! operations are atomic; sequences of them (read, compute, write) are not.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use yolk_ir::Span;
use yolk_types::Idx;

use crate::interpreter::CallTarget;
use crate::value::{FunctionValue, Value};

/// Lifetime of a binding that never expires.
pub const NO_LIFETIME: i64 = -1;

/// Failure to declare a binding.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DefineError {
    #[error("{name} redeclared in this scope")]
    AlreadyDefined { name: String },
}

/// Failure to assign to an existing binding.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssignError {
    #[error("undefined variable: {name}")]
    Undefined { name: String },
    #[error("cannot assign to constant {name}")]
    Constant { name: String },
}

/// What owns a frame. Defers attach to the nearest `Call` or `Root` frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Root,
    Block,
    /// Function call body or spawned block.
    Call,
}

/// A call registered by `defer`, already resolved and with arguments evaluated.
#[derive(Clone, Debug)]
pub struct DeferredCall {
    pub target: CallTarget,
    pub args: Vec<Value>,
    pub span: Span,
}

#[derive(Clone, Debug)]
struct Binding {
    value: Value,
    /// Remaining statement ticks, or `NO_LIFETIME`.
    lifetime: i64,
    /// Set until the declaring statement has completed.
    fresh: bool,
    /// Annotated type; assignments check against it instead of the value's.
    declared: Option<Idx>,
}

struct Frame {
    store: RwLock<FxHashMap<String, Binding>>,
    methods: RwLock<FxHashMap<(Idx, String), FunctionValue>>,
    defers: Mutex<Vec<DeferredCall>>,
    parent: Option<Environment>,
    kind: FrameKind,
}

/// Handle to a frame of the scope chain.
#[derive(Clone)]
pub struct Environment(Arc<Frame>);

impl Environment {
    /// A fresh root frame for one program run.
    pub fn root() -> Self {
        Self::with_parent(None, FrameKind::Root)
    }

    fn with_parent(parent: Option<Environment>, kind: FrameKind) -> Self {
        Environment(Arc::new(Frame {
            store: RwLock::new(FxHashMap::default()),
            methods: RwLock::new(FxHashMap::default()),
            defers: Mutex::new(Vec::new()),
            parent,
            kind,
        }))
    }

    /// Child frame for a block body or loop iteration.
    #[must_use]
    pub fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()), FrameKind::Block)
    }

    /// Child frame owning its own defers (call body, spawned block).
    #[must_use]
    pub fn call_frame(&self) -> Self {
        Self::with_parent(Some(self.clone()), FrameKind::Call)
    }

    pub fn kind(&self) -> FrameKind {
        self.0.kind
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.0.parent.as_ref()
    }

    /// Look a name up through the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.get_typed(name).map(|(value, _)| value)
    }

    /// Value and declared type of the nearest binding of `name`.
    pub fn get_typed(&self, name: &str) -> Option<(Value, Option<Idx>)> {
        let mut frame = Some(self);
        while let Some(env) = frame {
            if let Some(binding) = env.0.store.read().get(name) {
                return Some((binding.value.clone(), binding.declared));
            }
            frame = env.parent();
        }
        None
    }

    /// Whether this frame (not its parents) binds `name`.
    pub fn has_local(&self, name: &str) -> bool {
        self.0.store.read().contains_key(name)
    }

    pub fn define(&self, name: &str, value: Value) -> Result<(), DefineError> {
        self.define_with_lifetime(name, value, NO_LIFETIME)
    }

    /// Declare in this frame with a tick counter.
    pub fn define_with_lifetime(
        &self,
        name: &str,
        value: Value,
        lifetime: i64,
    ) -> Result<(), DefineError> {
        self.define_typed(name, value, None, lifetime)
    }

    /// Declare with an annotated type that later assignments must satisfy.
    pub fn define_typed(
        &self,
        name: &str,
        value: Value,
        declared: Option<Idx>,
        lifetime: i64,
    ) -> Result<(), DefineError> {
        let mut store = self.0.store.write();
        if store.contains_key(name) {
            return Err(DefineError::AlreadyDefined {
                name: name.to_string(),
            });
        }
        store.insert(
            name.to_string(),
            Binding {
                value,
                lifetime,
                fresh: true,
                declared,
            },
        );
        Ok(())
    }

    /// Overwrite the nearest binding of `name`. Never declares.
    pub fn set(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let mut frame = Some(self);
        while let Some(env) = frame {
            let mut store = env.0.store.write();
            if let Some(binding) = store.get_mut(name) {
                if matches!(binding.value, Value::Const(_)) {
                    return Err(AssignError::Constant {
                        name: name.to_string(),
                    });
                }
                binding.value = value;
                return Ok(());
            }
            drop(store);
            frame = env.parent();
        }
        Err(AssignError::Undefined {
            name: name.to_string(),
        })
    }

    /// Count down lifetimes after a completed statement of this frame.
    ///
    /// A binding's own declaring statement does not count.
    pub fn tick_lifetimes(&self) {
        let mut store = self.0.store.write();
        store.retain(|_, binding| {
            if binding.lifetime <= 0 {
                return true;
            }
            if binding.fresh {
                binding.fresh = false;
                return true;
            }
            binding.lifetime -= 1;
            binding.lifetime > 0
        });
    }

    pub fn set_method(&self, ty: Idx, name: &str, func: FunctionValue) {
        self.0.methods.write().insert((ty, name.to_string()), func);
    }

    /// Find a method for `ty`, searching up the chain.
    pub fn get_method(&self, ty: Idx, name: &str) -> Option<FunctionValue> {
        let key = (ty, name.to_string());
        let mut frame = Some(self);
        while let Some(env) = frame {
            if let Some(func) = env.0.methods.read().get(&key) {
                return Some(func.clone());
            }
            frame = env.parent();
        }
        None
    }

    /// Register a deferred call on the nearest call (or root) frame.
    pub fn add_defer(&self, call: DeferredCall) {
        let mut frame = self;
        while frame.kind() == FrameKind::Block {
            match frame.parent() {
                Some(parent) => frame = parent,
                None => break,
            }
        }
        frame.0.defers.lock().push(call);
    }

    /// Drain this frame's defers in execution (LIFO) order.
    pub fn take_defers(&self) -> Vec<DeferredCall> {
        let mut defers = std::mem::take(&mut *self.0.defers.lock());
        defers.reverse();
        defers
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.0.store.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("kind", &self.0.kind)
            .field("names", &names)
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
