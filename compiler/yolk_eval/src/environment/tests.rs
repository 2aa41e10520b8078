use super::*;
use pretty_assertions::assert_eq;

fn int(v: &Option<Value>) -> Option<i64> {
    match v {
        Some(Value::Int(n)) => Some(*n),
        _ => None,
    }
}

#[test]
fn test_get_walks_parent_chain() {
    let root = Environment::root();
    root.define("x", Value::Int(1)).unwrap();
    let child = root.child().child();
    assert_eq!(int(&child.get("x")), Some(1));
    assert!(child.get("y").is_none());
}

#[test]
fn test_redeclare_in_same_frame_fails() {
    let env = Environment::root();
    env.define("x", Value::Int(1)).unwrap();
    assert_eq!(
        env.define("x", Value::Int(2)),
        Err(DefineError::AlreadyDefined {
            name: "x".to_string()
        })
    );
}

#[test]
fn test_shadowing_across_frames_is_allowed() {
    let root = Environment::root();
    root.define("x", Value::Int(1)).unwrap();
    let child = root.child();
    child.define("x", Value::Int(2)).unwrap();
    assert_eq!(int(&child.get("x")), Some(2));
    assert_eq!(int(&root.get("x")), Some(1));
}

#[test]
fn test_set_updates_nearest_binding() {
    let root = Environment::root();
    root.define("x", Value::Int(1)).unwrap();
    let child = root.child();
    child.set("x", Value::Int(5)).unwrap();
    assert_eq!(int(&root.get("x")), Some(5));
    assert!(!child.has_local("x"));
}

#[test]
fn test_set_never_declares() {
    let env = Environment::root();
    assert_eq!(
        env.set("ghost", Value::Nil),
        Err(AssignError::Undefined {
            name: "ghost".to_string()
        })
    );
    assert!(env.get("ghost").is_none());
}

#[test]
fn test_set_rejects_constants() {
    let env = Environment::root();
    env.define("k", Value::Const(Box::new(Value::Int(1)))).unwrap();
    assert!(matches!(
        env.set("k", Value::Int(2)),
        Err(AssignError::Constant { .. })
    ));
}

#[test]
fn test_declared_type_is_kept_per_binding() {
    let root = Environment::root();
    root.define_typed("e", Value::Nil, Some(Idx::ERROR), NO_LIFETIME).unwrap();
    root.define("x", Value::Nil).unwrap();
    let child = root.child();
    assert!(matches!(child.get_typed("e"), Some((Value::Nil, Some(Idx::ERROR)))));
    assert!(matches!(child.get_typed("x"), Some((Value::Nil, None))));

    // Overwriting the value keeps the annotation.
    child.set("e", Value::error("bad")).unwrap();
    assert!(matches!(root.get_typed("e"), Some((Value::Error(_), Some(Idx::ERROR)))));
    assert!(child.get_typed("ghost").is_none());
}

#[test]
fn test_lifetime_counts_following_statements() {
    let env = Environment::root();
    env.define_with_lifetime("x", Value::Int(1), 2).unwrap();
    // Completion of the declaring statement.
    env.tick_lifetimes();
    assert!(env.get("x").is_some());
    // First further statement.
    env.tick_lifetimes();
    assert!(env.get("x").is_some());
    // Second further statement.
    env.tick_lifetimes();
    assert!(env.get("x").is_none());
}

#[test]
fn test_unlimited_lifetime_never_expires() {
    let env = Environment::root();
    env.define("x", Value::Int(1)).unwrap();
    for _ in 0..10 {
        env.tick_lifetimes();
    }
    assert!(env.get("x").is_some());
}

#[test]
fn test_ticks_only_touch_own_frame() {
    let root = Environment::root();
    root.define_with_lifetime("x", Value::Int(1), 1).unwrap();
    root.tick_lifetimes();
    let child = root.child();
    child.tick_lifetimes();
    child.tick_lifetimes();
    assert!(root.get("x").is_some());
}

#[test]
fn test_methods_resolve_through_chain() {
    let root = Environment::root();
    let func = FunctionValue {
        decl: Arc::new(yolk_ir::FunctionDecl::new("norm")),
        captured: root.clone(),
        ty: Idx::ANY,
        receiver: Some("p".into()),
    };
    let ty = Idx::from_raw(20);
    root.set_method(ty, "norm", func);
    let child = root.child();
    assert!(child.get_method(ty, "norm").is_some());
    assert!(child.get_method(Idx::from_raw(21), "norm").is_none());
}

#[test]
fn test_defers_attach_to_call_frame_in_lifo_order() {
    let root = Environment::root();
    let call = root.call_frame();
    let block = call.child();
    for i in 0..3 {
        block.add_defer(DeferredCall {
            target: CallTarget::Builtin("println".to_string()),
            args: vec![Value::Int(i)],
            span: Span::DUMMY,
        });
    }
    assert!(block.take_defers().is_empty());
    let order: Vec<i64> = call
        .take_defers()
        .iter()
        .map(|d| match d.args[0] {
            Value::Int(n) => n,
            _ => -1,
        })
        .collect();
    assert_eq!(order, vec![2, 1, 0]);
    assert!(root.take_defers().is_empty());
}
