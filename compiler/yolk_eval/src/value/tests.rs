use pretty_assertions::assert_eq;
use rustc_hash::FxHashMap;
use yolk_types::{Idx, TypeRegistry};

use super::*;

fn int_array(types: &mut TypeRegistry, items: &[i64]) -> Value {
    let ty = types.array(Idx::INT);
    Value::array(items.iter().copied().map(Value::Int).collect(), ty)
}

#[test]
fn test_display_scalars() {
    assert_eq!(Value::Bool(true).to_string(), "yes");
    assert_eq!(Value::Bool(false).to_string(), "no");
    assert_eq!(Value::Nil.to_string(), "nil");
    assert_eq!(Value::Float(2.5).to_string(), "2.5");
    assert_eq!(Value::Uninitialized.to_string(), "<uninitialized>");
    assert_eq!(Value::error("boom").to_string(), "boom");
    assert_eq!(Value::Int(7).erase().to_string(), "7");
}

#[test]
fn test_display_composites() {
    let mut types = TypeRegistry::new();
    assert_eq!(int_array(&mut types, &[1, 2]).to_string(), "[1, 2]");
    assert_eq!(
        Value::Tuple(vec![Value::Int(1), Value::string("a")]).to_string(),
        "(1, a)"
    );

    let map_ty = types.map(Idx::STR, Idx::INT).unwrap();
    let mut entries = FxHashMap::default();
    for (k, v) in [("b", 2), ("a", 1), ("c", 3)] {
        entries.insert(MapKey::new(Value::string(k)).unwrap(), Value::Int(v));
    }
    assert_eq!(Value::map(entries, map_ty).to_string(), "{a: 1, b: 2, c: 3}");

    let point = types
        .declare_struct("Point", vec![("x".into(), Idx::INT), ("y".into(), Idx::INT)])
        .unwrap();
    let p = Value::structure(
        Some("Point".into()),
        vec![("x".into(), Value::Int(1)), ("y".into(), Value::Int(2))],
        point,
    );
    assert_eq!(p.to_string(), "Point{x: 1, y: 2}");
}

#[test]
fn test_equality_rules() {
    assert!(values_equal(&Value::Int(2), &Value::Float(2.0)).unwrap());
    assert!(!values_equal(&Value::string("a"), &Value::string("b")).unwrap());
    assert!(values_equal(&Value::error("x"), &Value::error("x")).unwrap());
    assert!(values_equal(&Value::Nil, &Value::Nil).unwrap());

    let mut types = TypeRegistry::new();
    let a = int_array(&mut types, &[1]);
    let b = int_array(&mut types, &[1]);
    assert!(values_equal(&a, &b).is_err());
}

#[test]
fn test_structs_compare_deeply() {
    let mut types = TypeRegistry::new();
    let point = types
        .declare_struct("Point", vec![("x".into(), Idx::INT)])
        .unwrap();
    let make = |x| Value::structure(Some("Point".into()), vec![("x".into(), Value::Int(x))], point);
    assert!(values_equal(&make(1), &make(1)).unwrap());
    assert!(!values_equal(&make(1), &make(2)).unwrap());
}

#[test]
fn test_map_key_rejects_arrays() {
    let mut types = TypeRegistry::new();
    assert!(MapKey::new(int_array(&mut types, &[1])).is_err());
    assert!(MapKey::new(Value::Int(1)).is_ok());
}

#[test]
fn test_erase_does_not_nest() {
    let erased = Value::Int(1).erase().erase();
    assert!(matches!(erased.as_erased(), Some(Value::Int(1))));
    assert!(matches!(erased.unerase(), Value::Int(1)));
    assert_eq!(Value::Int(1).erase().type_of(), Idx::ANY);
}

#[test]
fn test_const_is_transparent() {
    let c = Value::Const(Box::new(Value::Int(3)));
    assert_eq!(c.type_of(), Idx::INT);
    assert_eq!(c.kind_name(), "int");
    assert!(matches!(c.unconst(), Value::Int(3)));
}

#[test]
fn test_arrays_share_cells() {
    let mut types = TypeRegistry::new();
    let a = int_array(&mut types, &[1]);
    let b = a.clone();
    let Value::Array(cell) = &a else { unreachable!() };
    cell.write().unwrap().push(Value::Int(2));
    assert_eq!(b.to_string(), "[1, 2]");
}

#[test]
fn test_frozen_copy_is_deep_and_detached() {
    let mut types = TypeRegistry::new();
    let inner = int_array(&mut types, &[1]);
    let inner_ty = types.array(Idx::INT);
    let outer_ty = types.array(inner_ty);
    let outer = Value::array(vec![inner.clone()], outer_ty);
    let frozen = outer.frozen_copy();

    let Value::Array(frozen_outer) = &frozen else { unreachable!() };
    assert!(frozen_outer.write().is_err());
    let Some(Value::Array(frozen_inner)) = frozen_outer.get(0) else { unreachable!() };
    assert!(frozen_inner.write().is_err());

    // The original stays mutable and unaffected.
    let Value::Array(original) = &inner else { unreachable!() };
    original.write().unwrap().push(Value::Int(2));
    assert_eq!(frozen.to_string(), "[[1]]");
}

#[test]
fn test_contains_cell_looks_through_wrappers() {
    let mut types = TypeRegistry::new();
    let inner = int_array(&mut types, &[1]);
    let Value::Array(inner_cell) = &inner else { unreachable!() };
    let id = inner_cell.id();

    assert!(inner.contains_cell(id));
    let things = types.array(Idx::ANY);
    let outer = Value::array(vec![Value::Int(0), inner.clone().erase()], things);
    assert!(outer.contains_cell(id));
    let fields = vec![(Arc::from("items"), Value::Tuple(vec![outer.clone()]))];
    assert!(Value::structure(None, fields, Idx::ANY).contains_cell(id));

    let copy = int_array(&mut types, &[1]);
    assert!(!copy.contains_cell(id));
    let Value::Array(outer_cell) = &outer else { unreachable!() };
    assert!(!inner.contains_cell(outer_cell.id()));
}

#[test]
fn test_type_name_uses_registry() {
    let mut types = TypeRegistry::new();
    let xs = int_array(&mut types, &[]);
    assert_eq!(xs.type_name(&types), "[]int");
    assert_eq!(Value::Tuple(vec![]).type_name(&types), "tuple");
    assert_eq!(Value::Int(1).erase().type_name(&types), "thing");
}
