//! Shared reference cells backing arrays, maps and structs.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};
use rustc_hash::FxHashMap;
use yolk_types::Idx;

use super::{MapKey, Value};

/// Mutation attempted through a constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot modify a constant")]
pub struct FrozenCell;

/// Identity of an array, map or struct cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellId(*const ());

/// Storing a collection somewhere it already reaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot store a value inside itself")]
pub struct CyclicStore;

#[derive(Debug)]
struct Cell<T> {
    data: RwLock<T>,
    frozen: bool,
}

impl<T> Cell<T> {
    fn new(data: T, frozen: bool) -> Arc<Self> {
        Arc::new(Cell {
            data: RwLock::new(data),
            frozen,
        })
    }

    fn id(self: &Arc<Self>) -> CellId {
        CellId(Arc::as_ptr(self).cast())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, T>, FrozenCell> {
        if self.frozen {
            return Err(FrozenCell);
        }
        Ok(self.data.write())
    }
}

/// Array handle. `ty` is the array type (`[]T`), not the element type.
#[derive(Clone, Debug)]
pub struct ArrayValue {
    cell: Arc<Cell<Vec<Value>>>,
    pub ty: Idx,
}

impl ArrayValue {
    pub fn new(items: Vec<Value>, ty: Idx) -> Self {
        ArrayValue {
            cell: Cell::new(items, false),
            ty,
        }
    }

    pub fn len(&self) -> usize {
        self.cell.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell.data.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.cell.data.read().get(index).cloned()
    }

    /// Copy of the current elements (iteration must not hold the lock).
    pub fn snapshot(&self) -> Vec<Value> {
        self.cell.data.read().clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.cell.frozen
    }

    /// Same cell, different static type.
    #[must_use]
    pub fn with_type(&self, ty: Idx) -> Self {
        ArrayValue {
            cell: Arc::clone(&self.cell),
            ty,
        }
    }

    /// Whether both handles point at the same cell.
    pub fn same_cell(&self, other: &ArrayValue) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    pub fn id(&self) -> CellId {
        self.cell.id()
    }

    /// Shallow copy into a new cell of type `ty`. Keeps the frozen flag.
    #[must_use]
    pub fn retyped_copy(&self, ty: Idx) -> Self {
        ArrayValue {
            cell: Cell::new(self.snapshot(), self.cell.frozen),
            ty,
        }
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Value>>, FrozenCell> {
        self.cell.write()
    }

    pub(super) fn frozen_copy(&self) -> Self {
        let items = self.snapshot().iter().map(Value::frozen_copy).collect();
        ArrayValue {
            cell: Cell::new(items, true),
            ty: self.ty,
        }
    }
}

/// Map handle. Iteration order is unspecified.
#[derive(Clone, Debug)]
pub struct MapValue {
    cell: Arc<Cell<FxHashMap<MapKey, Value>>>,
    pub ty: Idx,
}

impl MapValue {
    pub fn new(entries: FxHashMap<MapKey, Value>, ty: Idx) -> Self {
        MapValue {
            cell: Cell::new(entries, false),
            ty,
        }
    }

    pub fn len(&self) -> usize {
        self.cell.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell.data.read().is_empty()
    }

    pub fn get(&self, key: &MapKey) -> Option<Value> {
        self.cell.data.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.cell.data.read().contains_key(key)
    }

    pub fn entries(&self) -> Vec<(MapKey, Value)> {
        self.cell
            .data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Entries ordered by the rendered form of their keys.
    pub fn sorted_entries(&self) -> Vec<(MapKey, Value)> {
        let mut entries = self.entries();
        entries.sort_by_cached_key(|(k, _)| k.value().to_string());
        entries
    }

    pub fn is_frozen(&self) -> bool {
        self.cell.frozen
    }

    pub fn id(&self) -> CellId {
        self.cell.id()
    }

    #[must_use]
    pub fn with_type(&self, ty: Idx) -> Self {
        MapValue {
            cell: Arc::clone(&self.cell),
            ty,
        }
    }

    /// Shallow copy into a new cell of type `ty`. Keeps the frozen flag.
    #[must_use]
    pub fn retyped_copy(&self, ty: Idx) -> Self {
        MapValue {
            cell: Cell::new(self.cell.data.read().clone(), self.cell.frozen),
            ty,
        }
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, FxHashMap<MapKey, Value>>, FrozenCell> {
        self.cell.write()
    }

    pub(super) fn frozen_copy(&self) -> Self {
        let entries = self
            .entries()
            .into_iter()
            .map(|(k, v)| (k, v.frozen_copy()))
            .collect();
        MapValue {
            cell: Cell::new(entries, true),
            ty: self.ty,
        }
    }
}

/// Struct handle. Fields keep declaration order.
#[derive(Clone, Debug)]
pub struct StructValue {
    /// Declared type name, `None` for anonymous structs.
    pub name: Option<Arc<str>>,
    cell: Arc<Cell<Vec<(Arc<str>, Value)>>>,
    pub ty: Idx,
}

impl StructValue {
    pub fn new(name: Option<Arc<str>>, fields: Vec<(Arc<str>, Value)>, ty: Idx) -> Self {
        StructValue {
            name,
            cell: Cell::new(fields, false),
            ty,
        }
    }

    pub fn get_field(&self, field: &str) -> Option<Value> {
        self.cell
            .data
            .read()
            .iter()
            .find(|(name, _)| &**name == field)
            .map(|(_, value)| value.clone())
    }

    /// Overwrite an existing field. `Ok(false)` if there is no such field.
    pub fn set_field(&self, field: &str, value: Value) -> Result<bool, FrozenCell> {
        let mut fields = self.cell.write()?;
        match fields.iter_mut().find(|(name, _)| &**name == field) {
            Some(slot) => {
                slot.1 = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn fields(&self) -> Vec<(Arc<str>, Value)> {
        self.cell.data.read().clone()
    }

    pub fn id(&self) -> CellId {
        self.cell.id()
    }

    pub fn is_frozen(&self) -> bool {
        self.cell.frozen
    }

    pub(super) fn frozen_copy(&self) -> Self {
        let fields = self
            .fields()
            .into_iter()
            .map(|(name, value)| (name, value.frozen_copy()))
            .collect();
        StructValue {
            name: self.name.clone(),
            cell: Cell::new(fields, true),
            ty: self.ty,
        }
    }
}
