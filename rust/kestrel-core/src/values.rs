//! Tagged value representation.
//!
//! `Value` is a closed sum over seven kinds. Immediate kinds (`None`, `Number`)
//! are copied; heap kinds are shared handles, so cloning a `Value` aliases the
//! same list, mapping, function or data object. Strings are immutable and
//! share their buffers.

use std::any::Any;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use strum::{Display, IntoStaticStr};

use crate::compare::values_equal;
use crate::error::ObjResult;
use crate::host::Host;
use crate::strings::Str;
use crate::table::Table;

/// Primary kind discriminant. The numeric order defines cross-kind `cmp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum TypeTag {
    None = 0,
    Number = 1,
    String = 2,
    List = 3,
    Map = 4,
    Function = 5,
    Data = 6,
}

/// Mapping subkind. Fixed per handle; decides which attribute-protocol branch
/// `get`/`set` take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum MapKind {
    /// Plain dictionary; the meta link is never consulted.
    Raw,
    /// Dictionary whose meta link is consulted by attribute lookups.
    Class,
    /// Instance: chain lookups rebind inherited functions to the instance.
    Object,
    /// Class object that constructs instances through `__new__` when called.
    Interface,
}

impl MapKind {
    pub fn chases_meta(self) -> bool {
        self != MapKind::Raw
    }

    pub fn binds_methods(self) -> bool {
        self == MapKind::Object
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum FuncKind {
    Native,
    Compiled,
}

/// Runtime value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Number(f64),
    String(Str),
    /// Ordered, mutable, 0-indexed sequence.
    List(List),
    Map(MapRef),
    Function(Function),
    /// Opaque host object compared by identity.
    Data(Data),
}

impl Value {
    pub fn none() -> Self {
        Value::None
    }

    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    pub fn from_bool(b: bool) -> Self {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    pub fn string_from_str(s: &str) -> Self {
        Value::String(Str::from(s))
    }

    pub fn string_from_bytes(bytes: &[u8]) -> Self {
        Value::String(Str::from_bytes(bytes))
    }

    pub fn string_from_const(s: &'static str) -> Self {
        Value::String(Str::from_const(s))
    }

    pub fn list_new() -> Self {
        Value::List(List::new())
    }

    pub fn list_from(items: Vec<Value>) -> Self {
        Value::List(List::from_vec(items))
    }

    /// A fresh RAW mapping.
    pub fn dict_new() -> Self {
        Value::Map(MapRef::new(MapKind::Raw))
    }

    pub fn dict_with_kind(kind: MapKind) -> Self {
        Value::Map(MapRef::new(kind))
    }

    pub fn function_from_native<F>(f: F) -> Self
    where
        F: Fn(&dyn Host, Vec<Value>) -> ObjResult<Value> + 'static,
    {
        Value::Function(Function::from_native(f))
    }

    pub fn function_from_code(code: Value, globals: Value) -> Self {
        Value::Function(Function::from_code(code, globals))
    }

    pub fn data<T: Any>(value: T) -> Self {
        Value::Data(Data::new(value))
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::None => TypeTag::None,
            Value::Number(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::List(_) => TypeTag::List,
            Value::Map(_) => TypeTag::Map,
            Value::Function(_) => TypeTag::Function,
            Value::Data(_) => TypeTag::Data,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_tag().into()
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&Str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&Data> {
        match self {
            Value::Data(d) => Some(d),
            _ => None,
        }
    }

    /// Truthiness: `0`, `None` and empty strings/lists/mappings are false.
    pub fn truth(&self) -> bool {
        match self {
            Value::None => false,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Function(_) | Value::Data(_) => true,
        }
    }

    /// Short description for error messages. Never runs user hooks.
    pub fn describe(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Value::Number(n) => format!("{}", n),
            Value::String(s) => format!("'{}'", s.to_string_lossy()),
            Value::List(l) => format!("<list len={}>", l.len()),
            Value::Map(m) => format!("<{} len={}>", m.kind(), m.len()),
            Value::Function(f) => format!("<func 0x{:x}>", f.addr()),
            Value::Data(d) => format!("<data 0x{:x}>", d.addr()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            // containers print shallowly: they may contain themselves
            Value::List(l) => write!(f, "List(len={}, 0x{:x})", l.len(), l.addr()),
            Value::Map(m) => write!(f, "Map({}, len={}, 0x{:x})", m.kind(), m.len(), m.addr()),
            Value::Function(func) => {
                write!(f, "Function({}, method={}, 0x{:x})", func.kind(), func.is_method(), func.addr())
            }
            Value::Data(d) => write!(f, "Data({}, 0x{:x})", d.label(), d.addr()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::from_bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string_from_str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Str::from(s))
    }
}

impl From<Str> for Value {
    fn from(s: Str) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list_from(items)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Value::List(l)
    }
}

impl From<MapRef> for Value {
    fn from(m: MapRef) -> Self {
        Value::Map(m)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

// ---------------------------------------------------------------------------
// Lists

/// Shared handle to a mutable sequence.
#[derive(Clone, Default)]
pub struct List(Rc<RefCell<Vec<Value>>>);

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        List(Rc::new(RefCell::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Replace the element at `index`; false when out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    /// Insert at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, value: Value) {
        let mut items = self.0.borrow_mut();
        let at = index.min(items.len());
        items.insert(at, value);
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut items = self.0.borrow_mut();
        if index < items.len() {
            Some(items.remove(index))
        } else {
            None
        }
    }

    pub fn extend(&self, values: Vec<Value>) {
        self.0.borrow_mut().extend(values);
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Shallow copy of the elements.
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn replace_all(&self, items: Vec<Value>) {
        *self.0.borrow_mut() = items;
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    pub fn ptr_eq(&self, other: &List) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the backing storage.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn downgrade(&self) -> WeakList {
        WeakList(Rc::downgrade(&self.0))
    }

    /// Drop the elements unless the list is currently borrowed.
    pub fn try_clear(&self) -> Option<Vec<Value>> {
        self.0.try_borrow_mut().ok().map(|mut items| std::mem::take(&mut *items))
    }
}

#[derive(Clone)]
pub struct WeakList(Weak<RefCell<Vec<Value>>>);

impl WeakList {
    pub fn upgrade(&self) -> Option<List> {
        self.0.upgrade().map(List)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

// ---------------------------------------------------------------------------
// Mappings

/// Storage shared by every handle onto one mapping.
#[derive(Default)]
pub struct MapObj {
    table: RefCell<Table>,
    meta: RefCell<Option<MapRef>>,
}

/// Handle onto a mapping: a subkind plus the shared storage.
///
/// Two handles with different kinds may view the same storage (for instance
/// the RAW view of an instance handed to a `__get__` hook).
#[derive(Clone)]
pub struct MapRef {
    kind: MapKind,
    obj: Rc<MapObj>,
}

impl MapRef {
    pub fn new(kind: MapKind) -> Self {
        Self {
            kind,
            obj: Rc::new(MapObj::default()),
        }
    }

    pub fn with_meta(kind: MapKind, meta: MapRef) -> Self {
        let m = Self::new(kind);
        m.set_meta(Some(meta));
        m
    }

    pub fn kind(&self) -> MapKind {
        self.kind
    }

    /// Another handle onto the same storage with a different subkind.
    pub fn with_kind(&self, kind: MapKind) -> MapRef {
        MapRef {
            kind,
            obj: Rc::clone(&self.obj),
        }
    }

    pub fn meta(&self) -> Option<MapRef> {
        self.obj.meta.borrow().clone()
    }

    pub fn set_meta(&self, meta: Option<MapRef>) {
        *self.obj.meta.borrow_mut() = meta;
    }

    /// Direct probe of this mapping's own entries.
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.obj.table.borrow().get(key).cloned()
    }

    pub fn get_hashed(&self, hash: u64, key: &Value) -> Option<Value> {
        self.obj.table.borrow().get_hashed(hash, key).cloned()
    }

    pub fn insert(&self, key: Value, value: Value) {
        self.obj.table.borrow_mut().insert(key, value);
    }

    pub fn remove(&self, key: &Value) -> Option<Value> {
        self.obj.table.borrow_mut().remove(key)
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.obj.table.borrow().contains(key)
    }

    pub fn len(&self) -> usize {
        self.obj.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.obj.table.borrow().is_empty()
    }

    pub fn next_key(&self, index: usize) -> Option<Value> {
        self.obj.table.borrow_mut().next_key(index)
    }

    /// Snapshot of the entries in storage order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.obj
            .table
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.obj.table.borrow().keys().cloned().collect()
    }

    /// Fresh storage with a copy of the entry table. The meta link is shared,
    /// not copied.
    pub fn copy(&self) -> MapRef {
        let copied = MapObj {
            table: RefCell::new(self.obj.table.borrow().clone()),
            meta: RefCell::new(self.meta()),
        };
        MapRef {
            kind: self.kind,
            obj: Rc::new(copied),
        }
    }

    /// Upsert every entry of `other` into this mapping.
    pub fn merge(&self, other: &MapRef) {
        if self.ptr_eq(other) {
            return;
        }
        let source = other.obj.table.borrow().clone();
        self.obj.table.borrow_mut().merge(&source);
    }

    pub fn ptr_eq(&self, other: &MapRef) -> bool {
        Rc::ptr_eq(&self.obj, &other.obj)
    }

    /// Identity of the backing storage, shared by every handle onto it.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.obj) as *const () as usize
    }

    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.obj)
    }

    pub fn downgrade(&self) -> WeakMap {
        WeakMap {
            kind: self.kind,
            obj: Rc::downgrade(&self.obj),
        }
    }

    /// Empty the table and drop the meta link unless either is borrowed.
    /// Returns the detached contents so the caller controls when they drop.
    pub fn try_clear(&self) -> Option<(Table, Option<MapRef>)> {
        let mut table = self.obj.table.try_borrow_mut().ok()?;
        let mut meta = self.obj.meta.try_borrow_mut().ok()?;
        Some((std::mem::take(&mut *table), meta.take()))
    }
}

#[derive(Clone)]
pub struct WeakMap {
    kind: MapKind,
    obj: Weak<MapObj>,
}

impl WeakMap {
    pub fn upgrade(&self) -> Option<MapRef> {
        self.obj.upgrade().map(|obj| MapRef {
            kind: self.kind,
            obj,
        })
    }

    pub fn is_alive(&self) -> bool {
        self.obj.strong_count() > 0
    }
}

// ---------------------------------------------------------------------------
// Functions

/// Entry point of a native callable. Receives the already-prepended argument
/// list (bound self first for methods).
pub type NativeFn = Rc<dyn Fn(&dyn Host, Vec<Value>) -> ObjResult<Value>>;

#[derive(Clone)]
pub enum FuncBody {
    Native(NativeFn),
    /// Compiled code object, run by the executor.
    Compiled(Value),
}

pub struct FuncObj {
    body: FuncBody,
    bound_self: Option<Value>,
    globals: Value,
    method: bool,
}

#[derive(Clone)]
pub struct Function(Rc<FuncObj>);

impl Function {
    pub fn from_native<F>(f: F) -> Self
    where
        F: Fn(&dyn Host, Vec<Value>) -> ObjResult<Value> + 'static,
    {
        Self::from_native_rc(Rc::new(f))
    }

    pub fn from_native_rc(f: NativeFn) -> Self {
        Function(Rc::new(FuncObj {
            body: FuncBody::Native(f),
            bound_self: None,
            globals: Value::None,
            method: false,
        }))
    }

    pub fn from_code(code: Value, globals: Value) -> Self {
        Function(Rc::new(FuncObj {
            body: FuncBody::Compiled(code),
            bound_self: None,
            globals,
            method: false,
        }))
    }

    /// A new function sharing this one's body and globals, bound to
    /// `receiver` and marked METHOD. The original is left untouched.
    pub fn bind(&self, receiver: Value) -> Function {
        Function(Rc::new(FuncObj {
            body: self.0.body.clone(),
            bound_self: Some(receiver),
            globals: self.0.globals.clone(),
            method: true,
        }))
    }

    pub fn kind(&self) -> FuncKind {
        match self.0.body {
            FuncBody::Native(_) => FuncKind::Native,
            FuncBody::Compiled(_) => FuncKind::Compiled,
        }
    }

    pub fn is_method(&self) -> bool {
        self.0.method
    }

    pub fn bound_self(&self) -> Option<&Value> {
        self.0.bound_self.as_ref()
    }

    pub fn globals(&self) -> &Value {
        &self.0.globals
    }

    pub fn body(&self) -> &FuncBody {
        &self.0.body
    }

    /// True when both functions run the same native entry point or code object.
    pub fn shares_body(&self, other: &Function) -> bool {
        match (&self.0.body, &other.0.body) {
            (FuncBody::Native(a), FuncBody::Native(b)) => Rc::ptr_eq(a, b),
            (FuncBody::Compiled(a), FuncBody::Compiled(b)) => match (a, b) {
                (Value::Data(x), Value::Data(y)) => x.ptr_eq(y),
                _ => values_equal(a, b),
            },
            _ => false,
        }
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn downgrade(&self) -> WeakFunction {
        WeakFunction(Rc::downgrade(&self.0))
    }

    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

#[derive(Clone)]
pub struct WeakFunction(Weak<FuncObj>);

impl WeakFunction {
    pub fn upgrade(&self) -> Option<Function> {
        self.0.upgrade().map(Function)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

// ---------------------------------------------------------------------------
// Data

/// Opaque host value. Equality and ordering use its address.
#[derive(Clone)]
pub struct Data {
    ptr: Rc<dyn Any>,
    label: &'static str,
}

impl Data {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            ptr: Rc::new(value),
            label: std::any::type_name::<T>(),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.ptr.downcast_ref::<T>()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn ptr_eq(&self, other: &Data) -> bool {
        self.addr() == other.addr()
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.ptr) as *const () as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.truth());
        assert!(!Value::from(0).truth());
        assert!(Value::from(-2).truth());
        assert!(!Value::from("").truth());
        assert!(Value::from("x").truth());
        assert!(!Value::list_new().truth());
        assert!(!Value::dict_new().truth());
        assert!(Value::data(5u8).truth());
        assert!(Value::function_from_native(|_, _| Ok(Value::None)).truth());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::None.type_name(), "none");
        assert_eq!(Value::list_new().type_name(), "list");
        assert_eq!(Value::dict_new().type_name(), "map");
        assert!(TypeTag::None < TypeTag::Data);
    }

    #[test]
    fn test_list_handles_alias() {
        let a = List::new();
        let b = a.clone();
        a.push(Value::from(1));
        assert_eq!(b.len(), 1);
        assert!(a.ptr_eq(&b));
        assert!(!b.set(3, Value::None));
    }

    #[test]
    fn test_map_kind_views_share_storage() {
        let obj = MapRef::new(MapKind::Object);
        let raw = obj.with_kind(MapKind::Raw);
        raw.insert(Value::from("x"), Value::from(1));
        assert_eq!(obj.get(&Value::from("x")), Some(Value::from(1)));
        assert_eq!(raw.kind(), MapKind::Raw);
        assert_eq!(obj.addr(), raw.addr());
    }

    #[test]
    fn test_map_copy_shares_meta() {
        let class = MapRef::new(MapKind::Interface);
        let obj = MapRef::with_meta(MapKind::Object, class.clone());
        obj.insert(Value::from("a"), Value::from(1));
        let copy = obj.copy();
        copy.insert(Value::from("a"), Value::from(2));
        assert_eq!(obj.get(&Value::from("a")), Some(Value::from(1)));
        assert!(copy.meta().unwrap().ptr_eq(&class));
        assert!(!copy.ptr_eq(&obj));
    }

    #[test]
    fn test_bind_shares_body() {
        let f = Function::from_native(|_, args| Ok(Value::from(args.len())));
        let receiver = Value::dict_with_kind(MapKind::Object);
        let bound = f.bind(receiver.clone());
        assert!(bound.is_method());
        assert!(!f.is_method());
        assert!(bound.shares_body(&f));
        assert!(!bound.ptr_eq(&f));
        assert_eq!(bound.bound_self(), Some(&receiver));
    }

    #[test]
    fn test_data_identity() {
        let d = Data::new(String::from("handle"));
        let e = d.clone();
        assert!(d.ptr_eq(&e));
        assert_eq!(d.downcast_ref::<String>().map(|s| s.as_str()), Some("handle"));
        assert!(!d.ptr_eq(&Data::new(String::from("handle"))));
    }

    #[test]
    fn test_weak_handles() {
        let l = List::new();
        let w = l.downgrade();
        assert!(w.is_alive());
        drop(l);
        assert!(w.upgrade().is_none());
    }
}
