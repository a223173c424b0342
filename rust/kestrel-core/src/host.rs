//! The runtime surface visible to native callables.
//!
//! Native functions live in [`crate::values`] but need the full access
//! protocol (hooks, lookup chain, call dispatch) that the runtime crate
//! implements. The runtime hands itself to every native call as a `&dyn Host`.

use crate::error::ObjResult;
use crate::strings::Str;
use crate::values::{MapRef, Value};

pub trait Host {
    fn get(&self, obj: &Value, key: &Value) -> ObjResult<Value>;

    fn set(&self, obj: &Value, key: Value, value: Value) -> ObjResult<()>;

    fn has(&self, obj: &Value, key: &Value) -> ObjResult<bool>;

    fn del(&self, obj: &Value, key: &Value) -> ObjResult<()>;

    fn len(&self, obj: &Value) -> ObjResult<usize>;

    fn copy(&self, obj: &Value) -> ObjResult<Value>;

    /// Invoke `func` with `args`, honoring bound self and constructor hooks.
    fn call(&self, func: &Value, args: Vec<Value>) -> ObjResult<Value>;

    fn str(&self, value: &Value) -> ObjResult<Str>;

    fn repr(&self, value: &Value) -> ObjResult<Str>;

    /// Walk the lookup chain of `map` for `key`. `Ok(None)` is a miss.
    fn resolve(&self, map: &MapRef, key: &Value) -> ObjResult<Option<Value>>;

    /// Register a freshly built heap value with the collector.
    fn track(&self, value: Value) -> Value;

    /// The mapping every compiled `object` class derives from, if installed.
    fn object_class(&self) -> Option<MapRef>;
}
