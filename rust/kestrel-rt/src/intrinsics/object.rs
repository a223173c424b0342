//! The root `object` class.

use kestrel_core::{Host, MapKind, MapRef, ObjResult, Value};

use super::{map_arg, Entry};

pub(super) const METHODS: &[(&str, Entry)] = &[("__new__", object_new), ("__call__", object_call)];

/// `__new__(class, *args)`: a fresh OBJECT whose meta is `class`, initialized
/// by the `__init__` found through its chain.
fn object_new(host: &dyn Host, mut args: Vec<Value>) -> ObjResult<Value> {
    let class = map_arg("__new__", &args, 0)?.clone();
    args.remove(0);
    let instance = MapRef::with_meta(MapKind::Object, class);
    let instance = host.track(Value::Map(instance));
    if let Value::Map(m) = &instance {
        if let Some(init) = host.resolve(m, &Value::string_from_const("__init__"))? {
            host.call(&init, args)?;
        }
    }
    Ok(instance)
}

/// `__call__(*args)`: an OBJECT view of a mapping argument, or a fresh
/// object without a class.
fn object_call(host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    if args.is_empty() {
        return Ok(host.track(Value::dict_with_kind(MapKind::Object)));
    }
    let m = map_arg("__call__", &args, 0)?;
    Ok(Value::Map(m.with_kind(MapKind::Object)))
}
