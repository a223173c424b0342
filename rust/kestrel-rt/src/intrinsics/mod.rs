//! Native functions installed by the runtime.
//!
//! - `list` / `string`: method tables consulted by `get` on lists and strings.
//! - `object`: the root class with `__new__` / `__call__`.
//! - `builtins`: the `__builtins__` module (`len`, `str`, `format`, ...).

mod builtins;
mod format;
mod list;
mod object;
mod string;

use kestrel_core::{Function, Host, List, MapKind, MapRef, ObjError, ObjResult, Str, Value};

use crate::runtime::Runtime;

pub(crate) type Entry = fn(&dyn Host, Vec<Value>) -> ObjResult<Value>;

pub(crate) fn register(table: &MapRef, entries: &[(&'static str, Entry)]) {
    for (name, entry) in entries {
        table.insert(
            Value::string_from_const(name),
            Value::Function(Function::from_native(*entry)),
        );
    }
}

/// Fill the list and string method tables.
pub(crate) fn install_methods(rt: &Runtime) {
    register(rt.list_methods(), list::METHODS);
    register(rt.string_methods(), string::METHODS);
}

/// Build the `__builtins__` module and register it under both of its names.
/// Returns the `object` class.
pub(crate) fn install_builtins(rt: &Runtime) -> MapRef {
    let module = rt.builtins();
    register(module, builtins::FUNCTIONS);
    register(module, &[("format", format::format as Entry)]);

    let object = MapRef::new(MapKind::Object);
    register(&object, object::METHODS);
    module.insert(Value::from("object"), Value::Map(object.clone()));
    module.insert(Value::from("MODULES"), Value::Map(rt.modules().clone()));

    rt.register_module("__builtins__", module.clone());
    rt.register_module("kestrel.builtins", module.clone());
    object
}

// --- argument helpers ---

pub(crate) fn arg<'a>(routine: &'static str, args: &'a [Value], at: usize) -> ObjResult<&'a Value> {
    args.get(at).ok_or_else(|| {
        ObjError::type_error(
            routine,
            format!("expected at least {} argument(s), got {}", at + 1, args.len()),
        )
    })
}

pub(crate) fn number_arg(routine: &'static str, args: &[Value], at: usize) -> ObjResult<f64> {
    match arg(routine, args, at)? {
        Value::Number(n) => Ok(*n),
        other => Err(wrong_type(routine, at, "number", other)),
    }
}

pub(crate) fn str_arg<'a>(routine: &'static str, args: &'a [Value], at: usize) -> ObjResult<&'a Str> {
    match arg(routine, args, at)? {
        Value::String(s) => Ok(s),
        other => Err(wrong_type(routine, at, "string", other)),
    }
}

pub(crate) fn list_arg<'a>(routine: &'static str, args: &'a [Value], at: usize) -> ObjResult<&'a List> {
    match arg(routine, args, at)? {
        Value::List(l) => Ok(l),
        other => Err(wrong_type(routine, at, "list", other)),
    }
}

pub(crate) fn map_arg<'a>(routine: &'static str, args: &'a [Value], at: usize) -> ObjResult<&'a MapRef> {
    match arg(routine, args, at)? {
        Value::Map(m) => Ok(m),
        other => Err(wrong_type(routine, at, "map", other)),
    }
}

fn wrong_type(routine: &'static str, at: usize, expected: &str, got: &Value) -> ObjError {
    ObjError::type_error(
        routine,
        format!("argument {} must be {}, not {}", at, expected, got.type_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_helpers() {
        let args = vec![Value::from(1), Value::from("s")];
        assert_eq!(number_arg("t", &args, 0).unwrap(), 1.0);
        assert_eq!(*str_arg("t", &args, 1).unwrap(), "s");
        assert!(number_arg("t", &args, 1).unwrap_err().is_type_error());
        assert!(arg("t", &args, 2).unwrap_err().message_contains("at least 3"));
    }
}
