//! List methods reachable through `get(list, "<name>")`.

use kestrel_core::{cmp, values_equal, Host, ObjError, ObjResult, Value};

use super::{arg, list_arg, Entry};

pub(super) const METHODS: &[(&str, Entry)] = &[
    ("append", append),
    ("pop", pop),
    ("index", index),
    ("sort", sort),
    ("extend", extend),
];

fn append(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let list = list_arg("append", &args, 0)?;
    list.push(arg("append", &args, 1)?.clone());
    Ok(Value::None)
}

/// Remove and return the last element.
fn pop(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let list = list_arg("pop", &args, 0)?;
    list.len()
        .checked_sub(1)
        .and_then(|last| list.remove(last))
        .ok_or_else(|| ObjError::key_error("pop", "pop from empty list"))
}

fn index(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let list = list_arg("index", &args, 0)?;
    let needle = arg("index", &args, 1)?;
    let found = list.borrow().iter().position(|item| values_equal(item, needle));
    found
        .map(Value::from)
        .ok_or_else(|| ObjError::value_error("index", format!("{} is not in list", needle.describe())))
}

/// In-place ascending sort by the value ordering.
fn sort(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let list = list_arg("sort", &args, 0)?;
    let mut items = list.snapshot();
    items.sort_by(|a, b| cmp(a, b).cmp(&0));
    list.replace_all(items);
    Ok(Value::None)
}

fn extend(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let list = list_arg("extend", &args, 0)?;
    let other = list_arg("extend", &args, 1)?;
    list.extend(other.snapshot());
    Ok(Value::None)
}
