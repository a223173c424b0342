//! Polymorphic item/attribute access: get, set, has, del, iter, len, copy.

use kestrel_core::{clamp_range, values_equal, List, MapKind, MapRef, ObjError, ObjResult, Str, Value};

use crate::runtime::Runtime;

const GET_HOOK_KINDS: &[MapKind] = &[MapKind::Object, MapKind::Interface];
const SET_HOOK_KINDS: &[MapKind] = &[MapKind::Object];

/// Normalize a possibly negative index against `len`.
fn normalize_index(len: usize, key: f64) -> Option<usize> {
    let n = key as i64;
    let n = if n < 0 { n + len as i64 } else { n };
    if n >= 0 && (n as usize) < len {
        Some(n as usize)
    } else {
        None
    }
}

fn index_error(routine: &'static str, key: f64, len: usize) -> ObjError {
    ObjError::key_error(
        routine,
        format!("index {} out of range for length {}", key as i64, len),
    )
}

/// `(start, end)` of a slice pair; `None` stands for the matching end.
fn slice_bounds(pair: &List, len: usize) -> ObjResult<(i64, i64)> {
    let bound = |at: usize, default: i64| -> ObjResult<i64> {
        match pair.get(at) {
            Some(Value::Number(n)) => Ok(n as i64),
            Some(Value::None) => Ok(default),
            _ => Err(ObjError::type_error("get", "indices must be numbers")),
        }
    };
    Ok((bound(0, 0)?, bound(1, len as i64)?))
}

fn missing_key(routine: &'static str, key: &Value) -> ObjError {
    ObjError::key_error(routine, key.describe())
}

impl Runtime {
    /// `obj[key]`.
    pub fn get(&self, obj: &Value, key: &Value) -> ObjResult<Value> {
        let found = self.get_item(obj, key, false)?;
        Ok(self.mark(found))
    }

    /// `obj.key`: like [`Runtime::get`], except that a CLASS mapping also
    /// resolves through its lookup chain.
    pub fn get_attr(&self, obj: &Value, key: &Value) -> ObjResult<Value> {
        let found = self.get_item(obj, key, true)?;
        Ok(self.mark(found))
    }

    fn get_item(&self, obj: &Value, key: &Value, attr: bool) -> ObjResult<Value> {
        match obj {
            Value::Map(m) => return self.get_from_map(m, key, attr),
            Value::List(l) => match key {
                Value::Number(n) => {
                    let len = l.len();
                    let i = normalize_index(len, *n).ok_or_else(|| index_error("get", *n, len))?;
                    return l.get(i).ok_or_else(|| index_error("get", *n, len));
                }
                Value::None => {
                    return l
                        .remove(0)
                        .ok_or_else(|| ObjError::key_error("get", "pop from empty list"));
                }
                Value::String(_) => {
                    if let Some(method) = self.bound_method(self.list_methods(), obj, key) {
                        return Ok(method);
                    }
                }
                _ => {}
            },
            Value::String(s) => match key {
                Value::Number(n) => {
                    let len = s.len();
                    let i = normalize_index(len, *n).ok_or_else(|| index_error("get", *n, len))?;
                    return s
                        .char_at(i)
                        .map(Value::String)
                        .ok_or_else(|| index_error("get", *n, len));
                }
                Value::String(_) => {
                    if let Some(method) = self.bound_method(self.string_methods(), obj, key) {
                        return Ok(method);
                    }
                }
                _ => {}
            },
            _ => {}
        }

        if let Value::List(pair) = key {
            if pair.len() == 2 {
                return self.slice(obj, pair);
            }
        }
        Err(ObjError::type_error(
            "get",
            format!("cannot index {} with {}", obj.type_name(), key.type_name()),
        ))
    }

    fn get_from_map(&self, m: &MapRef, key: &Value, attr: bool) -> ObjResult<Value> {
        for name in ["__get__", "__getitem__"] {
            if let Some(hook) = self.hook(m, name, GET_HOOK_KINDS)? {
                return self.call(&hook, vec![key.clone()]);
            }
        }
        let chased = match m.kind() {
            MapKind::Raw => false,
            MapKind::Class => attr,
            MapKind::Object | MapKind::Interface => true,
        };
        let found = if chased { self.resolve(m, key)? } else { m.get(key) };
        found.ok_or_else(|| missing_key("get", key))
    }

    fn bound_method(&self, table: &MapRef, receiver: &Value, name: &Value) -> Option<Value> {
        match table.get(name) {
            Some(Value::Function(f)) => Some(self.track(Value::Function(f.bind(receiver.clone())))),
            _ => None,
        }
    }

    fn slice(&self, obj: &Value, pair: &List) -> ObjResult<Value> {
        match obj {
            Value::List(l) => {
                let len = l.len();
                let (a, b) = slice_bounds(pair, len)?;
                let (start, end) = clamp_range(len, a, b);
                let items = l.borrow()[start..end].to_vec();
                Ok(self.list(items))
            }
            Value::String(s) => {
                let (a, b) = slice_bounds(pair, s.len())?;
                Ok(Value::String(s.view(a, b)))
            }
            _ => Err(ObjError::type_error(
                "get",
                format!("{} cannot be sliced", obj.type_name()),
            )),
        }
    }

    /// `obj[key] = value`.
    pub fn set(&self, obj: &Value, key: Value, value: Value) -> ObjResult<()> {
        match obj {
            Value::Map(m) => {
                if let Some(hook) = self.hook(m, "__set__", SET_HOOK_KINDS)? {
                    self.call(&hook, vec![key, value])?;
                    return Ok(());
                }
                m.insert(key, value);
                Ok(())
            }
            Value::List(l) => match &key {
                Value::Number(n) => {
                    let len = l.len();
                    let i = normalize_index(len, *n).ok_or_else(|| index_error("set", *n, len))?;
                    l.set(i, value);
                    Ok(())
                }
                Value::None => {
                    l.push(value);
                    Ok(())
                }
                Value::String(s) if *s == "*" => match &value {
                    Value::List(other) => {
                        l.extend(other.snapshot());
                        Ok(())
                    }
                    _ => Err(ObjError::type_error("set", "can only extend a list with a list")),
                },
                _ => Err(ObjError::type_error("set", "object does not support item assignment")),
            },
            _ => Err(ObjError::type_error("set", "object does not support item assignment")),
        }
    }

    /// Membership test: `key in obj`.
    pub fn has(&self, obj: &Value, key: &Value) -> ObjResult<bool> {
        match (obj, key) {
            (Value::Map(m), _) => Ok(m.contains(key)),
            (Value::String(s), Value::String(needle)) => Ok(s.contains(needle)),
            (Value::List(l), _) => Ok(l.borrow().iter().any(|item| values_equal(item, key))),
            _ => Err(ObjError::type_error("has", "iterable argument required")),
        }
    }

    pub fn del(&self, obj: &Value, key: &Value) -> ObjResult<()> {
        match obj {
            Value::Map(m) => m.remove(key).map(|_| ()).ok_or_else(|| missing_key("del", key)),
            _ => Err(ObjError::type_error("del", "object does not support item deletion")),
        }
    }

    /// Caller-driven iteration: the caller passes `0, 1, 2, ...` up to
    /// `len(obj) - 1`. Index 0 restarts a mapping's key cursor.
    pub fn iter(&self, obj: &Value, index: usize) -> ObjResult<Value> {
        match obj {
            Value::List(_) | Value::String(_) => self.get(obj, &Value::from(index)),
            Value::Map(m) => {
                let key = m
                    .next_key(index)
                    .ok_or_else(|| ObjError::key_error("iter", "iteration past the last key"))?;
                Ok(self.mark(key))
            }
            _ => Err(ObjError::type_error("iter", "iteration over non-sequence")),
        }
    }

    pub fn len(&self, obj: &Value) -> ObjResult<usize> {
        match obj {
            Value::String(s) => Ok(s.len()),
            Value::List(l) => Ok(l.len()),
            Value::Map(m) => Ok(m.len()),
            _ => Err(ObjError::type_error("len", "len() of unsized object")),
        }
    }

    /// Shallow copy. Mappings get a fresh entry table but keep their meta
    /// link by reference.
    pub fn copy(&self, obj: &Value) -> ObjResult<Value> {
        match obj {
            Value::None | Value::Number(_) => Ok(obj.clone()),
            Value::String(s) => Ok(Value::String(Str::to_owned_copy(s))),
            Value::List(l) => Ok(self.list(l.snapshot())),
            Value::Map(m) => Ok(self.track(Value::Map(m.copy()))),
            _ => Err(ObjError::type_error(
                "copy",
                format!("{} does not support copy", obj.type_name()),
            )),
        }
    }
}
