//! String methods reachable through `get(string, "<name>")`.

use kestrel_core::{Host, ObjError, ObjResult, Str, Value};

use super::{arg, list_arg, str_arg, Entry};

pub(super) const METHODS: &[(&str, Entry)] = &[
    ("join", join),
    ("split", split),
    ("index", index),
    ("strip", strip),
    ("replace", replace),
    ("find", find),
    ("startswith", startswith),
    ("format", super::format::format),
];

/// `sep.join(items)`: the `str` of every item, separated by `sep`.
fn join(host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let sep = str_arg("join", &args, 0)?;
    let items = list_arg("join", &args, 1)?.snapshot();
    let mut out = Vec::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(sep.as_bytes());
        }
        out.extend_from_slice(host.str(item)?.as_bytes());
    }
    Ok(Value::String(Str::from_vec(out)))
}

/// `s.split(sep)`: views into `s` between occurrences of `sep`.
fn split(host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let s = str_arg("split", &args, 0)?;
    let sep = str_arg("split", &args, 1)?;
    if sep.is_empty() {
        return Err(ObjError::value_error("split", "empty separator"));
    }
    let mut parts = Vec::new();
    let mut start = 0usize;
    loop {
        let rest = s.view(start as i64, s.len() as i64);
        match rest.find(sep) {
            Some(at) => {
                parts.push(Value::String(s.view(start as i64, (start + at) as i64)));
                start += at + sep.len();
            }
            None => {
                parts.push(Value::String(rest));
                break;
            }
        }
    }
    Ok(host.track(Value::list_from(parts)))
}

fn index(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let s = str_arg("index", &args, 0)?;
    let needle = str_arg("index", &args, 1)?;
    s.find(needle)
        .map(Value::from)
        .ok_or_else(|| ObjError::value_error("index", "substring not found"))
}

/// `s.find(needle)`: position of the first occurrence, or `-1`.
fn find(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let s = str_arg("find", &args, 0)?;
    let needle = str_arg("find", &args, 1)?;
    Ok(match s.find(needle) {
        Some(at) => Value::from(at),
        None => Value::from(-1),
    })
}

fn startswith(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let s = str_arg("startswith", &args, 0)?;
    let prefix = str_arg("startswith", &args, 1)?;
    Ok(Value::from_bool(s.starts_with(prefix)))
}

/// Trim ASCII whitespace from both ends.
fn strip(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let s = str_arg("strip", &args, 0)?;
    let bytes = s.as_bytes();
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    Ok(Value::String(s.view(start as i64, end as i64)))
}

fn replace(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let s = str_arg("replace", &args, 0)?;
    let old = str_arg("replace", &args, 1)?;
    let new = str_arg("replace", &args, 2)?;
    if old.is_empty() {
        return Ok(arg("replace", &args, 0)?.clone());
    }
    let hay = s.as_bytes();
    let mut out = Vec::with_capacity(hay.len());
    let mut i = 0;
    while i < hay.len() {
        if hay[i..].starts_with(old.as_bytes()) {
            out.extend_from_slice(new.as_bytes());
            i += old.len();
        } else {
            out.push(hay[i]);
            i += 1;
        }
    }
    Ok(Value::String(Str::from_vec(out)))
}
