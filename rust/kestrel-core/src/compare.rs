//! Total ordering, key equality and key hashing over [`Value`]s.
//!
//! Values of different kinds order by the difference of their type tags. That
//! ordering is total but implementation-defined; it carries no meaning beyond
//! "stable within a run". Lists compare element by element, recursing into
//! nested lists; a pair of lists already being compared further up counts as
//! equal, so self-containing lists terminate. Mappings, functions and data
//! compare by identity.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::values::{List, Value};

/// Three-way comparison: negative, zero or positive.
pub fn cmp(a: &Value, b: &Value) -> i32 {
    cmp_in(a, b, &mut Vec::new())
}

fn cmp_in(a: &Value, b: &Value, active: &mut Vec<(usize, usize)>) -> i32 {
    let (ta, tb) = (a.type_tag(), b.type_tag());
    if ta != tb {
        return ta as i32 - tb as i32;
    }
    match (a, b) {
        (Value::None, Value::None) => 0,
        (Value::Number(x), Value::Number(y)) => sign(x - y),
        (Value::String(x), Value::String(y)) => ordering(x.compare(y)),
        (Value::List(x), Value::List(y)) => cmp_lists(x, y, active),
        (Value::Map(x), Value::Map(y)) => ordering(x.addr().cmp(&y.addr())),
        (Value::Function(x), Value::Function(y)) => ordering(x.addr().cmp(&y.addr())),
        (Value::Data(x), Value::Data(y)) => ordering(x.addr().cmp(&y.addr())),
        _ => 0,
    }
}

/// `cmp(a, b) == 0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    cmp(a, b) == 0
}

/// Equality used by mapping storage. Agrees with [`hash_key`] for every kind.
pub fn keys_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => cmp(a, b) == 0,
    }
}

pub fn hash_key(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_value(value, &mut hasher, true);
    hasher.finish()
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H, top: bool) {
    (value.type_tag() as u8).hash(state);
    match value {
        Value::None => {}
        Value::Number(n) => canonical_bits(*n).hash(state),
        Value::String(s) => s.as_bytes().hash(state),
        Value::List(l) if top => {
            let items = l.snapshot();
            items.len().hash(state);
            for item in &items {
                hash_value(item, state, false);
            }
        }
        // nested lists hash by length only
        Value::List(l) => l.len().hash(state),
        Value::Map(m) => m.addr().hash(state),
        Value::Function(f) => f.addr().hash(state),
        Value::Data(d) => d.addr().hash(state),
    }
}

fn canonical_bits(n: f64) -> u64 {
    if n == 0.0 {
        0
    } else if n.is_nan() {
        f64::NAN.to_bits()
    } else {
        n.to_bits()
    }
}

fn cmp_lists(a: &List, b: &List, active: &mut Vec<(usize, usize)>) -> i32 {
    if a.ptr_eq(b) {
        return 0;
    }
    let pair = (a.addr(), b.addr());
    if active.contains(&pair) {
        return 0;
    }
    active.push(pair);
    let mut result = None;
    let n = a.len().min(b.len());
    for i in 0..n {
        let (Some(x), Some(y)) = (a.get(i), b.get(i)) else {
            break;
        };
        let v = cmp_in(&x, &y, active);
        if v != 0 {
            result = Some(v);
            break;
        }
    }
    active.pop();
    result.unwrap_or_else(|| ordering(a.len().cmp(&b.len())))
}

fn sign(v: f64) -> i32 {
    if v < 0.0 {
        -1
    } else if v > 0.0 {
        1
    } else {
        0
    }
}

fn ordering(o: Ordering) -> i32 {
    match o {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}
