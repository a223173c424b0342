//! Functions of the `__builtins__` module.

use kestrel_core::{cmp, Function, Host, MapKind, ObjError, ObjResult, Str, Value};

use super::{arg, map_arg, number_arg, str_arg, Entry};
use crate::ops::MAX_SEQUENCE_LEN;

pub(super) const FUNCTIONS: &[(&str, Entry)] = &[
    ("str", builtin_str),
    ("repr", builtin_repr),
    ("len", builtin_len),
    ("copy", builtin_copy),
    ("bool", builtin_bool),
    ("getraw", getraw),
    ("setmeta", setmeta),
    ("getmeta", getmeta),
    ("bind", bind),
    ("isinstance", isinstance),
    ("istype", istype),
    ("min", min),
    ("max", max),
    ("range", range),
    ("abs", abs),
    ("int", int),
    ("float", float),
    ("number", float),
    ("round", round),
    ("chr", chr),
    ("ord", ord),
    ("dict", dict),
    ("merge", merge),
    ("__merge__", merge),
    ("assert", assert),
    ("fpack", fpack),
    ("funpack", funpack),
];

fn builtin_str(host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    Ok(Value::String(host.str(arg("str", &args, 0)?)?))
}

fn builtin_repr(host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    Ok(Value::String(host.repr(arg("repr", &args, 0)?)?))
}

fn builtin_len(host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    Ok(Value::from(host.len(arg("len", &args, 0)?)?))
}

fn builtin_copy(host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    host.copy(arg("copy", &args, 0)?)
}

fn builtin_bool(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    Ok(Value::from_bool(arg("bool", &args, 0)?.truth()))
}

/// A RAW view of a mapping's storage: no hooks, no meta chain.
fn getraw(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let m = map_arg("getraw", &args, 0)?;
    Ok(Value::Map(m.with_kind(MapKind::Raw)))
}

fn setmeta(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let m = map_arg("setmeta", &args, 0)?;
    let meta = match arg("setmeta", &args, 1)? {
        Value::Map(meta) => Some(meta.clone()),
        Value::None => None,
        other => {
            return Err(ObjError::type_error(
                "setmeta",
                format!("meta must be a map, not {}", other.type_name()),
            ))
        }
    };
    m.set_meta(meta);
    Ok(Value::None)
}

fn getmeta(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let m = map_arg("getmeta", &args, 0)?;
    Ok(m.meta().map(Value::Map).unwrap_or_default())
}

/// `bind(function, receiver)`: a METHOD copy of `function`.
fn bind(host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let f = match arg("bind", &args, 0)? {
        Value::Function(f) => f,
        other => {
            return Err(ObjError::type_error(
                "bind",
                format!("cannot bind {}", other.type_name()),
            ))
        }
    };
    let receiver = arg("bind", &args, 1)?.clone();
    Ok(host.track(Value::Function(Function::bind(f, receiver))))
}

/// True when `class` appears on the meta chain of `value`.
fn isinstance(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let class = map_arg("isinstance", &args, 1)?;
    let mut current = match arg("isinstance", &args, 0)? {
        Value::Map(m) => m.meta(),
        _ => None,
    };
    // bounded walk; meta chains may be cyclic
    let mut steps = 0;
    while let Some(m) = current {
        if m.ptr_eq(class) {
            return Ok(Value::from_bool(true));
        }
        steps += 1;
        if steps > 64 {
            break;
        }
        current = m.meta();
    }
    Ok(Value::from_bool(false))
}

fn istype(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let v = arg("istype", &args, 0)?;
    let name = str_arg("istype", &args, 1)?;
    let matched = match name.as_bytes() {
        b"string" => matches!(v, Value::String(_)),
        b"list" => matches!(v, Value::List(_)),
        b"dict" => matches!(v, Value::Map(_)),
        b"number" => matches!(v, Value::Number(_)),
        b"func" => matches!(v, Value::Function(f) if !f.is_method()),
        b"method" => matches!(v, Value::Function(f) if f.is_method()),
        b"data" => matches!(v, Value::Data(_)),
        b"none" => v.is_none(),
        _ => {
            return Err(ObjError::type_error(
                "istype",
                format!("unknown type name '{}'", name),
            ))
        }
    };
    Ok(Value::from_bool(matched))
}

fn extreme(routine: &'static str, args: Vec<Value>, keep: impl Fn(i32) -> bool) -> ObjResult<Value> {
    let single_list = match args.as_slice() {
        [Value::List(l)] => Some(l.snapshot()),
        _ => None,
    };
    let items = single_list.unwrap_or(args);
    let mut iter = items.into_iter();
    let mut best = iter
        .next()
        .ok_or_else(|| ObjError::value_error(routine, "arg is an empty sequence"))?;
    for item in iter {
        if keep(cmp(&item, &best)) {
            best = item;
        }
    }
    Ok(best)
}

fn min(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    extreme("min", args, |c| c < 0)
}

fn max(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    extreme("max", args, |c| c > 0)
}

/// `range(stop)`, `range(start, stop)` or `range(start, stop, step)`.
fn range(host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let (start, stop, step) = match args.len() {
        1 => (0, number_arg("range", &args, 0)? as i64, 1),
        2 | 3 => {
            let step = if args.len() == 3 {
                number_arg("range", &args, 2)? as i64
            } else {
                1
            };
            (
                number_arg("range", &args, 0)? as i64,
                number_arg("range", &args, 1)? as i64,
                step,
            )
        }
        _ => return Ok(host.track(Value::list_new())),
    };
    let count = range_len(start, stop, step);
    if count > MAX_SEQUENCE_LEN as u128 {
        return Err(ObjError::value_error("range", "range too large"));
    }
    let mut out = Vec::with_capacity(count as usize);
    let mut i = start;
    for _ in 0..count {
        out.push(Value::from(i));
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    Ok(host.track(Value::list_from(out)))
}

/// Number of elements `range(start, stop, step)` yields.
fn range_len(start: i64, stop: i64, step: i64) -> u128 {
    let (start, stop, step) = (start as i128, stop as i128, step as i128);
    let span = match step {
        0 => return 0,
        s if s > 0 => stop - start,
        _ => start - stop,
    };
    if span <= 0 {
        return 0;
    }
    let step = step.unsigned_abs();
    (span as u128).div_ceil(step)
}

/// Numeric value of a number or of a decimal string (`int` base prefixes
/// are not parsed).
fn to_number(routine: &'static str, v: &Value) -> ObjResult<f64> {
    match v {
        Value::Number(n) => Ok(*n),
        Value::String(s) => {
            let text = s.to_string_lossy();
            text.trim().parse::<f64>().map_err(|_| {
                ObjError::value_error(routine, format!("could not convert '{}' to a number", text))
            })
        }
        other => Err(ObjError::type_error(
            routine,
            format!("cannot convert {} to a number", other.type_name()),
        )),
    }
}

fn float(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    Ok(Value::Number(to_number("float", arg("float", &args, 0)?)?))
}

fn int(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    Ok(Value::Number(to_number("int", arg("int", &args, 0)?)?.trunc()))
}

fn abs(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    Ok(Value::Number(to_number("abs", arg("abs", &args, 0)?)?.abs()))
}

/// Round half away from zero.
fn round(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    Ok(Value::Number(to_number("round", arg("round", &args, 0)?)?.round()))
}

fn chr(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let n = number_arg("chr", &args, 0)? as i64;
    let byte = u8::try_from(n)
        .map_err(|_| ObjError::value_error("chr", format!("{} is not in range(256)", n)))?;
    Ok(Value::String(Str::from_vec(vec![byte])))
}

fn ord(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let s = str_arg("ord", &args, 0)?;
    match s.as_bytes() {
        [b] => Ok(Value::from(*b as i64)),
        _ => Err(ObjError::type_error(
            "ord",
            format!("expected a character, got a string of length {}", s.len()),
        )),
    }
}

/// `dict()` or `dict(mapping)`: a fresh RAW dictionary.
fn dict(host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let out = Value::dict_new();
    if let (Some(Value::Map(src)), Value::Map(dst)) = (args.first(), &out) {
        dst.merge(src);
    }
    Ok(host.track(out))
}

fn merge(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let dst = map_arg("merge", &args, 0)?;
    let src = map_arg("merge", &args, 1)?;
    dst.merge(src);
    Ok(Value::None)
}

fn assert(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    if arg("assert", &args, 0)?.truth() {
        Ok(Value::None)
    } else {
        Err(ObjError::raised("(assert) AssertionError"))
    }
}

/// The native-endian bytes of a number.
fn fpack(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let n = number_arg("fpack", &args, 0)?;
    Ok(Value::String(Str::from_bytes(&n.to_ne_bytes())))
}

fn funpack(_host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let s = str_arg("funpack", &args, 0)?;
    let bytes: [u8; 8] = s
        .as_bytes()
        .try_into()
        .map_err(|_| ObjError::value_error("funpack", "length of string is incorrect"))?;
    Ok(Value::Number(f64::from_ne_bytes(bytes)))
}
