//! `format(fmt, args)`, also reached through `fmt % args` and
//! `fmt.format(args)`.
//!
//! Replacement fields: `{name}` looks `name` up in `args`, `{}` takes the next
//! positional argument and `{n}` positional argument `n`. Positional
//! arguments come from a list, or are the argument itself when it is not a
//! container. `{{` and `}}` write literal braces.

use kestrel_core::{Host, ObjError, ObjResult, Str, Value};

use super::str_arg;

pub(super) fn format(host: &dyn Host, args: Vec<Value>) -> ObjResult<Value> {
    let fmt = str_arg("format", &args, 0)?;
    let source = args.get(1).cloned().unwrap_or_default();
    let bytes = fmt.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut next = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                out.push(b'{');
                i += 2;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                out.push(b'}');
                i += 2;
            }
            b'{' => {
                let close = bytes[i + 1..]
                    .iter()
                    .position(|&b| b == b'}')
                    .ok_or_else(|| ObjError::value_error("format", "unmatched '{' in format string"))?;
                let field = &bytes[i + 1..i + 1 + close];
                let value = field_value(host, &source, field, &mut next)?;
                out.extend_from_slice(host.str(&value)?.as_bytes());
                i += close + 2;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Ok(Value::String(Str::from_vec(out)))
}

fn field_value(host: &dyn Host, source: &Value, field: &[u8], next: &mut usize) -> ObjResult<Value> {
    if field.is_empty() {
        let at = *next;
        *next += 1;
        return positional(host, source, at);
    }
    if !matches!(source, Value::Map(_)) {
        if let Some(at) = std::str::from_utf8(field).ok().and_then(|s| s.parse::<usize>().ok()) {
            return positional(host, source, at);
        }
    }
    host.get(source, &Value::string_from_bytes(field))
}

fn positional(host: &dyn Host, source: &Value, at: usize) -> ObjResult<Value> {
    match source {
        Value::List(_) => host.get(source, &Value::from(at)),
        Value::Map(_) => Err(ObjError::key_error(
            "format",
            "positional field used with a mapping argument",
        )),
        single if at == 0 => Ok(single.clone()),
        _ => Err(ObjError::key_error(
            "format",
            format!("no positional argument {}", at),
        )),
    }
}
