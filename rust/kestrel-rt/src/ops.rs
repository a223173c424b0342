//! Arithmetic, bitwise and comparison operators.

use kestrel_core::{cmp, ObjError, ObjResult, Value};

use crate::runtime::Runtime;

fn unsupported(op: &'static str, a: &Value, b: &Value) -> ObjError {
    ObjError::type_error(
        op,
        format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op,
            a.type_name(),
            b.type_name()
        ),
    )
}

/// Longest string (bytes) or list (elements) repetition may build.
pub(crate) const MAX_SEQUENCE_LEN: usize = 1 << 28;

/// Copies for `len * n` repetition, or `ValueError` when the result would
/// pass [`MAX_SEQUENCE_LEN`].
fn repeat_count(len: usize, n: f64) -> ObjResult<usize> {
    let times = (n as i64).max(0);
    if len == 0 || times == 0 {
        return Ok(0);
    }
    usize::try_from(times)
        .ok()
        .and_then(|t| len.checked_mul(t).map(|total| (t, total)))
        .filter(|&(_, total)| total <= MAX_SEQUENCE_LEN)
        .map(|(t, _)| t)
        .ok_or_else(|| ObjError::value_error("mul", "repeat count too large"))
}

fn numbers(op: &'static str, a: &Value, b: &Value) -> ObjResult<(f64, f64)> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok((*x, *y)),
        _ => Err(unsupported(op, a, b)),
    }
}

/// Operands of the integer operators, truncated toward zero.
fn integers(op: &'static str, a: &Value, b: &Value) -> ObjResult<(i64, i64)> {
    let (x, y) = numbers(op, a, b)?;
    Ok((x as i64, y as i64))
}

impl Runtime {
    pub fn add(&self, a: &Value, b: &Value) -> ObjResult<Value> {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x + y)),
            (Value::String(x), Value::String(y)) => Ok(Value::String(x.concat(y))),
            (Value::List(x), Value::List(y)) => {
                let mut items = x.snapshot();
                items.extend(y.snapshot());
                Ok(self.list(items))
            }
            _ => Err(unsupported("add", a, b)),
        }
    }

    pub fn sub(&self, a: &Value, b: &Value) -> ObjResult<Value> {
        let (x, y) = numbers("sub", a, b)?;
        Ok(Value::Number(x - y))
    }

    pub fn mul(&self, a: &Value, b: &Value) -> ObjResult<Value> {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x * y)),
            (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
                let times = repeat_count(s.len(), *n)?;
                s.repeat(times as i64)
                    .map(Value::String)
                    .ok_or_else(|| ObjError::value_error("mul", "repeat count too large"))
            }
            (Value::List(l), Value::Number(n)) | (Value::Number(n), Value::List(l)) => {
                let items = l.snapshot();
                let times = repeat_count(items.len(), *n)?;
                let mut out = Vec::with_capacity(items.len() * times);
                for _ in 0..times {
                    out.extend(items.iter().cloned());
                }
                Ok(self.list(out))
            }
            _ => Err(unsupported("mul", a, b)),
        }
    }

    pub fn div(&self, a: &Value, b: &Value) -> ObjResult<Value> {
        let (x, y) = numbers("div", a, b)?;
        Ok(Value::Number(x / y))
    }

    /// Integer remainder for numbers; string formatting for a string left
    /// operand.
    pub fn modulo(&self, a: &Value, b: &Value) -> ObjResult<Value> {
        if let Value::String(_) = a {
            let cfg = self.config();
            let format = self.resolve_module_function(&cfg.format_module, &cfg.format_function)?;
            return self.call(&format, vec![a.clone(), b.clone()]);
        }
        let (x, y) = integers("mod", a, b)?;
        if y == 0 {
            return Err(ObjError::value_error("mod", "integer modulo by zero"));
        }
        Ok(Value::Number(x.wrapping_rem(y) as f64))
    }

    pub fn pow(&self, a: &Value, b: &Value) -> ObjResult<Value> {
        let (x, y) = numbers("pow", a, b)?;
        Ok(Value::Number(x.powf(y)))
    }

    pub fn bitand(&self, a: &Value, b: &Value) -> ObjResult<Value> {
        let (x, y) = integers("and", a, b)?;
        Ok(Value::Number((x & y) as f64))
    }

    pub fn bitor(&self, a: &Value, b: &Value) -> ObjResult<Value> {
        let (x, y) = integers("or", a, b)?;
        Ok(Value::Number((x | y) as f64))
    }

    pub fn bitxor(&self, a: &Value, b: &Value) -> ObjResult<Value> {
        let (x, y) = integers("xor", a, b)?;
        Ok(Value::Number((x ^ y) as f64))
    }

    /// Left shift; counts outside `0..64` shift every bit out.
    pub fn lsh(&self, a: &Value, b: &Value) -> ObjResult<Value> {
        let (x, y) = integers("lsh", a, b)?;
        let r = u32::try_from(y)
            .ok()
            .and_then(|n| x.checked_shl(n))
            .unwrap_or(0);
        Ok(Value::Number(r as f64))
    }

    /// Arithmetic right shift; counts outside `0..64` leave only the sign.
    pub fn rsh(&self, a: &Value, b: &Value) -> ObjResult<Value> {
        let (x, y) = integers("rsh", a, b)?;
        let r = u32::try_from(y)
            .ok()
            .and_then(|n| x.checked_shr(n))
            .unwrap_or(if x < 0 { -1 } else { 0 });
        Ok(Value::Number(r as f64))
    }

    pub fn bitnot(&self, a: &Value) -> ObjResult<Value> {
        match a {
            Value::Number(x) => Ok(Value::Number(!(*x as i64) as f64)),
            _ => Err(ObjError::type_error(
                "not",
                format!("bad operand type for ~: '{}'", a.type_name()),
            )),
        }
    }

    /// Three-way comparison, see [`kestrel_core::cmp`].
    pub fn cmp(&self, a: &Value, b: &Value) -> i32 {
        cmp(a, b)
    }

    pub fn truth(&self, v: &Value) -> bool {
        v.truth()
    }
}
