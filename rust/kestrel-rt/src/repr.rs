//! `str` / `repr` formatting with cycle detection.

use kestrel_core::{MapKind, MapRef, ObjError, ObjResult, Str, Value};

use crate::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Str,
    Repr,
}

const HOOK_KINDS: &[MapKind] = &[MapKind::Object];

struct Formatter<'rt> {
    rt: &'rt Runtime,
    mode: Mode,
    buf: Vec<u8>,
    /// Storage addresses of the containers currently being written.
    visited: Vec<usize>,
}

impl<'rt> Formatter<'rt> {
    fn new(rt: &'rt Runtime, mode: Mode) -> Self {
        Self {
            rt,
            mode,
            buf: Vec::with_capacity(rt.config().repr_initial_capacity),
            visited: Vec::new(),
        }
    }

    fn finish(self) -> Str {
        Str::from_vec(self.buf)
    }

    fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn value(&mut self, v: &Value) -> ObjResult<()> {
        if let Value::Map(m) = v {
            if self.hooked(m)? {
                return Ok(());
            }
        }
        match v {
            Value::None => self.write(b"None"),
            Value::Number(n) => self.number(*n),
            Value::String(s) => self.string(s),
            Value::List(l) => {
                let addr = l.addr();
                if self.visited.contains(&addr) {
                    self.write(b"[...]");
                    return Ok(());
                }
                self.visited.push(addr);
                let result = self.list_items(&l.snapshot());
                self.visited.pop();
                result?;
            }
            Value::Map(m) => {
                let addr = m.addr();
                if self.visited.contains(&addr) {
                    self.write(b"{...}");
                    return Ok(());
                }
                self.visited.push(addr);
                let result = self.map_entries(&m.entries());
                self.visited.pop();
                result?;
            }
            Value::Function(f) => self.write(format!("<func 0x{:x}>", f.addr()).as_bytes()),
            Value::Data(d) => self.write(format!("<data 0x{:x}>", d.addr()).as_bytes()),
        }
        Ok(())
    }

    /// Splice in the result of a `__str__` / `__repr___` override. The second
    /// name carries three trailing underscores and is checked in both modes.
    fn hooked(&mut self, m: &MapRef) -> ObjResult<bool> {
        let mut names: Vec<&'static str> = Vec::with_capacity(2);
        if self.mode == Mode::Str {
            names.push("__str__");
        }
        names.push("__repr___");
        for name in names {
            if let Some(hook) = self.rt.hook(m, name, HOOK_KINDS)? {
                let out = self.rt.call(&hook, Vec::new())?;
                let Value::String(s) = out else {
                    return Err(ObjError::type_error(
                        "str",
                        format!("{} returned non-string ({})", name, out.type_name()),
                    ));
                };
                self.write(s.as_bytes());
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn number(&mut self, n: f64) {
        let truncated = n as i64;
        if (n - truncated as f64).abs() < 1e-6 {
            self.write(truncated.to_string().as_bytes());
        } else {
            self.write(format!("{:.6}", n).as_bytes());
        }
    }

    fn string(&mut self, s: &Str) {
        if self.mode == Mode::Str {
            self.write(s.as_bytes());
            return;
        }
        self.buf.push(b'\'');
        for &b in s.as_bytes() {
            match b {
                b'\n' => self.write(b"\\n"),
                b'\r' => self.write(b"\\r"),
                b'\t' => self.write(b"\\t"),
                b'\'' | b'"' => {
                    self.buf.push(b'\\');
                    self.buf.push(b);
                }
                _ => self.buf.push(b),
            }
        }
        self.buf.push(b'\'');
    }

    fn list_items(&mut self, items: &[Value]) -> ObjResult<()> {
        self.write(b"[");
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(b", ");
            }
            self.value(item)?;
        }
        self.write(b"]");
        Ok(())
    }

    fn map_entries(&mut self, entries: &[(Value, Value)]) -> ObjResult<()> {
        self.write(b"{");
        for (i, (k, v)) in entries.iter().enumerate() {
            if i > 0 {
                self.write(b", ");
            }
            self.value(k)?;
            self.write(b": ");
            self.value(v)?;
        }
        self.write(b"}");
        Ok(())
    }
}

impl Runtime {
    /// Human-readable text: strings are written raw.
    pub fn str(&self, v: &Value) -> ObjResult<Str> {
        let mut f = Formatter::new(self, Mode::Str);
        f.value(v)?;
        Ok(f.finish())
    }

    /// Source-like text: strings are quoted and escaped.
    pub fn repr(&self, v: &Value) -> ObjResult<Str> {
        let mut f = Formatter::new(self, Mode::Repr);
        f.value(v)?;
        Ok(f.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: Str) -> String {
        s.to_string_lossy().into_owned()
    }

    #[test]
    fn test_numbers() {
        let rt = Runtime::new();
        assert_eq!(text(rt.str(&Value::from(3.0)).unwrap()), "3");
        assert_eq!(text(rt.str(&Value::from(3.5)).unwrap()), "3.500000");
        assert_eq!(text(rt.str(&Value::from(-2.0000001)).unwrap()), "-2");
        assert_eq!(text(rt.str(&Value::from(0.25)).unwrap()), "0.250000");
    }

    #[test]
    fn test_string_modes() {
        let rt = Runtime::new();
        let s = Value::from("a'b\n");
        assert_eq!(text(rt.str(&s).unwrap()), "a'b\n");
        assert_eq!(text(rt.repr(&s).unwrap()), "'a\\'b\\n'");
        assert_eq!(text(rt.repr(&Value::from("\"q\"\t")).unwrap()), "'\\\"q\\\"\\t'");
    }

    #[test]
    fn test_containers_in_storage_order() {
        let rt = Runtime::new();
        let d = rt.dict();
        rt.set(&d, Value::from("b"), Value::from(1)).unwrap();
        rt.set(&d, Value::from("a"), rt.list(vec![Value::from("x"), Value::None])).unwrap();
        assert_eq!(text(rt.repr(&d).unwrap()), "{'b': 1, 'a': ['x', None]}");
        assert_eq!(text(rt.str(&d).unwrap()), "{b: 1, a: [x, None]}");
    }

    #[test]
    fn test_sibling_references_are_not_cycles() {
        let rt = Runtime::new();
        let inner = rt.list(vec![Value::from(1)]);
        let outer = rt.list(vec![inner.clone(), inner]);
        assert_eq!(text(rt.str(&outer).unwrap()), "[[1], [1]]");
    }

    #[test]
    fn test_self_referencing_dict() {
        let rt = Runtime::new();
        let d = rt.dict();
        rt.set(&d, Value::from("me"), d.clone()).unwrap();
        assert_eq!(text(rt.repr(&d).unwrap()), "{'me': {...}}");
    }

    #[test]
    fn test_placeholders() {
        let rt = Runtime::new();
        let f = rt.native(|_, _| Ok(Value::None));
        assert!(text(rt.str(&f).unwrap()).starts_with("<func 0x"));
        assert!(text(rt.str(&Value::data(1u32)).unwrap()).starts_with("<data 0x"));
    }
}
