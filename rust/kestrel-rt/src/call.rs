//! Call dispatch for functions, classes and callable objects.

use tracing::trace;

use kestrel_core::{FuncBody, MapKind, ObjError, ObjResult, Value};

use crate::executor::Frame;
use crate::runtime::Runtime;

impl Runtime {
    /// Invoke `callable` with `args`.
    ///
    /// - INTERFACE mapping: `__new__` from the chain, with the class prepended.
    /// - OBJECT mapping: `__call__` from the chain.
    /// - native function: entry point, bound self prepended for methods.
    /// - compiled function: a fresh frame run by the installed executor.
    pub fn call(&self, callable: &Value, mut args: Vec<Value>) -> ObjResult<Value> {
        match callable {
            Value::Map(m) if m.kind() == MapKind::Interface => {
                if let Some(ctor) = self.hook(m, "__new__", &[MapKind::Interface])? {
                    args.insert(0, callable.clone());
                    return self.call(&ctor, args);
                }
            }
            Value::Map(m) if m.kind() == MapKind::Object => {
                if let Some(hook) = self.hook(m, "__call__", &[MapKind::Object])? {
                    return self.call(&hook, args);
                }
            }
            Value::Function(f) => {
                if f.is_method() {
                    if let Some(receiver) = f.bound_self() {
                        args.insert(0, receiver.clone());
                    }
                }
                let result = match f.body() {
                    FuncBody::Native(entry) => (**entry)(self, args)?,
                    FuncBody::Compiled(code) => {
                        let params = self.list(args);
                        let mut frame = Frame::enter(f.globals().clone(), code.clone(), params);
                        trace!(method = f.is_method(), "entering frame");
                        self.executor().run_frame(self, &mut frame)?;
                        frame.result
                    }
                };
                return Ok(self.mark(result));
            }
            _ => {}
        }
        Err(ObjError::type_error(
            "call",
            format!("{} object is not callable", callable.type_name()),
        ))
    }
}
