//! Seam to the bytecode executor.
//!
//! The object core never interprets code itself. Calling a compiled function
//! enters a [`Frame`] holding the function's globals and code object with the
//! argument list in register 0, and hands it to the installed [`Executor`],
//! which runs it to completion and deposits the result in the frame.

use kestrel_core::{ObjError, ObjResult, Value};

use crate::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct Frame {
    pub globals: Value,
    pub code: Value,
    pub regs: Vec<Value>,
    /// Result slot written by the executor.
    pub result: Value,
}

impl Frame {
    /// A frame for `code` with `args` (a List value) in register 0.
    pub fn enter(globals: Value, code: Value, args: Value) -> Self {
        Self {
            globals,
            code,
            regs: vec![args],
            result: Value::None,
        }
    }

    /// The argument list passed to the frame; `None` once an executor has
    /// cleared the registers.
    pub fn params(&self) -> Option<&Value> {
        self.regs.first()
    }
}

pub trait Executor {
    /// Run `frame` to completion, writing its return value to `frame.result`.
    fn run_frame(&self, rt: &Runtime, frame: &mut Frame) -> ObjResult<()>;
}

/// Placeholder installed until an embedding provides a real executor.
#[derive(Debug, Default)]
pub struct NoExecutor;

impl Executor for NoExecutor {
    fn run_frame(&self, _rt: &Runtime, _frame: &mut Frame) -> ObjResult<()> {
        Err(ObjError::runtime_error("call", "no executor installed"))
    }
}
