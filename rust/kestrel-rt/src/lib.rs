//! Object runtime for Kestrel.
//!
//! [`Runtime`] is the context every object operation runs in: the access
//! protocol (`get`, `set`, `has`, `del`, `iter`, `len`, `copy`), operator
//! dispatch, the call protocol and `str` / `repr` formatting, all consulting
//! the meta-link lookup chain for user overrides. Compiled code is run by an
//! embedder-provided [`Executor`]; reference cycles are reclaimed by the
//! [`Collector`].

mod access;
mod call;
pub mod config;
pub mod executor;
pub mod gc;
mod intrinsics;
mod lookup;
mod ops;
mod repr;
pub mod runtime;

pub use config::{ConfigError, RuntimeConfig};
pub use executor::{Executor, Frame, NoExecutor};
pub use gc::{Collector, Heap, HeapStats};
pub use runtime::Runtime;

pub use kestrel_core::{
    cmp, Data, ErrorKind, FuncKind, Function, Host, List, MapKind, MapRef, ObjError, ObjResult, Str,
    StrKind, TypeTag, Value,
};
