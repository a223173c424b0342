//! Value model of the Kestrel runtime: tagged values, the string engine,
//! mapping storage and the comparison/hash rules they share.

pub mod compare;
pub mod error;
pub mod host;
pub mod strings;
pub mod table;
pub mod values;

pub use compare::{cmp, hash_key, keys_equal, values_equal};
pub use error::{ErrorKind, ObjError, ObjResult};
pub use host::Host;
pub use strings::{clamp_range, Str, StrKind};
pub use table::Table;
pub use values::{
    Data, FuncBody, FuncKind, Function, List, MapKind, MapRef, NativeFn, TypeTag, Value, WeakFunction,
    WeakList, WeakMap,
};
