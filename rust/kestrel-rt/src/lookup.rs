//! Prototype resolution through mapping meta links.

use tracing::{debug, warn};

use kestrel_core::{hash_key, MapRef, ObjError, ObjResult, Value};

use crate::runtime::Runtime;

impl Runtime {
    /// Resolve `key` on `map`, chasing meta links for every subkind except
    /// RAW.
    ///
    /// A function found through the chain of an OBJECT receiver comes back
    /// rebound to that receiver. `Ok(None)` is a plain miss; only running out
    /// of depth is an error.
    pub fn resolve(&self, map: &MapRef, key: &Value) -> ObjResult<Option<Value>> {
        let hash = hash_key(key);
        self.resolve_at(map, hash, key, self.config().max_lookup_depth)
    }

    fn resolve_at(&self, map: &MapRef, hash: u64, key: &Value, depth: usize) -> ObjResult<Option<Value>> {
        if let Some(found) = map.get_hashed(hash, key) {
            return Ok(Some(found));
        }
        let depth = depth.saturating_sub(1);
        if depth == 0 {
            warn!(key = %key.describe(), "lookup chain exhausted its depth");
            return Err(ObjError::runtime_error("lookup", "maximum lookup depth exceeded"));
        }
        if !map.kind().chases_meta() {
            return Ok(None);
        }
        let Some(meta) = map.meta() else {
            return Ok(None);
        };
        let Some(found) = self.resolve_at(&meta, hash, key, depth)? else {
            return Ok(None);
        };
        match found {
            Value::Function(f) if map.kind().binds_methods() => {
                let bound = Value::Function(f.bind(Value::Map(map.clone())));
                Ok(Some(self.track(bound)))
            }
            other => Ok(Some(other)),
        }
    }

    /// Resolve an override hook by name. Hooks are only honored when `map`
    /// has one of the `kinds` subkinds.
    pub(crate) fn hook(
        &self,
        map: &MapRef,
        name: &'static str,
        kinds: &[kestrel_core::MapKind],
    ) -> ObjResult<Option<Value>> {
        if !kinds.contains(&map.kind()) {
            return Ok(None);
        }
        let found = self.resolve(map, &Value::string_from_const(name))?;
        if found.is_some() {
            debug!(hook = name, kind = %map.kind(), "dispatching override hook");
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::MapKind;

    fn rt() -> Runtime {
        Runtime::new()
    }

    #[test]
    fn test_own_entry_is_not_rebound() {
        let rt = rt();
        let obj = MapRef::new(MapKind::Object);
        let f = rt.native(|_, _| Ok(Value::None));
        obj.insert(Value::from("f"), f.clone());
        let found = rt.resolve(&obj, &Value::from("f")).unwrap().unwrap();
        let found = found.as_function().unwrap();
        assert!(!found.is_method());
        assert!(found.ptr_eq(f.as_function().unwrap()));
    }

    #[test]
    fn test_raw_map_never_chases_meta() {
        let rt = rt();
        let parent = MapRef::new(MapKind::Class);
        parent.insert(Value::from("x"), Value::from(1));
        let raw = MapRef::with_meta(MapKind::Raw, parent);
        assert_eq!(rt.resolve(&raw, &Value::from("x")).unwrap(), None);
    }

    #[test]
    fn test_class_chain_does_not_rebind() {
        let rt = rt();
        let base = MapRef::new(MapKind::Class);
        base.insert(Value::from("f"), rt.native(|_, _| Ok(Value::None)));
        let derived = MapRef::with_meta(MapKind::Class, base);
        let found = rt.resolve(&derived, &Value::from("f")).unwrap().unwrap();
        assert!(!found.as_function().unwrap().is_method());
    }

    #[test]
    fn test_chain_of_eight_exhausts_depth() {
        let rt = rt();
        let mut tail = MapRef::new(MapKind::Class);
        for _ in 0..7 {
            tail = MapRef::with_meta(MapKind::Class, tail);
        }
        // eight mappings, key absent everywhere
        let err = rt.resolve(&tail, &Value::from("missing")).unwrap_err();
        assert!(err.is_runtime_error());

        let mut short = MapRef::new(MapKind::Class);
        for _ in 0..6 {
            short = MapRef::with_meta(MapKind::Class, short);
        }
        assert_eq!(rt.resolve(&short, &Value::from("missing")).unwrap(), None);
    }

    #[test]
    fn test_depth_comes_from_config() {
        let cfg = crate::config::RuntimeConfig {
            max_lookup_depth: 2,
            ..Default::default()
        };
        let rt = Runtime::with_config(cfg).unwrap();
        let c = MapRef::new(MapKind::Class);
        c.insert(Value::from("k"), Value::from(1));
        let b = MapRef::with_meta(MapKind::Class, c);
        let a = MapRef::with_meta(MapKind::Class, b);
        assert!(rt.resolve(&a, &Value::from("k")).unwrap_err().is_runtime_error());
    }
}
