//! The runtime context threaded through every object operation.

use kestrel_core::{Function, Host, MapKind, MapRef, ObjError, ObjResult, Str, Value};

use crate::config::RuntimeConfig;
use crate::executor::{Executor, NoExecutor};
use crate::gc::{Collector, Heap};
use crate::intrinsics;

pub struct Runtime {
    config: RuntimeConfig,
    collector: Box<dyn Collector>,
    executor: Box<dyn Executor>,
    /// Module name -> module mapping.
    modules: MapRef,
    builtins: MapRef,
    object: Option<MapRef>,
    list_methods: MapRef,
    string_methods: MapRef,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::build(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> ObjResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RuntimeConfig) -> Self {
        let mut rt = Self {
            config,
            collector: Box::new(Heap::new()),
            executor: Box::new(NoExecutor),
            modules: MapRef::new(MapKind::Raw),
            builtins: MapRef::new(MapKind::Raw),
            object: None,
            list_methods: MapRef::new(MapKind::Raw),
            string_methods: MapRef::new(MapKind::Raw),
        };
        intrinsics::install_methods(&rt);
        if rt.config.install_builtins {
            rt.object = Some(intrinsics::install_builtins(&rt));
        }
        rt
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn set_executor(&mut self, executor: impl Executor + 'static) {
        self.executor = Box::new(executor);
    }

    pub(crate) fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    /// Replace the collector. Values tracked by the previous one are no
    /// longer candidates for cycle reclamation.
    pub fn set_collector(&mut self, collector: impl Collector + 'static) {
        self.collector = Box::new(collector);
    }

    pub fn collector(&self) -> &dyn Collector {
        self.collector.as_ref()
    }

    /// Run a collection pass; returns the number of containers cleared.
    pub fn collect(&self) -> usize {
        self.collector.collect()
    }

    pub fn modules(&self) -> &MapRef {
        &self.modules
    }

    pub fn builtins(&self) -> &MapRef {
        &self.builtins
    }

    pub(crate) fn list_methods(&self) -> &MapRef {
        &self.list_methods
    }

    pub(crate) fn string_methods(&self) -> &MapRef {
        &self.string_methods
    }

    /// The builtin `object` class, absent when builtins are not installed.
    pub fn object_class(&self) -> Option<MapRef> {
        self.object.clone()
    }

    pub fn register_module(&self, name: &str, module: MapRef) {
        self.modules.insert(Value::from(name), Value::Map(module));
    }

    pub fn module(&self, name: &str) -> Option<MapRef> {
        match self.modules.get(&Value::from(name)) {
            Some(Value::Map(m)) => Some(m),
            _ => None,
        }
    }

    /// Find `function` in the module registered as `module`.
    pub fn resolve_module_function(&self, module: &str, function: &str) -> ObjResult<Value> {
        let Some(m) = self.module(module) else {
            return Err(ObjError::key_error(
                "resolve_module_function",
                format!("no module '{}'", module),
            ));
        };
        m.get(&Value::from(function)).ok_or_else(|| {
            ObjError::key_error(
                "resolve_module_function",
                format!("module '{}' has no '{}'", module, function),
            )
        })
    }

    /// Register a heap value with the collector and hand it back.
    pub fn track(&self, value: Value) -> Value {
        self.collector.track(&value);
        value
    }

    pub(crate) fn mark(&self, value: Value) -> Value {
        self.collector.mark_reachable(&value);
        value
    }

    // --- tracked constructors ---

    pub fn string(&self, s: &str) -> Value {
        Value::string_from_str(s)
    }

    pub fn list(&self, items: Vec<Value>) -> Value {
        self.track(Value::list_from(items))
    }

    /// A fresh RAW dictionary.
    pub fn dict(&self) -> Value {
        self.track(Value::dict_new())
    }

    pub fn dict_with_kind(&self, kind: MapKind) -> Value {
        self.track(Value::dict_with_kind(kind))
    }

    /// A fresh OBJECT instance of `class`.
    pub fn object(&self, class: Option<MapRef>) -> MapRef {
        let obj = MapRef::new(MapKind::Object);
        obj.set_meta(class);
        self.collector.track(&Value::Map(obj.clone()));
        obj
    }

    /// A fresh INTERFACE class. Without an explicit parent it derives from
    /// the builtin `object` class.
    pub fn class(&self, parent: Option<MapRef>) -> MapRef {
        let class = MapRef::new(MapKind::Interface);
        class.set_meta(parent.or_else(|| self.object.clone()));
        self.collector.track(&Value::Map(class.clone()));
        class
    }

    pub fn native<F>(&self, f: F) -> Value
    where
        F: Fn(&dyn Host, Vec<Value>) -> ObjResult<Value> + 'static,
    {
        self.track(Value::function_from_native(f))
    }

    /// A native function already bound to `receiver`.
    pub fn method<F>(&self, receiver: Value, f: F) -> Value
    where
        F: Fn(&dyn Host, Vec<Value>) -> ObjResult<Value> + 'static,
    {
        self.track(Value::Function(Function::from_native(f).bind(receiver)))
    }

    pub fn function_from_code(&self, code: Value, globals: Value) -> Value {
        self.track(Value::function_from_code(code, globals))
    }
}

impl Host for Runtime {
    fn get(&self, obj: &Value, key: &Value) -> ObjResult<Value> {
        Runtime::get(self, obj, key)
    }

    fn set(&self, obj: &Value, key: Value, value: Value) -> ObjResult<()> {
        Runtime::set(self, obj, key, value)
    }

    fn has(&self, obj: &Value, key: &Value) -> ObjResult<bool> {
        Runtime::has(self, obj, key)
    }

    fn del(&self, obj: &Value, key: &Value) -> ObjResult<()> {
        Runtime::del(self, obj, key)
    }

    fn len(&self, obj: &Value) -> ObjResult<usize> {
        Runtime::len(self, obj)
    }

    fn copy(&self, obj: &Value) -> ObjResult<Value> {
        Runtime::copy(self, obj)
    }

    fn call(&self, func: &Value, args: Vec<Value>) -> ObjResult<Value> {
        Runtime::call(self, func, args)
    }

    fn str(&self, value: &Value) -> ObjResult<Str> {
        Runtime::str(self, value)
    }

    fn repr(&self, value: &Value) -> ObjResult<Str> {
        Runtime::repr(self, value)
    }

    fn resolve(&self, map: &MapRef, key: &Value) -> ObjResult<Option<Value>> {
        Runtime::resolve(self, map, key)
    }

    fn track(&self, value: Value) -> Value {
        Runtime::track(self, value)
    }

    fn object_class(&self) -> Option<MapRef> {
        Runtime::object_class(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_module_registered() {
        let rt = Runtime::new();
        assert!(rt.module("__builtins__").is_some());
        assert!(rt.object_class().is_some());
        let format = rt.resolve_module_function("__builtins__", "format").unwrap();
        assert!(format.as_function().is_some());
    }

    #[test]
    fn test_missing_module_function_is_key_error() {
        let rt = Runtime::new();
        assert!(rt.resolve_module_function("nope", "format").unwrap_err().is_key_error());
        assert!(rt
            .resolve_module_function("__builtins__", "nope")
            .unwrap_err()
            .is_key_error());
    }

    #[test]
    fn test_without_builtins() {
        let cfg = RuntimeConfig {
            install_builtins: false,
            ..Default::default()
        };
        let rt = Runtime::with_config(cfg).unwrap();
        assert!(rt.module("__builtins__").is_none());
        assert!(rt.object_class().is_none());
        // list methods are part of the access protocol and always present
        let l = rt.list(vec![]);
        assert!(rt.get(&l, &Value::from("append")).is_ok());
    }

    #[test]
    fn test_class_defaults_to_object_parent() {
        let rt = Runtime::new();
        let class = rt.class(None);
        assert_eq!(class.kind(), MapKind::Interface);
        assert!(class.meta().unwrap().ptr_eq(&rt.object_class().unwrap()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = RuntimeConfig {
            max_lookup_depth: 0,
            ..Default::default()
        };
        assert!(Runtime::with_config(cfg).is_err());
    }
}
