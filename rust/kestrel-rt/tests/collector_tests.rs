//! Cycle reclamation through the runtime's collector.

use kestrel_rt::{Collector, HeapStats, Runtime, Value};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_dropped_instance_cycle_is_reclaimed() {
    let rt = Runtime::new();
    let class = rt.class(None);
    let weak = {
        let obj = rt.object(Some(class.clone()));
        let value = Value::Map(obj.clone());
        rt.set(&value, Value::from("me"), value.clone()).unwrap();
        obj.downgrade()
    };
    assert!(weak.is_alive());
    assert!(rt.collect() >= 1);
    assert!(!weak.is_alive());
    // the class is still held here and must survive
    assert_eq!(class.len(), 0);
}

#[test]
fn test_reclaimed_count_excludes_functions() {
    let rt = Runtime::new();
    let before = rt.collector().stats();
    let weak = {
        let globals = rt.dict();
        let f = rt.function_from_code(Value::from("<code>"), globals.clone());
        rt.set(&globals, Value::from("main"), f).unwrap();
        match &globals {
            Value::Map(m) => m.downgrade(),
            _ => unreachable!(),
        }
    };
    assert_eq!(rt.collect(), 1);
    assert!(!weak.is_alive());
    assert_eq!(rt.collector().stats().reclaimed, before.reclaimed + 1);
}

#[test]
fn test_live_cycle_survives_collection() {
    let rt = Runtime::new();
    let l = rt.list(vec![]);
    rt.set(&l, Value::None, l.clone()).unwrap();
    rt.collect();
    assert_eq!(rt.len(&l).unwrap(), 1);
    assert_eq!(rt.repr(&l).unwrap(), "[[...]]");
    // break it by hand before the handle goes away
    rt.get(&l, &Value::None).unwrap();
}

#[test]
fn test_stats_reflect_runtime_activity() {
    let rt = Runtime::new();
    let before = rt.collector().stats();
    let d = rt.dict();
    rt.set(&d, Value::from("xs"), rt.list(vec![])).unwrap();
    rt.get(&d, &Value::from("xs")).unwrap();
    rt.collect();
    let after = rt.collector().stats();
    assert_eq!(after.tracked_maps, before.tracked_maps + 1);
    assert_eq!(after.tracked_lists, before.tracked_lists + 1);
    assert!(after.marks > before.marks);
    assert_eq!(after.collections, before.collections + 1);
}

/// Collector that only counts, for checking which operations report values.
#[derive(Default)]
struct Counting {
    tracked: Rc<Cell<usize>>,
    marked: Rc<Cell<usize>>,
}

impl Collector for Counting {
    fn track(&self, _value: &Value) {
        self.tracked.set(self.tracked.get() + 1);
    }

    fn mark_reachable(&self, _value: &Value) {
        self.marked.set(self.marked.get() + 1);
    }

    fn collect(&self) -> usize {
        0
    }

    fn stats(&self) -> HeapStats {
        HeapStats::default()
    }
}

#[test]
fn test_custom_collector_sees_constructors_and_results() {
    let mut rt = Runtime::new();
    let counting = Counting::default();
    let (tracked, marked) = (counting.tracked.clone(), counting.marked.clone());
    rt.set_collector(counting);

    let l = rt.list(vec![Value::from(1)]);
    assert_eq!(tracked.get(), 1);
    rt.get(&l, &Value::from(0)).unwrap();
    assert_eq!(marked.get(), 1);
    let f = rt.native(|_, _| Ok(Value::None));
    rt.call(&f, vec![]).unwrap();
    assert_eq!(tracked.get(), 2);
    assert_eq!(marked.get(), 2);
    assert_eq!(rt.collect(), 0);
}
