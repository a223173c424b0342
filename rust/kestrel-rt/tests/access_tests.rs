//! Access protocol over dictionaries, lists and strings.

use kestrel_rt::{MapKind, Runtime, Value};
use proptest::prelude::*;

// ============================================================================
// DICTIONARIES
// ============================================================================

#[test]
fn test_dict_set_get_del() {
    let rt = Runtime::new();
    let d = rt.dict();
    rt.set(&d, Value::from("a"), Value::from(1)).unwrap();
    rt.set(&d, Value::from(2), Value::from("two")).unwrap();
    assert_eq!(rt.get(&d, &Value::from("a")).unwrap(), Value::from(1));
    assert_eq!(rt.get(&d, &Value::from(2.0)).unwrap(), Value::from("two"));
    assert!(rt.has(&d, &Value::from("a")).unwrap());
    assert_eq!(rt.len(&d).unwrap(), 2);

    rt.del(&d, &Value::from("a")).unwrap();
    assert!(!rt.has(&d, &Value::from("a")).unwrap());
    assert!(rt.get(&d, &Value::from("a")).unwrap_err().is_key_error());
    assert!(rt.del(&d, &Value::from("a")).unwrap_err().is_key_error());
}

#[test]
fn test_dict_iteration_follows_insertion_order() {
    let rt = Runtime::new();
    let d = rt.dict();
    for k in ["z", "y", "x"] {
        rt.set(&d, Value::from(k), Value::None).unwrap();
    }
    let n = rt.len(&d).unwrap();
    let keys: Vec<Value> = (0..n).map(|i| rt.iter(&d, i).unwrap()).collect();
    assert_eq!(keys, vec![Value::from("z"), Value::from("y"), Value::from("x")]);
}

#[test]
fn test_copy_is_independent_but_shares_meta() {
    let rt = Runtime::new();
    let class = rt.class(None);
    let obj = Value::Map(rt.object(Some(class.clone())));
    rt.set(&obj, Value::from("x"), Value::from(1)).unwrap();

    let dup = rt.copy(&obj).unwrap();
    rt.set(&dup, Value::from("x"), Value::from(2)).unwrap();
    assert_eq!(rt.get(&obj, &Value::from("x")).unwrap(), Value::from(1));
    assert_eq!(rt.get(&dup, &Value::from("x")).unwrap(), Value::from(2));

    let dup_map = dup.as_map().unwrap();
    assert_eq!(dup_map.kind(), MapKind::Object);
    assert!(dup_map.meta().unwrap().ptr_eq(&class));
}

// ============================================================================
// LISTS
// ============================================================================

#[test]
fn test_list_negative_index_and_append() {
    let rt = Runtime::new();
    let l = rt.list(vec![Value::from(1), Value::from(2)]);
    rt.set(&l, Value::None, Value::from(3)).unwrap();
    assert_eq!(rt.get(&l, &Value::from(-1)).unwrap(), Value::from(3));
    rt.set(&l, Value::from(-1), Value::from(30)).unwrap();
    assert_eq!(rt.get(&l, &Value::from(2)).unwrap(), Value::from(30));
    assert!(rt.get(&l, &Value::from(3)).unwrap_err().is_key_error());
    assert!(rt.set(&l, Value::from(-4), Value::None).unwrap_err().is_key_error());
}

#[test]
fn test_list_extend_through_star_key() {
    let rt = Runtime::new();
    let l = rt.list(vec![Value::from(1)]);
    let more = rt.list(vec![Value::from(2), Value::from(3)]);
    rt.set(&l, Value::from("*"), more).unwrap();
    assert_eq!(rt.len(&l).unwrap(), 3);
    assert!(rt.set(&l, Value::from("*"), Value::from(4)).unwrap_err().is_type_error());
}

#[test]
fn test_list_slice_clamps() {
    let rt = Runtime::new();
    let l = rt.list((0..5).map(Value::from).collect());
    let pair = rt.list(vec![Value::from(1), Value::from(3)]);
    assert_eq!(rt.repr(&rt.get(&l, &pair).unwrap()).unwrap(), "[1, 2]");
    let open = rt.list(vec![Value::from(-2), Value::None]);
    assert_eq!(rt.repr(&rt.get(&l, &open).unwrap()).unwrap(), "[3, 4]");
    let wide = rt.list(vec![Value::from(-100), Value::from(100)]);
    assert_eq!(rt.len(&rt.get(&l, &wide).unwrap()).unwrap(), 5);
}

#[test]
fn test_list_membership_and_unsupported_ops() {
    let rt = Runtime::new();
    let l = rt.list(vec![Value::from("a"), Value::from(1)]);
    assert!(rt.has(&l, &Value::from(1)).unwrap());
    assert!(!rt.has(&l, &Value::from("b")).unwrap());
    assert!(rt.del(&l, &Value::from(0)).unwrap_err().is_type_error());
    assert!(rt.has(&Value::from(1), &Value::from(1)).unwrap_err().is_type_error());
    assert!(rt.len(&Value::None).unwrap_err().is_type_error());
}

// ============================================================================
// STRINGS
// ============================================================================

#[test]
fn test_string_index_slice_and_contains() {
    let rt = Runtime::new();
    let s = Value::from("012345");
    assert_eq!(rt.get(&s, &Value::from(-1)).unwrap(), Value::from("5"));
    let pair = rt.list(vec![Value::from(1), Value::from(3)]);
    assert_eq!(rt.get(&s, &pair).unwrap(), Value::from("12"));
    assert!(rt.has(&s, &Value::from("234")).unwrap());
    assert!(!rt.has(&s, &Value::from("9")).unwrap());
    assert!(rt.set(&s, Value::from(0), Value::from("x")).unwrap_err().is_type_error());
}

#[test]
fn test_iteration_over_non_sequence() {
    let rt = Runtime::new();
    assert!(rt.iter(&Value::from(3), 0).unwrap_err().is_type_error());
    assert_eq!(rt.iter(&Value::from("ab"), 1).unwrap(), Value::from("b"));
}

proptest! {
    #[test]
    fn prop_dict_get_returns_last_set(
        keys in prop::collection::vec(0i32..20, 1..40),
        value in -1000i32..1000,
    ) {
        let rt = Runtime::new();
        let d = rt.dict();
        for (i, k) in keys.iter().enumerate() {
            rt.set(&d, Value::from(*k), Value::from(i)).unwrap();
        }
        let last = *keys.last().unwrap();
        rt.set(&d, Value::from(last), Value::from(value)).unwrap();
        prop_assert_eq!(rt.get(&d, &Value::from(last)).unwrap(), Value::from(value));

        let mut distinct = keys.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(rt.len(&d).unwrap(), distinct.len());
    }

    #[test]
    fn prop_append_grows_by_one(initial in 0usize..30, pushes in 1usize..30) {
        let rt = Runtime::new();
        let l = rt.list((0..initial).map(Value::from).collect());
        for i in 0..pushes {
            let before = rt.len(&l).unwrap();
            rt.set(&l, Value::None, Value::from(i)).unwrap();
            prop_assert_eq!(rt.len(&l).unwrap(), before + 1);
            prop_assert_eq!(rt.get(&l, &Value::from(-1)).unwrap(), Value::from(i));
        }
    }
}
