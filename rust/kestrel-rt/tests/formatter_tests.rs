//! `str` / `repr` output, override hooks and cycle placeholders.

use kestrel_rt::{Runtime, Value};

#[test]
fn test_numbers() {
    let rt = Runtime::new();
    assert_eq!(rt.str(&Value::from(3.0)).unwrap(), "3");
    assert_eq!(rt.str(&Value::from(-42)).unwrap(), "-42");
    assert_eq!(rt.str(&Value::from(3.5)).unwrap(), "3.500000");
    assert_eq!(rt.str(&Value::from(2.0000001)).unwrap(), "2");
}

#[test]
fn test_string_quoting() {
    let rt = Runtime::new();
    assert_eq!(rt.str(&Value::from("a'b")).unwrap(), "a'b");
    assert_eq!(rt.repr(&Value::from("a'b")).unwrap(), "'a\\'b'");
    assert_eq!(rt.repr(&Value::from("x\n\t\"")).unwrap(), "'x\\n\\t\\\"'");
}

#[test]
fn test_containers_and_placeholders() {
    let rt = Runtime::new();
    let d = rt.dict();
    rt.set(&d, Value::from("k"), Value::from(1)).unwrap();
    rt.set(&d, Value::from(2), Value::None).unwrap();
    assert_eq!(rt.repr(&d).unwrap(), "{'k': 1, 2: None}");

    let f = rt.native(|_, _| Ok(Value::None));
    assert!(rt.str(&f).unwrap().to_string_lossy().starts_with("<func 0x"));
}

#[test]
fn test_self_containing_list_prints_placeholder_once() {
    let rt = Runtime::new();
    let l = rt.list(vec![Value::from(1)]);
    rt.set(&l, Value::None, l.clone()).unwrap();
    let out = rt.repr(&l).unwrap().to_string_lossy().into_owned();
    assert_eq!(out, "[1, [...]]");
    assert_eq!(out.matches("[...]").count(), 1);
}

#[test]
fn test_self_containing_dict() {
    let rt = Runtime::new();
    let d = rt.dict();
    rt.set(&d, Value::from("me"), d.clone()).unwrap();
    assert_eq!(rt.repr(&d).unwrap(), "{'me': {...}}");
}

#[test]
fn test_shared_but_acyclic_container_is_printed_twice() {
    let rt = Runtime::new();
    let inner = rt.list(vec![Value::from(0)]);
    let outer = rt.list(vec![inner.clone(), inner]);
    assert_eq!(rt.repr(&outer).unwrap(), "[[0], [0]]");
}

#[test]
fn test_str_hook_on_instance() {
    let rt = Runtime::new();
    let class = rt.class(None);
    class.insert(
        Value::from("__str__"),
        rt.native(|host, args| {
            let name = host.get(&args[0], &Value::from("name"))?;
            Ok(Value::String(host.str(&name)?))
        }),
    );
    let obj = Value::Map(rt.object(Some(class)));
    rt.set(&obj, Value::from("name"), Value::from("rex")).unwrap();
    assert_eq!(rt.str(&obj).unwrap(), "rex");

    let l = rt.list(vec![obj]);
    assert_eq!(rt.str(&l).unwrap(), "[rex]");
}

#[test]
fn test_repr_hook_spelling_applies_in_both_modes() {
    let rt = Runtime::new();
    let class = rt.class(None);
    class.insert(Value::from("__repr___"), rt.native(|_, _| Ok(Value::from("<thing>"))));
    let obj = Value::Map(rt.object(Some(class)));
    assert_eq!(rt.repr(&obj).unwrap(), "<thing>");
    assert_eq!(rt.str(&obj).unwrap(), "<thing>");
}

#[test]
fn test_hook_must_return_string() {
    let rt = Runtime::new();
    let class = rt.class(None);
    class.insert(Value::from("__str__"), rt.native(|_, _| Ok(Value::from(5))));
    let obj = Value::Map(rt.object(Some(class)));
    assert!(rt.str(&obj).unwrap_err().is_type_error());
    // repr mode never consults __str__
    assert!(rt.repr(&obj).is_ok());
}
