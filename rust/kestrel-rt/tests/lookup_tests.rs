//! Meta-chain resolution and method rebinding.

use kestrel_rt::{MapKind, MapRef, Runtime, RuntimeConfig, Value};

fn chain(len: usize) -> Vec<MapRef> {
    let maps: Vec<MapRef> = (0..len).map(|_| MapRef::new(MapKind::Object)).collect();
    for pair in maps.windows(2) {
        pair[0].set_meta(Some(pair[1].clone()));
    }
    maps
}

#[test]
fn test_method_found_two_levels_up_binds_receiver() {
    let rt = Runtime::new();
    let a = MapRef::new(MapKind::Object);
    let b = MapRef::new(MapKind::Interface);
    let c = MapRef::new(MapKind::Interface);
    a.set_meta(Some(b.clone()));
    b.set_meta(Some(c.clone()));
    c.insert(Value::from("whoami"), rt.native(|_, args| Ok(args[0].clone())));

    let found = rt.resolve(&a, &Value::from("whoami")).unwrap().unwrap();
    let f = found.as_function().unwrap();
    assert!(f.is_method());
    assert_eq!(f.bound_self().unwrap().as_map().unwrap().addr(), a.addr());

    let got = rt.call(&found, vec![]).unwrap();
    assert!(got.as_map().unwrap().ptr_eq(&a));
}

#[test]
fn test_plain_values_are_not_rebound() {
    let rt = Runtime::new();
    let maps = chain(3);
    maps[2].insert(Value::from("n"), Value::from(42));
    assert_eq!(rt.get(&Value::Map(maps[0].clone()), &Value::from("n")).unwrap(), Value::from(42));
    assert!(rt.resolve(&maps[0], &Value::from("missing")).unwrap().is_none());
}

#[test]
fn test_self_meta_exhausts_depth() {
    let rt = Runtime::new();
    let a = MapRef::new(MapKind::Object);
    a.set_meta(Some(a.clone()));
    let err = rt.resolve(&a, &Value::from("nope")).unwrap_err();
    assert!(err.is_runtime_error());
    assert!(err.message_contains("maximum lookup depth"));
    // break the cycle so the test does not leak
    a.set_meta(None);
}

#[test]
fn test_depth_counts_every_probed_mapping() {
    let rt = Runtime::new();
    let short = chain(7);
    assert!(rt.resolve(&short[0], &Value::from("k")).unwrap().is_none());
    let long = chain(8);
    assert!(rt.resolve(&long[0], &Value::from("k")).unwrap_err().is_runtime_error());
}

#[test]
fn test_configured_depth_is_honored() {
    let config = RuntimeConfig {
        max_lookup_depth: 3,
        ..RuntimeConfig::default()
    };
    let rt = Runtime::with_config(config).unwrap();
    let maps = chain(4);
    maps[3].insert(Value::from("k"), Value::from(1));
    assert!(rt.resolve(&maps[0], &Value::from("k")).unwrap_err().is_runtime_error());
    assert_eq!(rt.resolve(&maps[1], &Value::from("k")).unwrap(), Some(Value::from(1)));
}

#[test]
fn test_raw_view_ignores_meta() {
    let rt = Runtime::new();
    let maps = chain(2);
    maps[1].insert(Value::from("inherited"), Value::from(1));
    let raw = Value::Map(maps[0].with_kind(MapKind::Raw));
    assert!(rt.get(&raw, &Value::from("inherited")).unwrap_err().is_key_error());
}
