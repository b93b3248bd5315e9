//! Dispatch, idempotence and transparency of `wrap`.

use std::sync::{Arc, Mutex};

use deferkv::{wrap, Error, PromiseExt, Target};
use deferkv_callback::{
    args, Callback, ClientOptions, Handle, Kind, Object, ObjectExt, Property, Value,
};
use deferkv_memory::MemoryLibrary;

fn library() -> Handle {
    MemoryLibrary::new()
}

fn client() -> Handle {
    MemoryLibrary::new().connect(ClientOptions::default())
}

fn capture() -> (Arc<Mutex<Option<Value>>>, Callback) {
    let reply = Arc::new(Mutex::new(None));
    let sink = reply.clone();
    (reply, Box::new(move |_, value| *sink.lock().unwrap() = value))
}

#[test]
fn wrapping_is_idempotent_for_every_shape() {
    let builder = client().call("multi", args![]).unwrap().into_object().unwrap();
    for target in [library(), client(), builder] {
        let once = wrap(&target).unwrap();
        let twice = wrap(&once).unwrap();
        assert!(Arc::ptr_eq(&once, &twice));
        assert!(!Arc::ptr_eq(&once, &target));
    }
}

#[test]
fn wrapped_objects_keep_kind_and_type_name() {
    let library = library();
    let wrapped = wrap(&library).unwrap();
    assert_eq!(wrapped.kind(), Kind::Library);
    assert_eq!(wrapped.type_name(), "MemoryLibrary");
    assert_eq!(wrapped.keys(), library.keys());

    let client = client();
    let wrapped = wrap(&client).unwrap();
    assert_eq!(wrapped.kind(), Kind::Client);
    assert_eq!(wrapped.type_name(), "MemoryClient");
    assert_eq!(wrapped.keys(), client.keys());
}

#[test]
fn wrapped_probe_is_not_a_property() {
    let wrapped = wrap(client()).unwrap();
    assert!(wrapped.is_wrapped());
    assert!(wrapped.keys().iter().all(|k| !k.contains("wrapped")));
}

#[test]
fn original_client_still_uses_callbacks() {
    let client = client();
    let set_before = client.function("set").unwrap();
    let wrapped = wrap(&client).unwrap();
    assert!(!client.is_wrapped());
    assert!(client.function("set").unwrap().ptr_eq(&set_before));
    assert!(!wrapped.function("set").unwrap().ptr_eq(&set_before));

    let (reply, callback) = capture();
    let output = client.call("set", args!["hello", "world", callback]).unwrap();
    assert!(output.into_deferred().is_err());
    assert_eq!(*reply.lock().unwrap(), Some(Value::ok()));
}

fn snapshot(target: &Handle) -> Vec<(String, Property)> {
    target
        .keys()
        .into_iter()
        .filter_map(|key| target.get(&key).map(|property| (key, property)))
        .collect()
}

fn assert_unchanged(target: &Handle, before: &[(String, Property)]) {
    let after = snapshot(target);
    assert_eq!(after.len(), before.len());
    for ((key, was), (again, now)) in before.iter().zip(&after) {
        assert_eq!(key, again);
        match (was, now) {
            (Property::Function(a), Property::Function(b)) => {
                assert!(a.ptr_eq(b), "{key} changed identity")
            }
            (Property::Value(a), Property::Value(b)) => assert_eq!(a, b, "{key} changed value"),
            _ => panic!("{key} changed shape"),
        }
    }
}

#[test]
fn wrapping_leaves_every_property_of_the_original_alone() {
    let library = library();
    let client = client();
    let builder = client.call("batch", args![]).unwrap().into_object().unwrap();

    for target in [library, client, builder] {
        let before = snapshot(&target);
        assert!(!before.is_empty());

        let wrapped = wrap(&target).unwrap();
        for key in wrapped.keys() {
            let _ = wrapped.get(&key);
        }
        assert_unchanged(&target, &before);
        assert!(!target.is_wrapped());
    }
}

#[test]
fn non_command_properties_keep_identity() {
    let library = library();
    let wrapped = wrap(&library).unwrap();
    assert!(wrapped
        .function("add_command")
        .unwrap()
        .ptr_eq(&library.function("add_command").unwrap()));
    assert_eq!(wrapped.value("version"), library.value("version"));

    let client = client();
    let wrapped = wrap(&client).unwrap();
    assert!(wrapped
        .function("on")
        .unwrap()
        .ptr_eq(&client.function("on").unwrap()));
    assert_eq!(wrapped.value("selected_db"), Some(Value::Integer(0)));
    assert!(wrapped.get("no_such_property").is_none());
}

#[test]
fn converted_commands_keep_their_name() {
    let client = client();
    let wrapped = wrap(&client).unwrap();
    assert_eq!(wrapped.function("hgetall").unwrap().name(), "hgetall");
}

#[test]
fn invalid_targets_are_rejected() {
    let other: Handle = Arc::new(Opaque);
    let cases: Vec<(Target, &str)> = vec![
        (Target::Undefined, "undefined"),
        (Value::Null.into(), "null"),
        (Value::from(7_i64).into(), "number"),
        (Value::from("client").into(), "string"),
        (other.into(), "Opaque"),
    ];
    for (target, actual) in cases {
        match wrap(target) {
            Err(Error::ArgumentType {
                argument,
                actual: got,
                ..
            }) => {
                assert_eq!(argument, "target");
                assert_eq!(got, actual);
            }
            Ok(_) => panic!("wrapping {actual} should fail"),
        }
    }
}

#[tokio::test]
async fn any_library_instance_is_recognised() {
    let first = wrap(library()).unwrap();
    let second = wrap(library()).unwrap();
    for library in [first, second] {
        let client = library
            .call("create_client", args![])
            .unwrap()
            .into_object()
            .unwrap();
        assert!(client.is_wrapped());
        let reply = client.command("ping", args![]).unwrap().await.unwrap();
        assert_eq!(reply, Value::status("PONG"));
    }
}

struct Opaque;

impl Object for Opaque {
    fn kind(&self) -> Kind {
        Kind::Other
    }

    fn type_name(&self) -> &str {
        "Opaque"
    }

    fn get(&self, _name: &str) -> Option<Property> {
        None
    }

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }
}
