mod common;

use common::*;
use nsplug::framework::{Func, Namespace, Object};
use nsplug::{Context, Engine, Error, GetKey, GetReq, Value};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;

fn get(keys: &[&str]) -> GetReq {
    GetReq::new(42, keys.iter().map(|k| GetKey::get(*k)).collect())
}

fn context(pairs: &[(&str, &str)]) -> Context {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), string(v)))
        .collect()
}

fn expect_err<R: nsplug::framework::Root + 'static>(root: R, req: GetReq, message: &str) {
    let err = run(root, &[req]).unwrap_err();
    assert_eq!(err.to_string(), message);
}

// ---------------------------------------------------------------------------
// Configure

#[test]
fn configure_rejects_roots_without_a_namespace() {
    let err = Engine::new(RootNoImpl)
        .configure(&Context::new())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRoot));
    assert!(err.is_configuration());
}

#[test]
fn configure_accepts_namespace_and_creator_roots() {
    Engine::new(Embed::new(GetErr))
        .configure(&Context::new())
        .unwrap();
    Engine::new(RootCounter::default())
        .configure(&Context::new())
        .unwrap();
}

// ---------------------------------------------------------------------------
// Lookups

#[test]
fn key_get() {
    let root = Embed::new(KeyValue::new("foo", Object::value("bar")));
    assert_eq!(
        run(root, &[get(&["foo"])]).unwrap(),
        vec![result(42, &["foo"], string("bar"))]
    );
}

#[test]
fn key_get_nil_is_undefined() {
    let root = Embed::new(KeyValue::new("foo", Object::Nil));
    assert_eq!(
        run(root, &[get(&["foo"])]).unwrap(),
        vec![result(42, &["foo"], Value::Undefined)]
    );
}

#[test]
fn key_get_map_with_nil_value() {
    let root = Embed::new(KeyValue::new(
        "foo",
        Object::map_of([("bar", Object::Nil)]),
    ));
    let results = run(root, &[get(&["foo"])]).unwrap();
    assert_eq!(results[0].value, Value::map_of([("bar", Value::Null)]));
}

#[test]
fn key_get_unknown() {
    let root = Embed::new(KeyValue::new("foo", Object::value("bar")));
    assert_eq!(
        run(root, &[get(&["unknown"])]).unwrap(),
        vec![result(42, &["unknown"], Value::Undefined)]
    );
}

#[test]
fn key_get_nested() {
    let root = Embed::new(KeyValue::new(
        "foo",
        Object::namespace(KeyValue::new("child", Object::value("bar"))),
    ));
    assert_eq!(
        run(root, &[get(&["foo", "child"])]).unwrap(),
        vec![result(42, &["foo", "child"], string("bar"))]
    );
}

#[test]
fn key_get_nested_unknown() {
    let root = Embed::new(KeyValue::new(
        "foo",
        Object::namespace(KeyValue::new("child", Object::value("bar"))),
    ));
    assert_eq!(
        run(root, &[get(&["foo", "unknown"])]).unwrap(),
        vec![result(42, &["foo", "unknown"], Value::Undefined)]
    );
}

#[test]
fn key_get_map_value() {
    let root = Embed::new(KeyValue::new(
        "foo",
        Object::map_of([("child", Object::value("bar"))]),
    ));
    assert_eq!(
        run(root, &[get(&["foo", "child"])]).unwrap()[0].value,
        string("bar")
    );
}

#[test]
fn key_get_typed_map_value() {
    let mut typed = HashMap::new();
    typed.insert("child".to_string(), 84i64);
    let root = Embed::new(KeyValue::new("foo", Object::value(typed)));

    let results = run(root, &[get(&["foo", "child"]), get(&["foo", "nope"])]).unwrap();
    assert_eq!(results[0].value, Value::Int(84));
    assert_eq!(results[1].value, Value::Undefined);
}

#[test]
fn key_get_stops_at_first_absence() {
    let root = Embed::new(KeyValue::new("foo", Object::value("bar")));
    assert_eq!(
        run(root, &[get(&["nope", "deeper", "deepest"])]).unwrap()[0].value,
        Value::Undefined
    );
}

#[test]
fn missing_map_key_stops_before_a_later_call() {
    let chain = || {
        GetReq::new(
            42,
            vec![
                GetKey::get("foo"),
                GetKey::get("missing"),
                GetKey::call("f", vec![]),
            ],
        )
    };

    let object_map = Embed::new(KeyValue::new(
        "foo",
        Object::map_of([("child", Object::value("bar"))]),
    ));
    assert_eq!(
        run(object_map, &[chain()]).unwrap(),
        vec![result(42, &["foo", "missing", "f"], Value::Undefined)]
    );

    let mut typed = HashMap::new();
    typed.insert("child".to_string(), 84i64);
    let typed_map = Embed::new(KeyValue::new("foo", Object::value(typed)));
    assert_eq!(run(typed_map, &[chain()]).unwrap()[0].value, Value::Undefined);

    let namespace = Embed::new(KeyValue::new("foo", Object::value("bar")));
    let req = GetReq::new(42, vec![GetKey::get("nope"), GetKey::call("f", vec![])]);
    assert_eq!(run(namespace, &[req]).unwrap()[0].value, Value::Undefined);
}

#[test]
fn map_values_that_are_namespaces_are_flattened() {
    let root = Embed::new(KeyValue::new(
        "foo",
        Object::map_of([(
            "child",
            Object::namespace(KeyValueMap::of([(
                "foo",
                Object::namespace(KeyValueMap::of([("bar", Object::value("baz"))])),
            )])),
        )]),
    ));

    let expected = Value::map_of([(
        "child",
        Value::map_of([("foo", Value::map_of([("bar", string("baz"))]))]),
    )]);
    assert_eq!(run(root, &[get(&["foo"])]).unwrap()[0].value, expected);
}

#[test]
fn list_values_that_are_namespaces_are_flattened() {
    let root = Embed::new(KeyValue::new(
        "foo",
        Object::List(vec![Object::namespace(KeyValueMap::of([(
            "foo",
            Object::value("bar"),
        )]))]),
    ));
    assert_eq!(
        run(root, &[get(&["foo"])]).unwrap()[0].value,
        Value::List(vec![Value::map_of([("foo", string("bar"))])])
    );
}

#[test]
fn mappable_namespace_result_becomes_its_map() {
    let root = Embed::new(KeyValue::new(
        "foo",
        Object::namespace(KeyValueMap::of([
            ("key", Object::value("value")),
            ("another", Object::value("value")),
        ])),
    ));
    assert_eq!(
        run(root, &[get(&["foo"])]).unwrap()[0].value,
        Value::map_of([("key", string("value")), ("another", string("value"))])
    );
}

#[test]
fn non_mappable_namespace_result_is_an_error() {
    let root = Embed::new(KeyValue::new(
        "foo",
        Object::namespace(KeyValue::new("child", Object::value("bar"))),
    ));
    let err = run(root, &[get(&["foo"])]).unwrap_err();
    assert!(matches!(err, Error::Flatten { ref path, .. } if path == "foo"));
}

#[test]
fn multiple_requests_keep_their_key_ids() {
    let root = Embed::new(KeyValueMap::of([
        ("foo", Object::value("foovalue")),
        ("bar", Object::value("barvalue")),
    ]));
    let reqs = [
        GetReq::new(1, vec![GetKey::get("foo")]),
        GetReq::new(3, vec![GetKey::get("bar")]),
    ];
    assert_eq!(
        run(root, &reqs).unwrap(),
        vec![
            result(1, &["foo"], string("foovalue")),
            result(3, &["bar"], string("barvalue")),
        ]
    );
}

#[test]
fn bad_get() {
    expect_err(
        Embed::new(GetErr),
        get(&["foo"]),
        r#"error retrieving key "foo": get error"#,
    );
}

#[test]
fn bad_map() {
    expect_err(
        Embed::new(KeyValue::new("foo", Object::namespace(MapErr))),
        get(&["foo"]),
        r#"error retrieving key "foo": map error"#,
    );
}

// ---------------------------------------------------------------------------
// Calls

fn echo() -> CallNs {
    CallNs(Func::new(|v: String| Object::value(v)))
}

fn two_level() -> CallNs {
    CallNs(Func::new(|v: String| -> anyhow::Result<Object> {
        if v != "one" {
            anyhow::bail!("expected \"one\", got {v:?}");
        }
        Ok(Object::namespace(CallNs(Func::new(
            |a: i64, b: i64| -> anyhow::Result<Object> {
                if a != 2 && b != 3 {
                    anyhow::bail!("expected: 2, 3; got: {a}, {b}");
                }
                Ok(Object::value("baz"))
            },
        ))))
    }))
}

#[test]
fn key_call() {
    let req = GetReq::new(42, vec![GetKey::call("foo", vec![string("asdf")])]);
    assert_eq!(
        run(Embed::new(echo()), &[req]).unwrap(),
        vec![result(42, &["foo"], string("asdf"))]
    );
}

#[test]
fn key_call_converts_arguments() {
    let req = GetReq::new(42, vec![GetKey::call("foo", vec![Value::Int(42)])]);
    assert_eq!(
        run(Embed::new(echo()), &[req]).unwrap()[0].value,
        string("42")
    );
}

#[test]
fn key_call_with_namespace_return() {
    let root = Embed::new(CallNs(Func::new(|v: String| {
        Object::namespace(KeyValueMap::of([(v.as_str(), Object::value("bar"))]))
    })));
    let req = GetReq::new(42, vec![GetKey::call("foo", vec![string("asdf")])]);
    assert_eq!(
        run(root, &[req]).unwrap()[0].value,
        Value::map_of([("asdf", string("bar"))])
    );
}

#[test]
fn key_call_unsupported() {
    expect_err(
        Embed::new(KeyValue::new("foo", Object::value("bar"))),
        GetReq::new(42, vec![GetKey::call("foo", vec![string("asdf")])]),
        r#"key "foo" doesn't support function calls"#,
    );
}

#[test]
fn key_call_with_wrong_arity() {
    expect_err(
        Embed::new(echo()),
        GetReq::new(42, vec![GetKey::call("foo", vec![])]),
        r#"error calling function "foo": expected 1 arguments, got 0"#,
    );
    expect_err(
        Embed::new(echo()),
        GetReq::new(42, vec![GetKey::call("foo", vec![Value::Int(1), Value::Int(2)])]),
        r#"error calling function "foo": expected 1 arguments, got 2"#,
    );
}

#[test]
fn key_call_with_unconvertible_argument() {
    let err = run(
        Embed::new(echo()),
        &[GetReq::new(42, vec![GetKey::call("foo", vec![Value::Bool(true)])])],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Call {
            source: nsplug::CallError::Argument { index: 0, .. },
            ..
        }
    ));
}

#[test]
fn multiple_levels_multiple_calls() {
    let req = GetReq::new(
        42,
        vec![
            GetKey::call("foo", vec![string("one")]),
            GetKey::call("bar", vec![Value::Int(2), Value::Int(3)]),
        ],
    );
    assert_eq!(
        run(Embed::new(two_level()), &[req]).unwrap(),
        vec![result(42, &["foo", "bar"], string("baz"))]
    );
}

#[test]
fn call_get_call() {
    let root = Embed::new(CallNs(Func::new(|v: String| -> anyhow::Result<Object> {
        if v != "one" {
            anyhow::bail!("expected \"one\", got {v:?}");
        }
        Ok(Object::namespace(KeyValue::new(
            "bar",
            Object::namespace(CallNs(Func::new(|_a: i64, _b: i64| Object::value("qux")))),
        )))
    })));
    let req = GetReq::new(
        42,
        vec![
            GetKey::call("foo", vec![string("one")]),
            GetKey::get("bar"),
            GetKey::call("baz", vec![Value::Int(2), Value::Int(3)]),
        ],
    );
    assert_eq!(
        run(root, &[req]).unwrap(),
        vec![result(42, &["foo", "bar", "baz"], string("qux"))]
    );
}

#[test]
fn multi_level_call_error_names_the_path() {
    let root = Embed::new(KeyValue::new(
        "foo",
        Object::namespace(CallNs(Func::new(|| -> anyhow::Result<Object> {
            anyhow::bail!("foo")
        }))),
    ));
    expect_err(
        root,
        GetReq::new(0, vec![GetKey::get("foo"), GetKey::call("bar", vec![])]),
        r#"error calling function "foo.bar": foo"#,
    );
}

#[test]
fn multi_call_errors() {
    expect_err(
        Embed::new(two_level()),
        GetReq::new(
            42,
            vec![
                GetKey::call("foo", vec![string("bad")]),
                GetKey::call("bar", vec![Value::Int(2), Value::Int(3)]),
            ],
        ),
        r#"error calling function "foo": expected "one", got "bad""#,
    );
    expect_err(
        Embed::new(two_level()),
        GetReq::new(
            42,
            vec![
                GetKey::call("foo", vec![string("one")]),
                GetKey::call("bar", vec![Value::Int(42), Value::Int(43)]),
            ],
        ),
        r#"error calling function "foo.bar": expected: 2, 3; got: 42, 43"#,
    );
}

// ---------------------------------------------------------------------------
// Receivers

#[test]
fn get_with_receiver() {
    let req = get(&["foo"]).with_context(context(&[("a", "b")]));
    let results = run(RootNew::default(), &[req]).unwrap();

    let value = Value::map_of([("result", string("New called"))]);
    let mut expected = result(42, &["foo"], value.clone());
    expected.context = Some(HashMap::from([("foo".to_string(), value)]));
    expected.callable = true;
    assert_eq!(results, vec![expected]);
}

#[test]
fn constructor_receives_the_context() {
    let root = RootNew::with(|data| {
        if data.get("a") == Some(&string("b")) {
            let ok = Object::map_of([("result", Object::value("OK"))]);
            let namespace: Arc<dyn Namespace> = Arc::new(KeyValueMap::of([("foo", ok)]));
            return Ok(Some(namespace));
        }
        Ok(None)
    });
    let req = get(&["foo"]).with_context(context(&[("a", "b")]));
    let results = run(root, &[req]).unwrap();
    assert_eq!(results[0].value, Value::map_of([("result", string("OK"))]));
    assert!(results[0].callable);
}

#[test]
fn call_mutates_the_receiver() {
    let root = RootNew::with(|data| {
        let value = data.get("value").and_then(Value::as_str).unwrap_or_default();
        Ok(Some(Arc::new(Mutable::new(value)) as Arc<dyn Namespace>))
    });
    let req = GetReq::new(42, vec![GetKey::call("foo", vec![string("two")])])
        .with_context(context(&[("value", "one")]));

    let mut expected = result(42, &["foo"], string("OK"));
    expected.context = Some(context(&[("value", "two")]));
    assert_eq!(run(root, &[req]).unwrap(), vec![expected]);
}

#[test]
fn constructible_root_without_context() {
    let mut expected = result(
        42,
        &["foo"],
        Value::map_of([("result", string("New not called (Get)"))]),
    );
    expected.callable = true;
    assert_eq!(
        run(RootNew::default(), &[get(&["foo"])]).unwrap(),
        vec![expected]
    );

    let req = GetReq::new(42, vec![GetKey::call("foo", vec![])]);
    let results = run(RootNew::default(), &[req]).unwrap();
    assert_eq!(
        results[0].value,
        Value::map_of([("result", string("New not called (Func)"))])
    );
    assert!(results[0].callable);
}

#[test]
fn undefined_receiver() {
    let root = RootNew::with(|_| Ok(None));
    let req = get(&["foo"]).with_context(context(&[("a", "b")]));
    assert_eq!(
        run(root, &[req]).unwrap(),
        vec![result(42, &["foo"], Value::Undefined)]
    );

    expect_err(
        RootNew::with(|_| Ok(None)),
        GetReq::new(
            42,
            vec![GetKey::get("foo"), GetKey::call("bar", vec![string("one")])],
        )
        .with_context(context(&[("a", "b")])),
        r#"attempting to call function "foo.bar" on undefined receiver"#,
    );
}

#[test]
fn constructor_error() {
    expect_err(
        RootNew::with(|_| anyhow::bail!("OK")),
        get(&["foo"]).with_context(context(&[("a", "b")])),
        "error instantiating namespace: OK",
    );
}

#[test]
fn context_without_constructible_root() {
    let chains = || {
        vec![
            get(&["foo"]),
            get(&["foo", "bar", "baz"]),
            GetReq::new(42, vec![GetKey::call("foo", vec![string("asdf")])]),
            GetReq::new(
                42,
                vec![GetKey::get("foo"), GetKey::call("bar", vec![Value::Int(1)])],
            ),
        ]
    };

    for req in chains() {
        let req = req.with_context(context(&[("a", "b")]));
        let shared = Embed::new(KeyValue::new("foo", Object::value("bar")));
        let err = run(shared, &[req.clone()]).unwrap_err();
        assert!(matches!(err, Error::ContextUnsupported), "shared root: {err}");

        let err = run(RootCounter::default(), &[req]).unwrap_err();
        assert!(matches!(err, Error::ContextUnsupported), "creator root: {err}");
    }
}

#[test]
fn receiver_flatten_errors() {
    expect_err(
        RootNew::with(|_| {
            Ok(Some(Arc::new(KeyValueMap::of([
                ("foo", Object::map_of([("result", Object::value("Not OK"))])),
                ("bar", Object::namespace(MapErr)),
            ])) as Arc<dyn Namespace>))
        }),
        get(&["foo"]).with_context(context(&[("a", "b")])),
        r#"error marshaling receiver after retrieving key "foo": map error"#,
    );

    expect_err(
        RootNew::with(|_| {
            Ok(Some(
                Arc::new(KeyValue::new("foo", Object::value("Not OK"))) as Arc<dyn Namespace>
            ))
        }),
        get(&["foo"]).with_context(context(&[("a", "b")])),
        r#"error marshaling receiver after retrieving key "foo": receiver is no longer an object"#,
    );

    expect_err(
        RootNew::with(|_| Ok(Some(Arc::new(Nilable) as Arc<dyn Namespace>))),
        get(&["foo"]).with_context(context(&[("a", "b")])),
        r#"error marshaling receiver after retrieving key "foo": receiver is now nil"#,
    );
}

// ---------------------------------------------------------------------------
// Batches

#[test]
fn get_aborts_on_first_error_but_get_each_isolates() {
    let engine = configured(Embed::new(KeyValueMap::of([(
        "foo",
        Object::value("bar"),
    )])));
    let reqs = [
        GetReq::new(1, vec![GetKey::get("foo")]),
        GetReq::new(2, vec![GetKey::call("foo", vec![])]),
        GetReq::new(3, vec![GetKey::get("missing")]),
    ];

    assert!(engine.get(&reqs).is_err());

    let each = engine.get_each(&reqs);
    assert_eq!(each.len(), 3);
    assert_eq!(each[0].as_ref().unwrap().value, string("bar"));
    assert!(each[1].is_err());
    assert_eq!(each[2].as_ref().unwrap().value, Value::Undefined);
}

#[test]
fn resolution_leaves_the_tree_unchanged() {
    let engine = configured(Embed::new(KeyValue::new(
        "foo",
        Object::namespace(KeyValueMap::of([
            ("key", Object::value("value")),
            (
                "embedded_map",
                Object::namespace(KeyValueMap::of([("key", Object::value("value"))])),
            ),
            (
                "embedded_list",
                Object::List(vec![Object::namespace(KeyValueMap::of([(
                    "key",
                    Object::value("value"),
                )]))]),
            ),
        ])),
    )));

    let first = engine.get(&[get(&["foo"])]).unwrap();
    let second = engine.get(&[get(&["foo"])]).unwrap();
    assert_eq!(first, second);
}
