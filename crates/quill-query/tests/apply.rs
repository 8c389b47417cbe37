use pretty_assertions::assert_eq;
use quill_json::Value;
use quill_query::Bindings;
use quill_query::MatchError;
use quill_query::Query;

fn doc(text: &str) -> Value {
    Value::from_json(text).unwrap()
}

#[test]
fn unmatched_documents_produce_nothing() {
    let q = Query::parse(r#"/missing | apply {"x":1}"#).unwrap();
    let out = q.execute(&doc(r#"{"foo":1}"#), &Bindings::new()).unwrap();
    assert_eq!(out, None);
}

#[test]
fn matched_without_clauses_returns_the_document() {
    let q = Query::parse("/foo").unwrap();
    let input = doc(r#"{"foo":{"bar":22}}"#);
    let out = q.execute(&input, &Bindings::new()).unwrap();
    assert_eq!(out, Some(input));
}

#[test]
fn object_apply_is_a_merge_patch() {
    let q = Query::parse(r#"/foo/[bar = 22] | apply {"foo":{"baz":9},"gone":null}"#).unwrap();
    let input = doc(r#"{"foo":{"bar":22},"gone":true}"#);
    let out = q.execute(&input, &Bindings::new()).unwrap().unwrap();
    assert_eq!(out, doc(r#"{"foo":{"bar":22,"baz":9}}"#));
    // The input tree is untouched; apply works on a clone.
    assert_eq!(input, doc(r#"{"foo":{"bar":22},"gone":true}"#));
}

#[test]
fn array_apply_is_an_operation_list() {
    let q = Query::parse(
        r#"/foo | apply [{"op":"test","path":"/foo/bar","value":22},
                         {"op":"replace","path":"/foo/bar","value":99},
                         {"op":"increment","path":"/n","value":2}]"#,
    )
    .unwrap();
    let out = q
        .execute(&doc(r#"{"foo":{"bar":22},"n":40}"#), &Bindings::new())
        .unwrap()
        .unwrap();
    assert_eq!(out, doc(r#"{"foo":{"bar":99},"n":42}"#));
}

#[test]
fn apply_failures_propagate() {
    let q = Query::parse(r#"/foo | apply [{"op":"test","path":"/foo/bar","value":23}]"#).unwrap();
    let err = q
        .execute(&doc(r#"{"foo":{"bar":22}}"#), &Bindings::new())
        .unwrap_err();
    assert!(matches!(
        err,
        MatchError::Apply(quill_json::Error::PatchTestFailed(_))
    ));
    assert_eq!(err.code(), 1205);
}

#[test]
fn placeholder_apply_resolves_from_bindings() {
    let q = Query::parse("/foo | apply :patch").unwrap();
    let input = doc(r#"{"foo":1}"#);

    let vars = Bindings::new().bind("patch", doc(r#"{"tag":"new"}"#));
    let out = q.execute(&input, &vars).unwrap().unwrap();
    assert_eq!(out, doc(r#"{"foo":1,"tag":"new"}"#));

    let err = q.execute(&input, &Bindings::new()).unwrap_err();
    assert!(matches!(err, MatchError::UnresolvedPlaceholder(ref n) if n == "patch"));
}
