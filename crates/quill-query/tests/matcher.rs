use quill_json::Value;
use quill_query::Bindings;
use quill_query::MatchError;
use quill_query::Query;

fn check(doc: &str, query: &str, expected: bool) {
    let doc = Value::from_json(doc).unwrap_or_else(|e| panic!("doc {doc}: {e}"));
    let q = Query::parse(query).unwrap_or_else(|e| panic!("parse {query:?}: {e}"));
    let matched = q
        .matched(&doc, &Bindings::new())
        .unwrap_or_else(|e| panic!("match {query:?}: {e}"));
    assert_eq!(matched, expected, "query {query:?}");
}

#[test]
fn plain_paths_and_boolean_chains() {
    check(r#"{"foo":{"bar":22}}"#, "/foo/bar", true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/baz", false);
    check(r#"{"foo":{"bar":22}}"#, "/foo/bar and /foo/bar or /foo", true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/baz or /foo", true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/baz and (/foo/daz or /foo/bar)", false);
    check(r#"{"foo":{"bar":22}}"#, "(/boo or /foo) and (/foo/daz or /foo/bar)", true);
    check(r#"{"foo":{"bar":22,"bar2":"vvv2"}}"#, "/foo/bar2", true);
}

#[test]
fn comparison_predicates() {
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar = 22]", true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar eq 22]", true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar !eq 22]", false);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar != 22]", false);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar >= 22]", true);
    check(r#"{"foo":{"bar":22}}"#, "/*/[bar >= 22]", true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar > 21]", true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar > 22]", false);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar < 23]", true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar <= 22]", true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar < 22]", false);
    check(r#"{"foo":{"bar":22}}"#, "/*/[bar < 22]", false);
    check(r#"{"foo":{"bar":22}}"#, "/*/[bar > 20 and bar <= 23]", true);
    check(r#"{"foo":{"bar":22}}"#, "/*/[bar > 22 and bar <= 23]", false);
    check(r#"{"foo":{"bar":22}}"#, "/*/[bar > 23 or bar < 23]", true);
    check(r#"{"foo":{"bar":22}}"#, "/*/[bar < 23 or bar > 23]", true);
    // Ordering against non-numeric values is false, never an error.
    check(r#"{"foo":{"bar":"text"}}"#, "/foo/[bar > 0]", false);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar > 21.5]", true);
}

#[test]
fn key_expressions() {
    check(r#"{"foo":{"bar":22}}"#, "/foo/[[* = bar] = 22]", true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[[* = bar] != 23]", true);
    check(r#"{"foo":{"bar":22}}"#, "/[* = foo]/[[* = bar] != 23]", true);
    check(r#"{"foo":{"bar":22}}"#, "/[* != foo]/[[* = bar] != 23]", false);
}

#[test]
fn regex_predicates() {
    check(r#"{"foo":{"bar":22}}"#, r#"/[* re "foo"]"#, true);
    check(r#"{"foo":{"bar":22}}"#, "/[* re fo]", true);
    check(r#"{"foo":{"bar":22}}"#, r#"/[* re "^foo$"]"#, true);
    check(r#"{"foo":{"bar":22}}"#, r#"/[* re "^fo$"]"#, false);
    check(r#"{"foo":{"bar":22}}"#, r#"/[* not re "^fo$"]"#, true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar re 22]", true);
    check(r#"{"foo":{"bar":22}}"#, r#"/foo/[bar re "2+"]"#, true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar like 22]", true);

    let doc = Value::from_json(r#"{"foo":1}"#).unwrap();
    let q = Query::parse(r#"/[* re "("]"#).unwrap();
    let err = q.matched(&doc, &Bindings::new()).unwrap_err();
    assert!(matches!(err, MatchError::InvalidRegex { .. }));
    assert_eq!(err.code(), 1204);
}

#[test]
fn in_and_ni_predicates() {
    check(r#"{"foo":{"bar":22}}"#, r#"/foo/[bar in [21, "22"]]"#, true);
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar in [21, 23]]", false);
    check(r#"{"foo":{"bar":22}}"#, r#"/[* in ["foo"]]/[bar in [21, 22]]"#, true);
    check(r#"{"foo":{"bar":22}}"#, r#"/[* not in ["foo"]]/[bar in [21, 22]]"#, false);
    check(r#"{"foo":{"arr":[1,2,3,4]}}"#, "/foo/[arr ni 3]", true);
    check(r#"{"foo":{"arr":[1,2,3,4]}}"#, "/foo/[arr ni 9]", false);
    // `in` against a non-array right side is simply false.
    check(r#"{"foo":{"bar":22}}"#, "/foo/[bar in 22]", false);
}

#[test]
fn recursive_wildcards() {
    check(r#"{"foo":{"bar":22}}"#, "/**", true);
    check(r#"{"foo":{"bar":22}}"#, "/**/bar", true);
    check(r#"{"foo":{"bar":22}}"#, "/**/baz", false);
    check(r#"{"foo":{"bar":22}}"#, "/**/**/bar", true);
    check(r#"{"foo":{"bar":22,"baz":{"zaz":33}}}"#, "/foo/**/zaz", true);
    check(r#"{"foo":{"bar":22,"baz":{"zaz":33}}}"#, "/foo/**/[zaz > 30]", true);
    check(r#"{"foo":{"bar":22,"baz":{"zaz":33}}}"#, "/foo/**/[zaz < 30]", false);
}

#[test]
fn array_and_object_equality() {
    check(r#"{"foo":{"arr":[1,2,3,4]}}"#, "/foo/[arr = [1,2,3,4]]", true);
    check(r#"{"foo":{"arr":[1,2,3,4]}}"#, "/foo/**/[arr = [1,2,3,4]]", true);
    check(r#"{"foo":{"arr":[1,2,3,4]}}"#, "/foo/*/[arr = [1,2,3,4]]", false);
    check(r#"{"foo":{"arr":[1,2,3,4]}}"#, "/foo/[arr = [1,2,3]]", false);
    check(r#"{"foo":{"arr":[1,2,3,4]}}"#, "/foo/[arr = [1,12,3,4]]", false);
    check(
        r#"{"foo":{"obj":{"f":"d","e":"j"}}}"#,
        r#"/foo/[obj = {"e":"j","f":"d"}]"#,
        true,
    );
    check(
        r#"{"foo":{"obj":{"f":"d","e":"j"}}}"#,
        r#"/foo/[obj = {"e":"j","f":"dd"}]"#,
        false,
    );
}

#[test]
fn nested_documents() {
    let doc = r#"{
      "foo": {
        "bar": {"baz":{"zaz":33}},
        "sas": {"gaz":{"zaz":44}},
        "arr": [1,2,3,4]
      }
    }"#;
    check(doc, "/foo/sas/gaz/zaz", true);
    check(doc, "/foo/sas/gaz/[zaz = 44]", true);
    check(doc, "/**/[zaz = 44]", true);
    check(doc, "/foo/**/[zaz = 44]", true);
    check(doc, "/foo/*/*/[zaz = 44]", true);
    check(doc, "/foo/arr/2", true);
    check(doc, "/foo/arr/9", false);
}

#[test]
fn wildcard_matches_any_document_with_a_field() {
    for doc in [
        r#"{"a":1}"#,
        r#"{"foo":{"bar":22}}"#,
        r#"[1,2,3]"#,
        r#"{"":null}"#,
    ] {
        check(doc, "/*", true);
    }
    check("{}", "/*", false);
    check("22", "/*", false);
}

#[test]
fn recursive_wildcard_is_monotonic() {
    // Whenever /a/b matches, /**/b must match too.
    let docs = [
        r#"{"a":{"b":1}}"#,
        r#"{"a":{"b":{"c":2}}}"#,
        r#"{"x":{"a":{"b":3}}}"#,
    ];
    for doc in docs {
        let parsed = Value::from_json(doc).unwrap();
        let direct = Query::parse("/a/b").unwrap();
        let recursive = Query::parse("/**/b").unwrap();
        let vars = Bindings::new();
        if direct.matched(&parsed, &vars).unwrap() {
            assert!(recursive.matched(&parsed, &vars).unwrap(), "doc {doc}");
        }
    }
}

#[test]
fn placeholders_resolve_from_bindings() {
    let doc = Value::from_json(r#"{"foo":{"bar":22}}"#).unwrap();
    let q = Query::parse("/foo/[bar = :v]").unwrap();

    let vars = Bindings::new().bind("v", Value::Int(22));
    assert!(q.matched(&doc, &vars).unwrap());

    let vars = Bindings::new().bind("v", Value::Int(23));
    assert!(!q.matched(&doc, &vars).unwrap());

    let err = q.matched(&doc, &Bindings::new()).unwrap_err();
    assert!(matches!(err, MatchError::UnresolvedPlaceholder(ref n) if n == "v"));
    assert_eq!(err.code(), 1202);

    // Placeholders work on either side and inside `in` lists.
    let q = Query::parse("/foo/[:v = bar]").unwrap();
    let vars = Bindings::new().bind("v", Value::String("bar".into()));
    assert!(q.matched(&doc, &vars).unwrap());

    let q = Query::parse("/foo/[bar in :set]").unwrap();
    let set = Value::from_json("[21,22,23]").unwrap();
    let vars = Bindings::new().bind("set", set);
    assert!(q.matched(&doc, &vars).unwrap());
}

#[test]
fn matching_is_deterministic() {
    let doc = Value::from_json(r#"{"a":[{"b":1},{"b":2},{"b":3}]}"#).unwrap();
    let q = Query::parse("/a/*/[b > 1]").unwrap();
    let vars = Bindings::new();
    let first = q.matched(&doc, &vars).unwrap();
    for _ in 0..10 {
        assert_eq!(q.matched(&doc, &vars).unwrap(), first);
    }
    assert!(first);
}

#[test]
fn depth_limit_guards_adversarial_documents() {
    let doc = Value::from_json(r#"{"a":{"b":{"c":{"d":1}}}}"#).unwrap();
    let q = Query::parse("/a/b/c/d").unwrap();
    assert!(q.matched(&doc, &Bindings::new()).unwrap());

    let q = Query::parse("/a/b/c/d").unwrap().with_match_depth_limit(2);
    let err = q.matched(&doc, &Bindings::new()).unwrap_err();
    assert!(matches!(err, MatchError::DepthLimitExceeded(2)));
    assert_eq!(err.code(), 1203);
}

#[test]
fn queries_are_shareable_across_threads() {
    let q = std::sync::Arc::new(Query::parse(r#"/foo/[bar re "^2+$"]"#).unwrap());
    let doc = Value::from_json(r#"{"foo":{"bar":22}}"#).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let q = q.clone();
            let doc = doc.clone();
            std::thread::spawn(move || q.matched(&doc, &Bindings::new()).unwrap())
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
