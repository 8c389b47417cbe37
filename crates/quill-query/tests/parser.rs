use expect_test::expect;
use pretty_assertions::assert_eq;
use quill_query::ast::FilterItem;
use quill_query::ast::PathNode;
use quill_query::Parser;
use quill_query::Query;

/// Parse, print, and compare against the canonical spelling; then check
/// the round-trip property `parse(print(parse(q))) == parse(q)`.
fn check(input: &str, canonical: &str) {
    let query = Query::parse(input).unwrap_or_else(|e| panic!("parse {input:?}: {e}"));
    assert_eq!(query.to_string(), canonical, "print of {input:?}");
    let reparsed = Query::parse(&query.to_string())
        .unwrap_or_else(|e| panic!("reparse {canonical:?}: {e}"));
    assert_eq!(reparsed, query, "round trip of {input:?}");
}

#[test]
fn canonical_print_round_trips() {
    check("/foo/bar", "/foo/bar");
    check("  /foo   /  bar ", "/foo/bar");
    check("/foo/[bar = 22]", "/foo/[bar = 22]");
    check("/foo/[bar eq 22]", "/foo/[bar = 22]");
    check("/foo/[bar != 22]", "/foo/[bar not = 22]");
    check("/foo/[bar !eq 22]", "/foo/[bar not = 22]");
    check("/foo/[bar not = 22]", "/foo/[bar not = 22]");
    check("/*/[bar > 20 and bar <= 23]", "/*/[bar > 20 and bar <= 23]");
    check("/foo/**/[zaz > 30]", "/foo/**/[zaz > 30]");
    check("/**/**/bar", "/**/**/bar");
    check("/foo/[a like \"x.*\"]", "/foo/[a re \"x.*\"]");
    check("/foo/[* re fo]", "/foo/[* re fo]");
    check("/foo/[* not re \"^fo$\"]", "/foo/[* not re \"^fo$\"]");
    check("/foo/[[* = bar] = 22]", "/foo/[[* = bar] = 22]");
    check("/foo/[arr in [21, \"22\"]]", "/foo/[arr in [21,\"22\"]]");
    check("/foo/[arr ni 3]", "/foo/[arr ni 3]");
    check(
        "(/boo or /foo) and (/foo/daz or /foo/bar)",
        "(/boo or /foo) and (/foo/daz or /foo/bar)",
    );
    check("/a not and /b", "/a not and /b");
    check("@users/name/[first = \"Ada\"]", "@users/name/[first = \"Ada\"]");
    check("/foo/[bar = :low]", "/foo/[bar = :low]");
    check(
        "/foo/[obj = {\"e\": \"j\", f: d}]",
        "/foo/[obj = {\"e\":\"j\",\"f\":\"d\"}]",
    );
    check(
        "/doc | apply {\"tag\":1} | fields /a/b, -/c, /d/{e,f}, /arr/0, /x/**",
        "/doc | apply {\"tag\":1} | fields /a/b, -/c, /d/{e,f}, /arr/0, /x/**",
    );
    check("/doc | apply :patch", "/doc | apply :patch");
    check("/a/[x = 1 or not y = 2]", "/a/[x = 1 or y not = 2]");
    check("/a/[not [x = 1] and [y = 2]]", "/a/[not [x = 1] and [y = 2]]");
}

#[test]
fn pretty_print_breaks_clauses() {
    let query = Query::parse("/foo and /bar | apply {\"x\":1} | fields /a").unwrap();
    let expected = expect![[r#"
        /foo
        and /bar
        | apply {"x":1}
        | fields /a"#]];
    expected.assert_eq(&query.serialize().pretty().to_string());
}

#[test]
fn structure_is_exposed() {
    let query = Query::parse("@orders/items/**/[price > 10]").unwrap();
    let links = query.filters().links();
    assert_eq!(links.len(), 1);
    let FilterItem::Path(filter) = &links[0].item else {
        panic!("expected a path filter");
    };
    assert_eq!(filter.anchor.as_deref(), Some("orders"));
    assert_eq!(filter.path.len(), 3);
    assert!(matches!(filter.path[0], PathNode::Field(ref f) if f == "items"));
    assert!(matches!(filter.path[1], PathNode::AnyRecursive));
    assert!(matches!(filter.path[2], PathNode::Expr(_)));
    assert!(query.apply().is_none());
    assert!(query.projection().is_empty());
}

#[test]
fn errors_carry_line_column_and_excerpt() {
    let err = Query::parse("/foo and").unwrap_err();
    assert_eq!((err.line, err.column), (1, 9));
    assert!(err.message.contains("expected `/`"));
    assert!(err.message.contains("end of input"));

    let err = Query::parse("/foo/[bar = ]").unwrap_err();
    assert_eq!((err.line, err.column), (1, 13));
    assert_eq!(err.near, "]");

    let err = Query::parse("/foo/\n[bar ~ 22]").unwrap_err();
    assert_eq!((err.line, err.column), (2, 6));
    assert!(err.message.contains("unexpected character"));

    let err = Query::parse("(/a or /b").unwrap_err();
    assert!(err.message.contains("expected `)`"));

    let err = Query::parse("/a | apply {} | apply {}").unwrap_err();
    assert!(err.message.contains("duplicate apply clause"));

    let err = Query::parse("/a | fields /x | stats").unwrap_err();
    assert!(err.message.contains("expected `apply` or `fields`"));

    // Placeholders must hug their colon.
    assert!(Query::parse("/a/[b = : name]").is_err());
    assert!(Query::parse("/a/[b = :name]").is_ok());
}

#[test]
fn error_display_has_the_near_marker() {
    let err = Query::parse("/foo/[bar = ]").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("near token ']'"), "{text}");
    assert!(text.contains("<--- "), "{text}");
    assert_eq!(err.code(), 1201);

    let report = err.report("/foo/[bar = ]");
    assert!(report.contains("expected an operand"), "{report}");
}

#[test]
fn recursion_is_limited() {
    let depth = 15;
    let query = format!("/a/{}x = 1{}", "[".repeat(depth), "]".repeat(depth));
    assert!(Query::parse(&query).is_ok());
    let err = Parser::new(&query).recursion_limit(10).parse().unwrap_err();
    assert!(err.message.contains("nesting is too deep"), "{err}");
}

#[test]
fn trailing_join_is_a_syntax_error() {
    assert!(Query::parse("/a and").is_err());
    assert!(Query::parse("/a or /b and").is_err());
    assert!(Query::parse("/a/[x = 1 or]").is_err());
}
