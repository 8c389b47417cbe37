use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use quill_json::Value;
use quill_query::Bindings;
use quill_query::Query;

const QUERY: &str = r#"/orders/*/[status = "open"] and /orders/**/[total > 100 and total <= 500] or (/archived/[year >= 2020] and /orders/*/[tags ni "priority"]) | fields /orders/{id,total}, -/orders/internal"#;

const DOCUMENT: &str = r#"{
  "orders": {
    "a1": {"status":"open","total":250,"tags":["priority","eu"],"id":1,"internal":{"s":1}},
    "a2": {"status":"closed","total":40,"tags":[],"id":2,"internal":{"s":2}}
  },
  "archived": {"year": 2021}
}"#;

fn parse(c: &mut Criterion) {
    c.bench_function("parse_query", |b| {
        b.iter(|| Query::parse(black_box(QUERY)).unwrap())
    });
}

fn matched(c: &mut Criterion) {
    let query = Query::parse(QUERY).unwrap();
    let doc = Value::from_json(DOCUMENT).unwrap();
    let vars = Bindings::new();
    c.bench_function("match_document", |b| {
        b.iter(|| query.matched(black_box(&doc), &vars).unwrap())
    });
}

criterion_group!(benches, parse, matched);
criterion_main!(benches);
