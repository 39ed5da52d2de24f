use std::collections::HashMap;

use criterion::{criterion_group, criterion_main, Criterion};

fn synthetic_template() -> String {
    let mut t = String::new();
    for i in 0..200 {
        t.push_str(&format!(
            "Line {i}: hello {{{{name}}}}, your order {{{{order_{}}}}} ships to {{{{city}}}}.\n",
            i % 10
        ));
    }
    t
}

fn bench_extract(c: &mut Criterion) {
    let template = synthetic_template();
    c.bench_function("extract_placeholders", |b| {
        b.iter(|| mailcompose::placeholder::extract_placeholders(&template))
    });
}

fn bench_substitute(c: &mut Criterion) {
    let template = synthetic_template();
    let mut values = HashMap::new();
    values.insert("name".to_string(), "Ada Lovelace".to_string());
    values.insert("city".to_string(), "London".to_string());

    c.bench_function("apply_placeholders", |b| {
        b.iter(|| mailcompose::placeholder::apply_placeholders(&template, &values))
    });
}

criterion_group!(benches, bench_extract, bench_substitute);
criterion_main!(benches);
