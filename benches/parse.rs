use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rdn::{from_str, parse, parse_cst, stringify, to_string, StringifyOptions};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
    dimensions: (f64, f64, f64),
}

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product {}", i),
            price: 9.99 + f64::from(i),
            quantity: i,
            dimensions: (1.0, 2.5, f64::from(i)),
        })
        .collect()
}

fn extended_document(size: usize) -> String {
    let mut out = String::from("[");
    for i in 0..size {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!(
            r#"{{"id": {}n, "at": @2024-01-15T10:30:00.{:03}Z, "ttl": @PT{}M, "tags": Set{{"a", "b"}}, "blob": b"SGVsbG8=", "lookup": Map{{{} => /x+/g}}}}"#,
            i,
            i % 1000,
            i % 60,
            i
        ));
    }
    out.push(']');
    out
}

fn benchmark_parse_json(c: &mut Criterion) {
    let simple = r#"{"name": "test", "value": 42, "list": [1, 2.5, true, null]}"#;
    c.bench_function("parse_simple_json", |b| b.iter(|| parse(black_box(simple))));

    let mut group = c.benchmark_group("parse_json_array");
    for size in [10u32, 100, 1000].iter() {
        let text = serde_json::to_string(&products(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| parse(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_parse_extended(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_extended");
    for size in [10usize, 100, 1000].iter() {
        let text = extended_document(*size);
        group.bench_with_input(BenchmarkId::new("value", size), &text, |b, text| {
            b.iter(|| parse(black_box(text)))
        });
        group.bench_with_input(BenchmarkId::new("cst", size), &text, |b, text| {
            b.iter(|| parse_cst(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_numbers(c: &mut Criterion) {
    let mut group = c.benchmark_group("numbers");

    let small: Vec<String> = (0..100).map(|i| (i * 7919).to_string()).collect();
    let small = format!("[{}]", small.join(","));
    let floats: Vec<String> = (0..100).map(|i| format!("{}.{}e-3", i, i)).collect();
    let floats = format!("[{}]", floats.join(","));
    let bigints: Vec<String> = (0..100).map(|i| format!("{}123456789012345678901n", i)).collect();
    let bigints = format!("[{}]", bigints.join(","));

    group.bench_function("fast_path_integers", |b| b.iter(|| parse(black_box(&small))));
    group.bench_function("floats", |b| b.iter(|| parse(black_box(&floats))));
    group.bench_function("bigints", |b| b.iter(|| parse(black_box(&bigints))));
    group.finish();
}

fn benchmark_stringify(c: &mut Criterion) {
    let mut group = c.benchmark_group("stringify");
    for size in [10usize, 100, 1000].iter() {
        let value = parse(&extended_document(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &value, |b, value| {
            b.iter(|| stringify(black_box(value)))
        });
    }
    group.finish();

    let value = parse(&extended_document(100)).unwrap();
    let options = StringifyOptions::new().with_strip_collection_keywords(true);
    c.bench_function("stringify_stripped_keywords", |b| {
        b.iter(|| rdn::stringify_with_options(black_box(&value), &options))
    });
}

fn benchmark_serde(c: &mut Criterion) {
    let mut group = c.benchmark_group("serde");
    for size in [10u32, 100].iter() {
        let data = products(*size);
        let text = to_string(&data).unwrap();

        group.bench_with_input(BenchmarkId::new("to_string", size), &data, |b, data| {
            b.iter(|| to_string(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("from_str", size), &text, |b, text| {
            b.iter(|| from_str::<Vec<Product>>(black_box(text)))
        });
        group.bench_with_input(BenchmarkId::new("serde_json", size), &data, |b, data| {
            b.iter(|| serde_json::to_string(black_box(data)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_parse_json,
    benchmark_parse_extended,
    benchmark_numbers,
    benchmark_stringify,
    benchmark_serde
);
criterion_main!(benches);
