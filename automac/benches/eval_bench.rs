use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use automac::fuzzy::partial_ratio;
use automac::script::block::find_block_end;
use automac::script::expr::eval_str;
use automac::script::subst::substitute;
use automac::script::Value;

fn make_script(blocks: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for i in 0..blocks {
        lines.push(format!("loop {}", i % 5 + 1));
        lines.push("if_eval 1 < 2".to_owned());
        lines.push("log tick".to_owned());
        lines.push("endif".to_owned());
        lines.push("endloop".to_owned());
    }
    lines.push("endloop".to_owned());
    lines
}

fn bench_eval(c: &mut Criterion) {
    let mut g = c.benchmark_group("script_core");

    g.bench_function("expr_eval", |b| {
        b.iter(|| eval_str(black_box("(3 + 4) * 12 - 9 / 3 > 20 and not 0")))
    });

    let vars: HashMap<String, Value> = [
        ("x".to_owned(), Value::Int(42)),
        ("name".to_owned(), Value::Str("session".to_owned())),
        ("ratio".to_owned(), Value::Float(0.75)),
    ]
    .into_iter()
    .collect();
    g.bench_function("substitute", |b| {
        b.iter(|| substitute(black_box("$x * 2 > 10 and $ratio < 1"), black_box(&vars)))
    });

    let script = make_script(200);
    let lines: Vec<&str> = script.iter().map(String::as_str).collect();
    g.bench_function("block_scan_1k_lines", |b| {
        b.iter(|| find_block_end(black_box(&lines), 0, &["loop"], &["endloop"]))
    });

    let hay = "The quick brown fox jumps over the lazy dog. ".repeat(20);
    g.bench_function("partial_ratio", |b| {
        b.iter(|| partial_ratio(black_box("lazy d0g"), black_box(&hay)))
    });

    g.finish();
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);
