//! Parse + render throughput over a representative documentation page.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

fn sample_document() -> String {
    let mut doc = String::new();
    doc.push_str("# Benchmark Page\n\n");
    for section in 0..20 {
        doc.push_str(&format!("## Section {section}\n\n"));
        doc.push_str(
            "A paragraph with *emphasis*, **strong** text, `inline code`, \
             a [link](/docs/page/), and a bit more prose to make the line \
             realistic.\n\n",
        );
        doc.push_str("- first item\n- second item\n- third item\n\n");
        doc.push_str("```rust\nfn demo() -> usize {\n    40 + 2\n}\n```\n\n");
        doc.push_str("> A quoted remark spanning\n> two lines.\n\n");
    }
    doc
}

fn bench_parse(c: &mut Criterion) {
    let source = sample_document();
    c.bench_function("parse_to_ast", |b| {
        b.iter(|| patitas::parse_to_ast(black_box(&source)))
    });
}

fn bench_parse_and_render(c: &mut Criterion) {
    let source = sample_document();
    c.bench_function("parse_and_render", |b| {
        b.iter(|| patitas::parse(black_box(&source)))
    });
}

fn bench_render_only(c: &mut Criterion) {
    let source = sample_document();
    let doc = patitas::parse_to_ast(&source);
    c.bench_function("render_ast", |b| {
        b.iter(|| patitas::render_ast(black_box(&doc), black_box(&source)))
    });
}

fn bench_parse_many(c: &mut Criterion) {
    let sources: Vec<String> = (0..64).map(|_| sample_document()).collect();
    c.bench_function("parse_many_64", |b| {
        b.iter(|| patitas::parse_many(black_box(&sources)))
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_parse_and_render,
    bench_render_only,
    bench_parse_many
);
criterion_main!(benches);
