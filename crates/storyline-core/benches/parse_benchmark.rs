//! Benchmarks for lexing and parsing storyline scripts
//!
//! Run with: cargo bench -p storyline-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use storyline_core::{Lexer, Parser};

/// One chapter of a typical script.
const CHAPTER: &str = r#"// chapter forest
The Forest

// section clearing
A Clearing

Sunlight falls through the leaves onto a mossy stone.
Something glints in the grass.
// item coin
// state luck +1
// if has map
The map shows a path to the east.
// > river Follow the path east
// else
You have no idea where you are.
// endif
// > cave Enter the cave
// >> village square Go back to the village

// section cave
The Cave

It is cold and damp.
// item remove torch
// state fear +2
// > clearing Run back outside
"#;

/// Script with `chapters` copies of [`CHAPTER`].
fn script(chapters: usize) -> String {
    let mut script = String::from("// book\nBenchmark Tales\n\n");
    script.push_str(&CHAPTER.repeat(chapters));
    script
}

fn bench_parse(c: &mut Criterion) {
    let input = script(1);
    let mut group = c.benchmark_group("parse");

    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("lex", |b| {
        b.iter(|| black_box(Lexer::new(black_box(&input)).count()))
    });

    let tokens = Lexer::new(&input).tokenize();
    group.bench_function("parse_tokens", |b| {
        let mut parser = Parser::new();
        b.iter(|| {
            let book = parser.parse(black_box(&tokens)).unwrap();
            black_box(book.chapters.len())
        })
    });

    group.bench_function("lex_and_parse", |b| {
        b.iter(|| {
            let book = Parser::new().parse_str(black_box(&input)).unwrap();
            black_box(book.chapters.len())
        })
    });

    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for size in [1, 10, 100, 1000].iter() {
        let content = script(*size);

        group.throughput(Throughput::Bytes(content.len() as u64));

        group.bench_with_input(BenchmarkId::new("storyline", size), &content, |b, content| {
            b.iter(|| {
                let book = Parser::new().parse_str(black_box(content)).unwrap();
                black_box(book.chapters.len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_scaling);
criterion_main!(benches);
