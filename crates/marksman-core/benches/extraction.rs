use criterion::{black_box, criterion_group, criterion_main, Criterion};

use marksman_core::runner::parse_examiner_output;
use marksman_core::traits::extract_first_json_object;

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_first_json_object");

    let clean = r#"{"score": 7, "feedback": "Strong analysis.", "strengths": ["a", "b"]}"#;
    group.bench_function("clean_object", |b| {
        b.iter(|| extract_first_json_object(black_box(clean)))
    });

    let prose_wrapped = format!(
        "Here is my detailed assessment of the response.\n\n{clean}\n\nI hope this is useful."
    );
    group.bench_function("prose_wrapped", |b| {
        b.iter(|| extract_first_json_object(black_box(&prose_wrapped)))
    });

    let no_json = "The response shows a reasonable grasp of the material ".repeat(50);
    group.bench_function("no_json", |b| {
        b.iter(|| extract_first_json_object(black_box(&no_json)))
    });

    group.finish();
}

fn bench_parse_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_examiner_output");

    let structured = r#"{"score": 5, "feedback": "Good chains of reasoning.", "strengths": ["logic"]}"#;
    group.bench_function("structured", |b| {
        b.iter(|| parse_examiner_output(black_box(structured)))
    });

    let fallback = "I would award solid marks for this response overall. ".repeat(20);
    group.bench_function("fallback", |b| {
        b.iter(|| parse_examiner_output(black_box(&fallback)))
    });

    group.finish();
}

criterion_group!(benches, bench_extract, bench_parse_output);
criterion_main!(benches);
