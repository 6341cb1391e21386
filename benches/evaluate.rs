use std::collections::HashMap;
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use htaccess_core::{EngineConfig, EvaluateInput, evaluate};
use pprof::criterion::{Output, PProfProfiler};

fn profiled() -> Criterion {
    let output = Output::Flamegraph(None);
    let prof = PProfProfiler::new(1000, output);
    Criterion::default().with_profiler(prof)
}

fn input(rules: &str) -> EvaluateInput {
    EvaluateInput {
        url: "http://example.com/static/hello/world".to_owned(),
        rules: rules.to_owned(),
        server_variables: HashMap::new(),
    }
}

pub fn bench_single_rule_match(c: &mut Criterion) {
    let input = input("RewriteEngine On\nRewriteRule ^static/(.*)$ /files/$1 [L]");
    let config = EngineConfig::default();
    c.bench_function("single_rule_match", |b| {
        b.iter(|| black_box(evaluate(black_box(input.clone()), black_box(&config))))
    });
}

pub fn bench_condition_chain(c: &mut Criterion) {
    let mut vars = HashMap::new();
    vars.insert("HTTP_HOST".to_owned(), "example.com".to_owned());
    let input = EvaluateInput {
        url: "http://example.com/static/hello/world".to_owned(),
        rules: concat!(
            "RewriteEngine On\n",
            "RewriteCond %{HTTP_HOST} ^www\\. [OR]\n",
            "RewriteCond %{HTTP_HOST} ^example\\.com$\n",
            "RewriteRule ^static/(.*)$ /files/$1 [L]",
        )
        .to_owned(),
        server_variables: vars,
    };
    let config = EngineConfig::default();
    c.bench_function("condition_chain", |b| {
        b.iter(|| black_box(evaluate(black_box(input.clone()), black_box(&config))))
    });
}

pub fn bench_rejected_pattern(c: &mut Criterion) {
    let input = input("RewriteEngine On\nRewriteRule ^(static/.*)+$ /files/$1 [L]");
    let config = EngineConfig::default();
    c.bench_function("rejected_pattern", |b| {
        b.iter(|| black_box(evaluate(black_box(input.clone()), black_box(&config))))
    });
}

criterion_group!(
    name = benches;
    config = profiled();
    targets = bench_single_rule_match, bench_condition_chain, bench_rejected_pattern
);
criterion_main!(benches);
