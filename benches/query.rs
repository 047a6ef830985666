//! Query Execution Performance Benchmarks
//!
//! These benchmarks measure:
//! - Structured and tabulated shaping of a small result
//! - Truncation of a large result set
//! - Per-call connection overhead in read-only file mode
//! - Type inference over a sample column

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::sync::Arc;

use duckgate::discovery::infer;
use duckgate::{resolve, ConnectionConfig, ConnectionManager, QueryExecutor};

fn executor_for(raw_path: &str, config: ConnectionConfig) -> QueryExecutor {
    let target = resolve(raw_path, None, false).expect("local path");
    let manager = ConnectionManager::open(target, config.offline()).expect("Failed to connect");
    QueryExecutor::new(Arc::new(manager))
}

fn bench_shapes(c: &mut Criterion) {
    let executor = executor_for(":memory:", ConnectionConfig::default());
    let setup = executor.structured(
        "CREATE TABLE users AS SELECT i AS id, 'User ' || i AS name, i % 90 AS age FROM range(100) t(i)",
    );
    assert!(setup.success);

    c.bench_function("structured_select_100", |b| {
        b.iter(|| executor.structured(black_box("SELECT * FROM users")));
    });

    c.bench_function("tabulated_select_100", |b| {
        b.iter(|| executor.tabulated(black_box("SELECT * FROM users")));
    });

    c.bench_function("structured_truncate_5000", |b| {
        b.iter(|| executor.structured(black_box("SELECT * FROM range(5000)")));
    });
}

fn bench_ephemeral_connections(c: &mut Criterion) {
    let path = std::env::temp_dir().join("bench_duckgate_ephemeral.duckdb");
    let _ = std::fs::remove_file(&path);
    {
        let conn = duckdb::Connection::open(&path).expect("Failed to create database");
        conn.execute_batch("CREATE TABLE t AS SELECT * FROM range(100)").expect("seed");
    }

    let executor = executor_for(path.to_str().expect("utf-8 path"), ConnectionConfig::read_only());

    c.bench_function("read_only_select_count", |b| {
        b.iter(|| executor.structured(black_box("SELECT count(*) FROM t")));
    });

    drop(executor);
    let _ = std::fs::remove_file(&path);
}

fn bench_inference(c: &mut Criterion) {
    let values: Vec<_> = (0..1000).map(|i| json!(format!("{i}.{}", i % 10))).collect();

    c.bench_function("infer_1000_decimals", |b| {
        b.iter(|| infer(black_box(&values)));
    });
}

criterion_group!(benches, bench_shapes, bench_ephemeral_connections, bench_inference);
criterion_main!(benches);
