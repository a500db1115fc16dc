//! Criterion benchmarks for the quote sanitizer and for bulk inserts pushed through the
//! execution queue, with a raw `rusqlite` transaction as the baseline.

use std::hint::black_box;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rusqlite::{Connection, params};
use tokio::runtime::Runtime;
use websql_middleware::prelude::*;

static TOKIO_RUNTIME: LazyLock<Runtime> =
    LazyLock::new(|| Runtime::new().expect("create tokio runtime"));

/// Rows inserted per iteration; override with `BENCH_ROWS`.
fn insert_row_count() -> i64 {
    std::env::var("BENCH_ROWS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(1000)
}

fn benchmark_normalize_quotes(c: &mut Criterion) {
    let cases = [
        ("unquoted", "SELECT id, name FROM test WHERE id = ? ORDER BY name".to_string()),
        (
            "mixed",
            r#"INSERT INTO docs (name, body) VALUES ("it's", '{"a":1}'), ('x''y', "say ""hi""")"#
                .to_string(),
        ),
        (
            "many_literals",
            (0..200)
                .map(|i| format!(r#"("name-{i}", 'v''{i}')"#))
                .collect::<Vec<_>>()
                .join(", "),
        ),
    ];

    let mut group = c.benchmark_group("normalize_quotes");
    for (label, sql) in &cases {
        group.throughput(Throughput::Bytes(sql.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), sql, |b, sql| {
            b.iter(|| black_box(normalize_quotes(black_box(sql))));
        });
    }
    group.finish();
}

fn benchmark_bulk_insert(c: &mut Criterion) {
    let rows = insert_row_count();
    let runtime = &*TOKIO_RUNTIME;
    let mut group = c.benchmark_group("bulk_insert");
    group.throughput(Throughput::Elements(rows as u64));

    group.bench_function(BenchmarkId::new("rusqlite", rows), |b| {
        b.iter_custom(|iters| {
            let mut total = Duration::default();
            for _ in 0..iters {
                let mut conn = Connection::open_in_memory().expect("open sqlite");
                conn.execute_batch("CREATE TABLE bench (n INTEGER NOT NULL)")
                    .expect("create table");
                let start = Instant::now();
                let tx = conn.transaction().expect("begin");
                {
                    let mut stmt = tx
                        .prepare("INSERT INTO bench (n) VALUES (?1)")
                        .expect("prepare insert");
                    for n in 0..rows {
                        stmt.execute(params![n]).expect("insert");
                    }
                }
                tx.commit().expect("commit");
                total += start.elapsed();
            }
            total
        });
    });

    group.bench_function(BenchmarkId::new("websql", rows), |b| {
        b.iter_custom(|iters| {
            runtime.block_on(async {
                let mut total = Duration::default();
                for _ in 0..iters {
                    let websql = WebSql::builder()
                        .driver(SqliteDriver::in_memory())
                        .build()
                        .expect("build service");
                    let db = websql
                        .open_database("bench", "1.0", "Bench", 0)
                        .expect("open database");
                    db.transaction(|tx| tx.execute_sql("CREATE TABLE bench (n INTEGER NOT NULL)", &[]))
                        .await
                        .expect("create table");

                    let start = Instant::now();
                    let outcome = db
                        .transaction(move |tx| {
                            for n in 0..rows {
                                tx.execute_sql("INSERT INTO bench (n) VALUES (?)", &[RowValues::Int(n)])?;
                            }
                            Ok(())
                        })
                        .await
                        .expect("bulk insert");
                    total += start.elapsed();
                    black_box(outcome);
                }
                total
            })
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_normalize_quotes, benchmark_bulk_insert);
criterion_main!(benches);
