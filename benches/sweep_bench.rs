//! Benchmarks for the sweep.
//!
//! Files are fresh, so every iteration evaluates the whole tree without
//! deleting anything.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use idle_sweeper::watcher::{
    collect_candidates, sweep, ShutdownFlag, SweepReport, SystemClock, WatchOptions,
};
use std::fs::{self, File};
use std::io::Write;
use tempfile::TempDir;

/// Create a benchmark directory with the given number of files and directories
fn create_benchmark_dir(file_count: usize, dir_count: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    let files_per_dir = file_count / dir_count.max(1);

    for d in 0..dir_count {
        let subdir = root.join(format!("dir{}", d));
        fs::create_dir(&subdir).unwrap();

        for f in 0..files_per_dir {
            let mut file = File::create(subdir.join(format!("file{}.txt", f))).unwrap();
            file.write_all(&[b'x'; 256]).unwrap();
        }
    }

    dir
}

fn benchmark_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");
    let shutdown = ShutdownFlag::new();

    for size in [100, 1000, 5000].iter() {
        let dir = create_benchmark_dir(*size, 10);

        for jobs in [1, 4] {
            let options = WatchOptions {
                jobs,
                ..WatchOptions::new(dir.path())
            };

            group.bench_with_input(
                BenchmarkId::new(format!("jobs{}", jobs), size),
                size,
                |b, _| b.iter(|| sweep(black_box(&options), &SystemClock, &shutdown)),
            );
        }
    }

    group.finish();
}

fn benchmark_enumeration(c: &mut Criterion) {
    let dir = create_benchmark_dir(2000, 40);
    let shutdown = ShutdownFlag::new();

    c.bench_function("collect_candidates", |b| {
        b.iter(|| {
            let mut report = SweepReport::default();
            collect_candidates(black_box(dir.path()), &shutdown, &mut report)
        })
    });
}

criterion_group!(benches, benchmark_sweep, benchmark_enumeration);
criterion_main!(benches);
