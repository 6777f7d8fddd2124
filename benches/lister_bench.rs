use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use dirlister::{DirectoryLister, ListerHandle, list_directory};
use std::hint::black_box;
use std::path::{Path, PathBuf};

// Fill a scratch directory with `count` files plus a handful of subdirectories
fn populate(count: usize) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dirlister_bench_{}_{count}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    for i in 0..count {
        std::fs::write(dir.join(format!("file_{i}.txt")), b"").unwrap();
    }
    for i in 0..count / 10 {
        std::fs::create_dir(dir.join(format!("dir_{i}"))).unwrap();
    }
    dir
}

fn count_native(dir: &Path) -> usize {
    let mut handle = ListerHandle::open(dir);
    let mut total = 0;
    while handle.advance() {
        if let Some(entry) = handle.current() {
            total += usize::from(!entry.is_dot_or_dot_dot());
            black_box(entry.entry_type());
        }
    }
    total
}

fn count_std(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| black_box(entry.file_type().ok()))
        .count()
}

fn bench_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_one_directory");
    for count in [100_usize, 1_000, 10_000] {
        let dir = populate(count);
        group.throughput(Throughput::Elements((count + count / 10) as u64));

        group.bench_with_input(BenchmarkId::new("lister_handle", count), &dir, |b, d| {
            b.iter(|| black_box(count_native(black_box(d))));
        });
        group.bench_with_input(BenchmarkId::new("std_read_dir", count), &dir, |b, d| {
            b.iter(|| black_box(count_std(black_box(d))));
        });
        group.bench_with_input(BenchmarkId::new("list_directory", count), &dir, |b, d| {
            b.iter(|| black_box(list_directory(black_box(d), false).unwrap().len()));
        });

        let _ = std::fs::remove_dir_all(&dir);
    }
    group.finish();
}

criterion_group!(benches, bench_listing);
criterion_main!(benches);
