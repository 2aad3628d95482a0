use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use detab::{run, PipelineConfig, TabConverters};
use std::{fs::File, io::Write, num::NonZeroUsize};
use tempfile::{tempdir, TempDir};

fn tabbed_source(lines: usize) -> String {
    let mut text = String::new();
    for i in 0..lines {
        text.push_str(&format!(
            "\tif (x{} > 0) {{\t\t// check {}\n\t\treturn x{};\t/* done */\n\t}}\n",
            i, i, i
        ));
    }
    text
}

fn create_test_files(file_count: usize, lines_per_file: usize) -> std::io::Result<TempDir> {
    let dir = tempdir()?;
    let content = tabbed_source(lines_per_file);
    for i in 0..file_count {
        let mut file = File::create(dir.path().join(format!("test_{}.c", i)))?;
        file.write_all(content.as_bytes())?;
    }
    Ok(dir)
}

fn bench_tab_widths(c: &mut Criterion) {
    let text = tabbed_source(200);

    let mut group = c.benchmark_group("Tab Width");
    for width in [0i64, 1, 2, 4, 8] {
        let converters = TabConverters::new(width).unwrap();
        group.bench_function(format!("width_{}", width), |b| {
            b.iter(|| black_box(converters.apply(black_box(&text)).len()));
        });
    }
    group.finish();
}

fn bench_converter_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Converter Construction");
    for width in [4i64, 32, 127] {
        group.bench_function(format!("width_{}", width), |b| {
            b.iter(|| black_box(TabConverters::new(black_box(width)).unwrap()));
        });
    }
    group.finish();
}

fn bench_pipeline_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pipeline Workers");
    group.sample_size(10);
    for workers in [1usize, 2, 4] {
        group.bench_function(format!("workers_{}", workers), |b| {
            b.iter_batched(
                || create_test_files(100, 50).unwrap(),
                |dir| {
                    let mut config = PipelineConfig::new(dir.path(), r"\.c$", 4);
                    config.worker_count = NonZeroUsize::new(workers).unwrap();
                    black_box(run(&config).unwrap());
                    dir
                },
                BatchSize::PerIteration,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_tab_widths,
    bench_converter_construction,
    bench_pipeline_workers
);
criterion_main!(benches);
