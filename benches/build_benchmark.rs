use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use Xylemdb::build::parser::{Event, EventParser};
use Xylemdb::build::{build_disk, build_mem};
use Xylemdb::core::config::Config;

/// Helper to create a synthetic document with the given number of records
fn create_test_events(records: usize) -> Vec<Event> {
    let mut rng = rand::thread_rng();
    let words = ["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog"];

    let mut events = vec![Event::open_doc("bench.xml")];
    events.push(Event::open_elem("records"));
    for i in 0..records {
        let id = i.to_string();
        let category = format!("category_{}", i % 10);
        events.push(Event::open_elem_with(
            "record",
            &[("id", id.as_str()), ("category", category.as_str())],
            &[],
        ));
        let text: String = (0..20)
            .map(|_| words[rng.gen_range(0..words.len())])
            .collect::<Vec<_>>()
            .join(" ");
        events.push(Event::text(&text));
        events.push(Event::CloseElem);
    }
    events.push(Event::CloseElem);
    events.push(Event::CloseDoc);
    events
}

/// Benchmark the in-memory backend at increasing document sizes
fn bench_mem_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("mem_build");
    for records in [100, 1_000, 10_000] {
        let events = create_test_events(records);
        group.bench_with_input(
            BenchmarkId::from_parameter(records),
            &events,
            |b, events| {
                b.iter(|| {
                    let mut parser = EventParser::new(events.clone());
                    let data = build_mem("bench", &Config::default(), &mut parser).unwrap();
                    black_box(data.rows())
                });
            },
        );
    }
    group.finish();
}

/// Benchmark the disk backend including the size-patch pass
fn bench_disk_build(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        storage_path: dir.path().to_path_buf(),
        ..Config::default()
    };
    let events = create_test_events(1_000);

    c.bench_function("disk_build_1000", |b| {
        b.iter(|| {
            let mut parser = EventParser::new(events.clone());
            let data = build_disk("bench", &config, &mut parser).unwrap();
            black_box(data.meta.size)
        });
    });
}

criterion_group!(benches, bench_mem_build, bench_disk_build);
criterion_main!(benches);
