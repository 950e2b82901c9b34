use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use logzio_sink::{EventRecord, Level, PayloadEncoder, PropertyValue};

fn sample_records(count: usize) -> Vec<EventRecord> {
    (0..count)
        .map(|i| {
            EventRecord::builder(Level::Information, "GET {Path} responded {Status} in {Elapsed} ms")
                .rendered(format!("GET /api/users/{i} responded 200 in 12.5 ms"))
                .property("Path", format!("/api/users/{i}"))
                .property("Status", 200)
                .property("Elapsed", 12.5)
                .property("SourceContext", "web::handlers")
                .property("ThreadId", 4)
                .property(
                    "Request",
                    PropertyValue::structure([
                        ("Method", PropertyValue::from("GET")),
                        ("Headers", PropertyValue::from(vec!["accept", "user-agent"])),
                    ]),
                )
                .build()
        })
        .collect()
}

fn benchmark_encode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_batch");

    for size in [1usize, 100, 1000] {
        let records = sample_records(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("prefixed", size), &records, |b, records| {
            let encoder = PayloadEncoder::new(false);
            b.iter(|| std::hint::black_box(encoder.encode(records)));
        });

        group.bench_with_input(BenchmarkId::new("flattened", size), &records, |b, records| {
            let encoder = PayloadEncoder::new(true);
            b.iter(|| std::hint::black_box(encoder.encode(records)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_encode_batch);
criterion_main!(benches);
