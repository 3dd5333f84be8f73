use std::{hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tidings::{
    Level, MemorySink, Message, MessageRouter, Pipeline, Record, ReservedKeys, Sink,
    SubscriberRef,
};
use tidings_error::DeliveryError;

/// Приёмник, который ничего не делает.
struct NullSink;

impl Sink for NullSink {
    fn write(
        &self,
        _level: Level,
        _record: &Record<'_>,
    ) {
    }
}

fn router() -> MessageRouter {
    MessageRouter::builder()
        .log_sink(Arc::new(NullSink))
        .dead_sink(Arc::new(NullSink))
        .build()
        .expect("router")
}

fn noop() -> SubscriberRef {
    Arc::new(|m: &Message| -> Result<(), DeliveryError> {
        black_box(m);
        Ok(())
    })
}

fn bench_subscribe(c: &mut Criterion) {
    let router = router();
    let sub = noop();
    c.bench_function("router_subscribe_existing", |b| {
        b.iter(|| router.subscribe(black_box("chan"), sub.clone()).unwrap())
    });
}

fn bench_publish_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_fan_out");
    for n in [0usize, 1, 10, 100] {
        let router = router();
        for _ in 0..n {
            router.subscribe("chan", noop()).unwrap();
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let msg = router.message("chan").with("payload", "x");
                router.publish(black_box(msg)).unwrap();
            })
        });
    }
    group.finish();
}

fn bench_dead_letter_capture(c: &mut Criterion) {
    let sink = Arc::new(MemorySink::new());
    let router = MessageRouter::builder()
        .log_sink(Arc::new(NullSink))
        .dead_sink(sink.clone())
        .build()
        .expect("router");
    c.bench_function("publish_dead_letter_memory_sink", |b| {
        b.iter(|| {
            router.publish(router.message("void")).unwrap();
            if sink.len() > 1024 {
                sink.drain();
            }
        })
    });
}

fn bench_annotation(c: &mut Criterion) {
    let pipeline = Pipeline::standard();
    let keys = ReservedKeys::default();
    let base = Message::new()
        .with(keys.topic.clone(), "chan")
        .with("amount", 10);
    c.bench_function("annotate_standard_pipeline", |b| {
        b.iter(|| black_box(pipeline.run(base.clone(), &keys)))
    });
}

criterion_group!(
    benches,
    bench_subscribe,
    bench_publish_fan_out,
    bench_dead_letter_capture,
    bench_annotation,
);
criterion_main!(benches);
