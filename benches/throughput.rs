use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use conveyor::{handoff, Consumed};
use std::thread;

const NUM_ITEMS: usize = 10_000;

fn bench_sync_throughput(c: &mut Criterion) {
  let mut group = c.benchmark_group("handoff_sync_throughput");
  group.throughput(Throughput::Elements(NUM_ITEMS as u64));

  for capacity in [1usize, 16, 256] {
    group.bench_with_input(
      BenchmarkId::from_parameter(capacity),
      &capacity,
      |b, &capacity| {
        b.iter(|| {
          let hub = handoff::bounded(capacity).unwrap();
          let producer = hub.producer();
          let consumer = hub.consumer();

          let producer_thread = thread::spawn(move || {
            for i in 0..NUM_ITEMS {
              producer.produce(i).unwrap();
            }
          });

          let mut delivered = 0;
          while let Consumed::Item(_) = consumer.consume() {
            delivered += 1;
          }
          producer_thread.join().unwrap();
          assert_eq!(delivered, NUM_ITEMS);
        });
      },
    );
  }
  group.finish();
}

criterion_group!(benches, bench_sync_throughput);
criterion_main!(benches);
