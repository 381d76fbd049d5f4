mod common;
use common::*;

use conveyor::{handoff, Consumed};
use serial_test::serial;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
#[serial]
fn sync_mpmc_stress() {
  let num_producers = 8;
  let num_consumers = 8;
  let hub = handoff::bounded(4).unwrap();
  let delivered = Arc::new(AtomicUsize::new(0));
  let sum = Arc::new(AtomicUsize::new(0));

  let mut producer_threads = Vec::new();
  for _ in 0..num_producers {
    let producer = hub.producer();
    producer_threads.push(thread::spawn(move || {
      for i in 1..=ITEMS_HIGH {
        producer.produce(i).unwrap();
        // A yield can help expose more interleavings.
        if i % 64 == 0 {
          thread::yield_now();
        }
      }
    }));
  }

  let mut consumer_threads = Vec::new();
  for _ in 0..num_consumers {
    let consumer = hub.consumer();
    let delivered = delivered.clone();
    let sum = sum.clone();
    consumer_threads.push(thread::spawn(move || loop {
      match consumer.consume() {
        Consumed::Item(v) => {
          delivered.fetch_add(1, Ordering::Relaxed);
          sum.fetch_add(v, Ordering::Relaxed);
        }
        Consumed::EndOfStream => break,
      }
    }));
  }

  for handle in producer_threads {
    handle.join().unwrap();
  }
  hub.close().unwrap();
  for handle in consumer_threads {
    handle.join().unwrap();
  }

  assert_eq!(delivered.load(Ordering::Relaxed), num_producers * ITEMS_HIGH);
  let expected_sum = num_producers * (ITEMS_HIGH * (ITEMS_HIGH + 1) / 2);
  assert_eq!(sum.load(Ordering::Relaxed), expected_sum);
  hub.shutdown().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn mixed_paradigm_stress() {
  // Half the producers are OS threads, half are tokio tasks; same split for
  // consumers. Every item must still be delivered exactly once.
  let hub = handoff::bounded(2).unwrap();
  let delivered = Arc::new(AtomicUsize::new(0));

  let mut producer_threads = Vec::new();
  for _ in 0..2 {
    let producer = hub.producer();
    producer_threads.push(thread::spawn(move || {
      for i in 0..ITEMS_HIGH {
        producer.produce(i).unwrap();
      }
    }));
  }
  let mut producer_tasks = Vec::new();
  for _ in 0..2 {
    let producer = hub.async_producer();
    producer_tasks.push(tokio::spawn(async move {
      for i in 0..ITEMS_HIGH {
        producer.produce(i).await.unwrap();
      }
    }));
  }

  let mut consumer_threads = Vec::new();
  for _ in 0..2 {
    let consumer = hub.consumer();
    let delivered = delivered.clone();
    consumer_threads.push(thread::spawn(move || loop {
      match consumer.consume() {
        Consumed::Item(_) => {
          delivered.fetch_add(1, Ordering::Relaxed);
        }
        Consumed::EndOfStream => break,
      }
    }));
  }
  let mut consumer_tasks = Vec::new();
  for _ in 0..2 {
    let consumer = hub.async_consumer();
    let delivered = delivered.clone();
    consumer_tasks.push(tokio::spawn(async move {
      loop {
        match consumer.consume().await {
          Consumed::Item(_) => {
            delivered.fetch_add(1, Ordering::Relaxed);
          }
          Consumed::EndOfStream => break,
        }
      }
    }));
  }

  for task in producer_tasks {
    task.await.unwrap();
  }
  // Joining OS threads from an async test is fine here: the producers have
  // bounded work and the consumers drain concurrently on other workers.
  for handle in producer_threads {
    handle.join().unwrap();
  }
  hub.close().unwrap();
  for task in consumer_tasks {
    task.await.unwrap();
  }
  for handle in consumer_threads {
    handle.join().unwrap();
  }

  assert_eq!(delivered.load(Ordering::Relaxed), 4 * ITEMS_HIGH);
}

#[test]
#[serial]
fn single_slot_stress() {
  // The tightest configuration: every produce and consume contends for one
  // slot, maximizing gate traffic.
  let hub = handoff::bounded(1).unwrap();
  let delivered = Arc::new(AtomicUsize::new(0));

  let mut producer_threads = Vec::new();
  for _ in 0..4 {
    let producer = hub.producer();
    producer_threads.push(thread::spawn(move || {
      for i in 0..ITEMS_HIGH {
        producer.produce(i).unwrap();
      }
    }));
  }

  let mut consumer_threads = Vec::new();
  for _ in 0..4 {
    let consumer = hub.consumer();
    let delivered = delivered.clone();
    consumer_threads.push(thread::spawn(move || loop {
      match consumer.consume() {
        Consumed::Item(_) => {
          delivered.fetch_add(1, Ordering::Relaxed);
        }
        Consumed::EndOfStream => break,
      }
    }));
  }

  for handle in producer_threads {
    handle.join().unwrap();
  }
  hub.close().unwrap();
  for handle in consumer_threads {
    handle.join().unwrap();
  }

  assert_eq!(delivered.load(Ordering::Relaxed), 4 * ITEMS_HIGH);
}
