use super::*;
use crate::error::{ProduceError, StartupError, TryConsumeError, TryProduceError};

use std::future::poll_fn;
use std::thread;
use std::time::Duration;

#[test]
fn startup_rejects_zero_capacity() {
  assert_eq!(
    bounded::<u32>(0).unwrap_err(),
    StartupError::ZeroCapacity
  );
}

#[test]
fn sync_produce_consume() {
  let hub = bounded(2).unwrap();
  let p = hub.producer();
  let c = hub.consumer();

  p.produce(1).unwrap();
  p.produce(2).unwrap();
  assert_eq!(hub.len(), 2);
  assert_eq!(c.consume(), Consumed::Item(1));
  assert_eq!(c.consume(), Consumed::Item(2));
  assert!(hub.is_empty());
}

#[test]
fn sync_try_produce_full() {
  let hub = bounded(1).unwrap();
  let p = hub.producer();
  let _c = hub.consumer();

  p.try_produce(10).unwrap();
  assert_eq!(p.try_produce(20), Err(TryProduceError::Full(20)));
  hub.close().unwrap();
  assert_eq!(p.try_produce(30), Err(TryProduceError::Closed(30)));
}

#[test]
fn sync_try_consume_empty_then_closed() {
  let hub = bounded(1).unwrap();
  let p = hub.producer();
  let c = hub.consumer();

  assert_eq!(c.try_consume(), Err(TryConsumeError::Empty));
  p.produce(7).unwrap();
  assert_eq!(c.try_consume(), Ok(7));
  hub.close().unwrap();
  assert_eq!(c.try_consume(), Err(TryConsumeError::Closed));
}

#[test]
fn sync_produce_blocks_until_slot_frees() {
  let hub = bounded(1).unwrap();
  let p = hub.producer();
  let c = hub.consumer();
  p.produce(1).unwrap();

  let produce_handle = thread::spawn(move || {
    p.produce(2).unwrap(); // This should block
  });

  thread::sleep(Duration::from_millis(100));
  assert!(!produce_handle.is_finished(), "Produce should have blocked");

  assert_eq!(c.consume(), Consumed::Item(1));
  produce_handle.join().expect("Produce thread panicked");
  assert_eq!(c.consume(), Consumed::Item(2));
}

#[test]
fn sync_consume_blocks_until_item_arrives() {
  let hub = bounded(1).unwrap();
  let p = hub.producer();
  let c = hub.consumer();

  let consume_handle = thread::spawn(move || c.consume());

  thread::sleep(Duration::from_millis(100));
  assert!(!consume_handle.is_finished(), "Consume should have blocked");

  p.produce(42).unwrap();
  assert_eq!(
    consume_handle.join().expect("Consume thread panicked"),
    Consumed::Item(42)
  );
}

#[test]
fn close_drains_then_reports_end_of_stream() {
  let hub = bounded(3).unwrap();
  let p = hub.producer();
  let c = hub.consumer();

  p.produce('a').unwrap();
  p.produce('b').unwrap();
  p.produce('c').unwrap();
  hub.close().unwrap();

  assert_eq!(c.consume(), Consumed::Item('a'));
  assert_eq!(c.consume(), Consumed::Item('b'));
  assert_eq!(c.consume(), Consumed::Item('c'));
  assert_eq!(c.consume(), Consumed::EndOfStream);
  // End-of-stream is a latch, not a one-shot.
  assert_eq!(c.consume(), Consumed::EndOfStream);
}

#[test]
fn produce_after_close_returns_the_item() {
  let hub = bounded(2).unwrap();
  let p = hub.producer();
  let _c = hub.consumer();

  hub.close().unwrap();
  let err = p.produce(5).unwrap_err();
  assert_eq!(err, ProduceError::Closed(5));
  assert_eq!(err.into_inner(), 5);
  assert_eq!(hub.close(), Err(crate::error::CloseError));
}

#[test]
fn close_wakes_blocked_consumer() {
  let hub = bounded::<u32>(1).unwrap();
  let c = hub.consumer();

  let consume_handle = thread::spawn(move || c.consume());
  thread::sleep(Duration::from_millis(100));
  assert!(!consume_handle.is_finished(), "Consume should have blocked");

  hub.close().unwrap();
  assert_eq!(
    consume_handle.join().expect("Consume thread panicked"),
    Consumed::EndOfStream
  );
}

#[test]
fn dropping_last_producer_closes_the_stream() {
  let hub = bounded(2).unwrap();
  let p = hub.producer();
  let p2 = p.clone();
  let c = hub.consumer();

  p.produce(1).unwrap();
  drop(p);
  assert!(!hub.is_closed(), "A producer is still live");
  drop(p2);
  assert!(hub.is_closed());

  assert_eq!(c.consume(), Consumed::Item(1));
  assert_eq!(c.consume(), Consumed::EndOfStream);
}

#[test]
fn dropping_last_consumer_refuses_production() {
  let hub = bounded(2).unwrap();
  let p = hub.producer();
  let c = hub.consumer();

  drop(c);
  assert_eq!(p.produce(1), Err(ProduceError::Closed(1)));
}

#[test]
fn shutdown_requires_close_first() {
  let hub = bounded::<u32>(2).unwrap();
  let err = hub.shutdown().unwrap_err();
  assert!(matches!(err, crate::error::ShutdownError::StillOpen(_)));

  let hub = err.into_inner();
  hub.close().unwrap();
  hub.shutdown().unwrap();
}

#[test]
fn shutdown_requires_a_drained_buffer() {
  let hub = bounded(2).unwrap();
  let p = hub.producer();
  let c = hub.consumer();

  p.produce(9).unwrap();
  hub.close().unwrap();

  let err = hub.shutdown().unwrap_err();
  assert!(matches!(err, crate::error::ShutdownError::Undrained(_)));

  let hub = err.into_inner();
  assert_eq!(c.consume(), Consumed::Item(9));
  assert_eq!(c.consume(), Consumed::EndOfStream);
  hub.shutdown().unwrap();
}

#[tokio::test]
async fn async_produce_consume() {
  let hub = bounded(2).unwrap();
  let p = hub.async_producer();
  let c = hub.async_consumer();

  p.produce(1).await.unwrap();
  p.produce(2).await.unwrap();
  assert_eq!(c.consume().await, Consumed::Item(1));
  assert_eq!(c.consume().await, Consumed::Item(2));
}

#[tokio::test]
async fn async_produce_waits_for_a_slot() {
  let hub = bounded(1).unwrap();
  let p = hub.async_producer();
  let c = hub.async_consumer();
  p.produce(1).await.unwrap();

  let produce_task = tokio::spawn(async move {
    p.produce(2).await.unwrap();
  });

  tokio::time::sleep(Duration::from_millis(50)).await;
  assert!(!produce_task.is_finished(), "Produce task should be waiting");

  assert_eq!(c.consume().await, Consumed::Item(1));
  produce_task.await.unwrap();
  assert_eq!(c.consume().await, Consumed::Item(2));
}

#[tokio::test]
async fn async_close_ends_the_stream() {
  let hub = bounded(2).unwrap();
  let p = hub.async_producer();
  let c = hub.async_consumer();

  p.produce(3).await.unwrap();
  hub.close().unwrap();

  assert_eq!(c.consume().await, Consumed::Item(3));
  assert_eq!(c.consume().await, Consumed::EndOfStream);
  let err = p.produce(4).await.unwrap_err();
  assert_eq!(err.into_inner(), 4);
}

#[tokio::test]
async fn async_consumer_is_a_stream() {
  use futures_core::Stream;
  use std::pin::Pin;

  let hub = bounded(3).unwrap();
  let p = hub.async_producer();
  let mut c = hub.async_consumer();

  for i in 0..3 {
    p.produce(i).await.unwrap();
  }
  hub.close().unwrap();

  let mut collected = Vec::new();
  loop {
    match poll_fn(|cx| Pin::new(&mut c).poll_next(cx)).await {
      Some(item) => collected.push(item),
      None => break,
    }
  }
  assert_eq!(collected, vec![0, 1, 2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sync_producer_feeds_async_consumer() {
  let hub = bounded(2).unwrap();
  let p = hub.producer();
  let c = hub.async_consumer();

  let producer_thread = thread::spawn(move || {
    for i in 0..10 {
      p.produce(i).unwrap();
    }
    // Dropping the handle closes the stream.
  });

  let mut total = 0;
  let mut count = 0;
  loop {
    match c.consume().await {
      Consumed::Item(v) => {
        total += v;
        count += 1;
      }
      Consumed::EndOfStream => break,
    }
  }
  producer_thread.join().unwrap();
  assert_eq!(count, 10);
  assert_eq!(total, (0..10).sum::<i32>());
}

#[test]
fn handle_conversions_preserve_the_stream() {
  let hub = bounded(2).unwrap();
  let p = hub.producer().to_async().to_sync();
  let c = hub.consumer().to_async().to_sync();

  p.produce(11).unwrap();
  assert_eq!(c.consume(), Consumed::Item(11));
  assert!(!hub.is_closed(), "Conversions must not retire the handles");
}
