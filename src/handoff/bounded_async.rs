// src/handoff/bounded_async.rs

//! The asynchronous, future-based producer and consumer handles.

use futures_core::Stream;

use super::bounded_sync::{Consumer, Producer};
use super::core::HandoffShared;
use super::Consumed;
use crate::error::{CloseError, ProduceError, TryConsumeError, TryProduceError};

use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// An asynchronous producing handle for the handoff buffer.
///
/// Interoperates freely with synchronous handles attached to the same
/// buffer. When the last producer handle (sync or async) is dropped, the
/// stream closes.
#[derive(Debug)]
pub struct AsyncProducer<T: Send> {
  pub(super) shared: Arc<HandoffShared<T>>,
  pub(super) closed: AtomicBool,
}

/// An asynchronous consuming handle for the handoff buffer.
///
/// Also usable as a [`Stream`] that yields every delivered item and
/// terminates at end-of-stream.
#[derive(Debug)]
pub struct AsyncConsumer<T: Send> {
  pub(super) shared: Arc<HandoffShared<T>>,
  pub(super) closed: AtomicBool,
}

impl<T: Send> AsyncProducer<T> {
  pub(super) fn mint(shared: &Arc<HandoffShared<T>>) -> Self {
    shared.register_producer();
    AsyncProducer {
      shared: Arc::clone(shared),
      closed: AtomicBool::new(false),
    }
  }

  /// Submits an item asynchronously.
  ///
  /// The returned future completes once the item is durably stored, or
  /// with `Err(ProduceError::Closed)` (item handed back) if the stream has
  /// been closed.
  pub fn produce(&self, item: T) -> ProduceFuture<'_, T> {
    ProduceFuture {
      producer: self,
      item: Some(item),
    }
  }

  /// Attempts to submit an item without waiting.
  pub fn try_produce(&self, item: T) -> Result<(), TryProduceError<T>> {
    if self.closed.load(Ordering::Relaxed) {
      return Err(TryProduceError::Closed(item));
    }
    self.shared.try_produce_core(item)
  }

  /// Closes this handle. See [`Producer::close`] for the semantics.
  pub fn close(&self) -> Result<(), CloseError> {
    if self
      .closed
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
      .is_ok()
    {
      self.shared.retire_producer();
      Ok(())
    } else {
      Err(CloseError)
    }
  }

  /// Returns `true` once the stream has been closed.
  pub fn is_closed(&self) -> bool {
    self.shared.is_closed()
  }

  /// Returns the fixed capacity of the buffer.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.shared.capacity
  }

  /// Converts this `AsyncProducer` into a synchronous `Producer`.
  ///
  /// This is a zero-cost conversion. The `Drop` implementation of the
  /// original `AsyncProducer` is not called.
  pub fn to_sync(self) -> Producer<T> {
    let shared = unsafe { std::ptr::read(&self.shared) };
    mem::forget(self);
    Producer {
      shared,
      closed: AtomicBool::new(false),
    }
  }
}

impl<T: Send> Clone for AsyncProducer<T> {
  fn clone(&self) -> Self {
    Self::mint(&self.shared)
  }
}

impl<T: Send> Drop for AsyncProducer<T> {
  fn drop(&mut self) {
    let _ = self.close();
  }
}

impl<T: Send> AsyncConsumer<T> {
  pub(super) fn mint(shared: &Arc<HandoffShared<T>>) -> Self {
    shared.register_consumer();
    AsyncConsumer {
      shared: Arc::clone(shared),
      closed: AtomicBool::new(false),
    }
  }

  /// Retrieves one item asynchronously.
  ///
  /// The returned future resolves to [`Consumed::Item`] or, once the
  /// stream is closed and drained, to [`Consumed::EndOfStream`].
  pub fn consume(&self) -> ConsumeFuture<'_, T> {
    ConsumeFuture { consumer: self }
  }

  /// Attempts to retrieve an item without waiting.
  pub fn try_consume(&self) -> Result<T, TryConsumeError> {
    if self.closed.load(Ordering::Relaxed) {
      return Err(TryConsumeError::Closed);
    }
    self.shared.try_consume_core()
  }

  /// Closes this handle. See [`Consumer::close`] for the semantics.
  pub fn close(&self) -> Result<(), CloseError> {
    if self
      .closed
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
      .is_ok()
    {
      self.shared.retire_consumer();
      Ok(())
    } else {
      Err(CloseError)
    }
  }

  /// Returns `true` once the stream has been closed.
  pub fn is_closed(&self) -> bool {
    self.shared.is_closed()
  }

  /// Returns the fixed capacity of the buffer.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.shared.capacity
  }

  /// Converts this `AsyncConsumer` into a synchronous `Consumer`.
  ///
  /// This is a zero-cost conversion. The `Drop` implementation of the
  /// original `AsyncConsumer` is not called.
  pub fn to_sync(self) -> Consumer<T> {
    let shared = unsafe { std::ptr::read(&self.shared) };
    mem::forget(self);
    Consumer {
      shared,
      closed: AtomicBool::new(false),
    }
  }
}

impl<T: Send> Clone for AsyncConsumer<T> {
  fn clone(&self) -> Self {
    Self::mint(&self.shared)
  }
}

impl<T: Send> Drop for AsyncConsumer<T> {
  fn drop(&mut self) {
    let _ = self.close();
  }
}

// --- Futures ---

/// A future that completes when an item has been stored in the buffer.
#[must_use = "futures do nothing unless you .await or poll them"]
#[derive(Debug)]
pub struct ProduceFuture<'a, T: Send> {
  producer: &'a AsyncProducer<T>,
  // The item is wrapped in an Option so it can be taken during the poll.
  item: Option<T>,
}

impl<T: Send> Future for ProduceFuture<'_, T> {
  type Output = Result<(), ProduceError<T>>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    // The future never moves its fields out from behind the pin except via
    // this exclusive reference, and neither field is structurally pinned.
    let this = unsafe { self.as_mut().get_unchecked_mut() };

    if this.item.is_none() {
      // Polled again after completion.
      return Poll::Ready(Ok(()));
    }
    if this.producer.closed.load(Ordering::Relaxed) {
      let item = this.item.take().expect("item checked above");
      return Poll::Ready(Err(ProduceError::Closed(item)));
    }

    match this.producer.shared.vacant.poll_acquire(cx) {
      Poll::Pending => Poll::Pending,
      Poll::Ready(true) => {
        // The vacancy permit and the slot commit happen inside this single
        // poll, so a dropped future can never strand a reservation.
        let item = this.item.take().expect("item checked above");
        this.producer.shared.commit_produce(item);
        Poll::Ready(Ok(()))
      }
      Poll::Ready(false) => {
        let item = this.item.take().expect("item checked above");
        Poll::Ready(Err(ProduceError::Closed(item)))
      }
    }
  }
}

/// A future that resolves to one delivered item or to end-of-stream.
#[must_use = "futures do nothing unless you .await or poll them"]
#[derive(Debug)]
pub struct ConsumeFuture<'a, T: Send> {
  consumer: &'a AsyncConsumer<T>,
}

impl<T: Send> Future for ConsumeFuture<'_, T> {
  type Output = Consumed<T>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    if self.consumer.closed.load(Ordering::Relaxed) {
      return Poll::Ready(Consumed::EndOfStream);
    }
    match self.consumer.shared.occupied.poll_acquire(cx) {
      Poll::Pending => Poll::Pending,
      Poll::Ready(true) => Poll::Ready(Consumed::Item(self.consumer.shared.commit_consume())),
      Poll::Ready(false) => Poll::Ready(Consumed::EndOfStream),
    }
  }
}

impl<T: Send> Stream for AsyncConsumer<T> {
  type Item = T;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    if self.closed.load(Ordering::Relaxed) {
      return Poll::Ready(None);
    }
    match self.shared.occupied.poll_acquire(cx) {
      Poll::Pending => Poll::Pending,
      Poll::Ready(true) => Poll::Ready(Some(self.shared.commit_consume())),
      Poll::Ready(false) => Poll::Ready(None),
    }
  }
}
