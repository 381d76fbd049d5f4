// src/handoff/bounded_sync.rs

//! The synchronous, blocking producer and consumer handles.

use super::bounded_async::{AsyncConsumer, AsyncProducer};
use super::core::HandoffShared;
use super::Consumed;
use crate::error::{CloseError, ProduceError, TryConsumeError, TryProduceError};

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A synchronous producing handle for the handoff buffer.
///
/// Producers can be cloned to feed the buffer from multiple threads. When
/// the last producer handle is dropped (or explicitly closed), the stream
/// closes as if [`Handoff::close`](super::Handoff::close) had been called.
#[derive(Debug)]
pub struct Producer<T: Send> {
  pub(super) shared: Arc<HandoffShared<T>>,
  pub(super) closed: AtomicBool,
}

/// A synchronous consuming handle for the handoff buffer.
///
/// Consumers can be cloned to drain the buffer from multiple threads. Each
/// buffered item is delivered to exactly one consumer. When the last
/// consumer handle is dropped, further production is refused.
#[derive(Debug)]
pub struct Consumer<T: Send> {
  pub(super) shared: Arc<HandoffShared<T>>,
  pub(super) closed: AtomicBool,
}

impl<T: Send> Producer<T> {
  pub(super) fn mint(shared: &Arc<HandoffShared<T>>) -> Self {
    shared.register_producer();
    Producer {
      shared: Arc::clone(shared),
      closed: AtomicBool::new(false),
    }
  }

  /// Submits an item, blocking the current thread until a slot is free.
  ///
  /// Once the call returns `Ok`, the item is durably stored and will be
  /// delivered to exactly one future `consume`.
  ///
  /// # Errors
  ///
  /// Returns `Err(ProduceError::Closed)` with the item handed back if the
  /// stream has been closed.
  pub fn produce(&self, item: T) -> Result<(), ProduceError<T>> {
    if self.closed.load(Ordering::Relaxed) {
      return Err(ProduceError::Closed(item));
    }
    if !self.shared.vacant.acquire_sync() {
      return Err(ProduceError::Closed(item));
    }
    self.shared.commit_produce(item);
    Ok(())
  }

  /// Attempts to submit an item without blocking.
  pub fn try_produce(&self, item: T) -> Result<(), TryProduceError<T>> {
    if self.closed.load(Ordering::Relaxed) {
      return Err(TryProduceError::Closed(item));
    }
    self.shared.try_produce_core(item)
  }

  /// Closes this handle, an explicit alternative to `drop`. Closing the
  /// last producer handle closes the whole stream.
  ///
  /// # Errors
  ///
  /// Returns `Err(CloseError)` if this handle has already been closed.
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

  /// Converts this synchronous `Producer` into an `AsyncProducer`.
  ///
  /// This is a zero-cost conversion. The `Drop` implementation of the
  /// original `Producer` is not called.
  pub fn to_async(self) -> AsyncProducer<T> {
    let shared = unsafe { std::ptr::read(&self.shared) };
    mem::forget(self);
    AsyncProducer {
      shared,
      closed: AtomicBool::new(false),
    }
  }
}

impl<T: Send> Clone for Producer<T> {
  fn clone(&self) -> Self {
    Self::mint(&self.shared)
  }
}

impl<T: Send> Drop for Producer<T> {
  fn drop(&mut self) {
    // close() is a no-op on an already-closed handle.
    let _ = self.close();
  }
}

impl<T: Send> Consumer<T> {
  pub(super) fn mint(shared: &Arc<HandoffShared<T>>) -> Self {
    shared.register_consumer();
    Consumer {
      shared: Arc::clone(shared),
      closed: AtomicBool::new(false),
    }
  }

  /// Retrieves one item, blocking the current thread until one is
  /// available or the stream ends.
  ///
  /// Returns [`Consumed::EndOfStream`] once the stream is closed and every
  /// buffered item has been delivered; it never blocks past that point.
  pub fn consume(&self) -> Consumed<T> {
    if self.closed.load(Ordering::Relaxed) {
      return Consumed::EndOfStream;
    }
    if !self.shared.occupied.acquire_sync() {
      return Consumed::EndOfStream;
    }
    Consumed::Item(self.shared.commit_consume())
  }

  /// Attempts to retrieve an item without blocking.
  pub fn try_consume(&self) -> Result<T, TryConsumeError> {
    if self.closed.load(Ordering::Relaxed) {
      return Err(TryConsumeError::Closed);
    }
    self.shared.try_consume_core()
  }

  /// Closes this handle, an explicit alternative to `drop`. Once the last
  /// consumer handle is closed, further production is refused.
  ///
  /// # Errors
  ///
  /// Returns `Err(CloseError)` if this handle has already been closed.
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

  /// Converts this synchronous `Consumer` into an `AsyncConsumer`.
  ///
  /// This is a zero-cost conversion. The `Drop` implementation of the
  /// original `Consumer` is not called.
  pub fn to_async(self) -> AsyncConsumer<T> {
    let shared = unsafe { std::ptr::read(&self.shared) };
    mem::forget(self);
    AsyncConsumer {
      shared,
      closed: AtomicBool::new(false),
    }
  }
}

impl<T: Send> Clone for Consumer<T> {
  fn clone(&self) -> Self {
    Self::mint(&self.shared)
  }
}

impl<T: Send> Drop for Consumer<T> {
  fn drop(&mut self) {
    let _ = self.close();
  }
}
