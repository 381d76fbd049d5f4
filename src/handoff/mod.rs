// src/handoff/mod.rs

//! A bounded, lock-based MPMC handoff buffer with an explicit end-of-stream
//! protocol.
//!
//! Any number of producers submit items with `produce`; any number of
//! consumers retrieve them with `consume`. The buffer holds at most
//! `capacity` in-flight items: producers block on a full buffer and
//! consumers block on an empty one, with no busy-waiting on either side.
//! Once the stream is closed, consumers drain whatever is buffered and then
//! observe [`Consumed::EndOfStream`] instead of blocking forever.
//!
//! A key feature of this implementation is its ability to support
//! mixed-paradigm usage. You can attach a synchronous `Producer` and an
//! asynchronous `AsyncConsumer` (or any other combination) to the same
//! buffer, and they will interoperate correctly: both kinds of waiter share
//! the same counting-signal queues internally.
//!
//! ### When to use this buffer
//!
//! - Fan-in/fan-out pipelines where a fixed amount of buffering provides
//!   backpressure between stages.
//! - Work distribution where every item must be delivered to exactly one
//!   worker, and workers must learn deterministically when the work is done.
//!
//! Ordering is FIFO through the ring: items from a single producer are
//! delivered in the order produced; no order is guaranteed between items
//! from different producers.

pub use bounded_async::{AsyncConsumer, AsyncProducer, ConsumeFuture, ProduceFuture};
pub use bounded_sync::{Consumer, Producer};

mod bounded_async;
mod bounded_sync;
mod core;
mod ring;

#[cfg(test)]
mod bounded_tests;

use self::core::HandoffShared;
use crate::error::{CloseError, ShutdownError, StartupError};

use std::fmt;
use std::sync::Arc;

/// Outcome of a `consume` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumed<T> {
  /// One item, delivered to this consumer and to no other.
  Item(T),
  /// The stream is closed and fully drained; no item will ever arrive.
  EndOfStream,
}

impl<T> Consumed<T> {
  /// Returns the item, or `None` at end-of-stream.
  #[inline]
  pub fn into_item(self) -> Option<T> {
    match self {
      Consumed::Item(item) => Some(item),
      Consumed::EndOfStream => None,
    }
  }

  /// Returns `true` if this is a delivered item.
  #[inline]
  pub fn is_item(&self) -> bool {
    matches!(self, Consumed::Item(_))
  }

  /// Returns `true` at end-of-stream.
  #[inline]
  pub fn is_end_of_stream(&self) -> bool {
    matches!(self, Consumed::EndOfStream)
  }
}

/// Creates a new bounded handoff buffer holding at most `capacity` items.
///
/// Producer and consumer handles are minted from the returned [`Handoff`]
/// session handle. Fails with [`StartupError::ZeroCapacity`] for a zero
/// capacity and [`StartupError::ResourceExhausted`] if the slot storage
/// cannot be allocated.
pub fn bounded<T: Send>(capacity: usize) -> Result<Handoff<T>, StartupError> {
  let shared = Arc::new(HandoffShared::new(capacity)?);
  Ok(Handoff { shared })
}

/// The session handle for a handoff buffer.
///
/// The `Handoff` brackets the buffer's lifecycle: it mints producer and
/// consumer handles, closes the stream once production has permanently
/// ended, and verifies at [`shutdown`](Handoff::shutdown) that the full
/// produce → close → drain sequence completed.
pub struct Handoff<T: Send> {
  shared: Arc<HandoffShared<T>>,
}

impl<T: Send> fmt::Debug for Handoff<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Handoff")
      .field("capacity", &self.shared.capacity)
      .field("len", &self.shared.len())
      .field("closed", &self.shared.is_closed())
      .finish()
  }
}

impl<T: Send> Handoff<T> {
  /// Mints a synchronous producer handle.
  pub fn producer(&self) -> Producer<T> {
    Producer::mint(&self.shared)
  }

  /// Mints a synchronous consumer handle.
  pub fn consumer(&self) -> Consumer<T> {
    Consumer::mint(&self.shared)
  }

  /// Mints an asynchronous producer handle.
  pub fn async_producer(&self) -> AsyncProducer<T> {
    AsyncProducer::mint(&self.shared)
  }

  /// Mints an asynchronous consumer handle.
  pub fn async_consumer(&self) -> AsyncConsumer<T> {
    AsyncConsumer::mint(&self.shared)
  }

  /// Closes the stream: no further items are accepted, and every consumer
  /// observes [`Consumed::EndOfStream`] once the buffer is drained.
  ///
  /// Call this once, after all producers are known to have finished. Every
  /// parked producer and consumer is woken so it can observe the closure.
  ///
  /// # Errors
  ///
  /// Returns `Err(CloseError)` if the stream is already closed, including
  /// the implicit close that happens when the last producer handle is
  /// dropped.
  pub fn close(&self) -> Result<(), CloseError> {
    self.shared.close_core()
  }

  /// Tears down the session after verifying the produce → close → drain
  /// sequence completed.
  ///
  /// # Errors
  ///
  /// Reports the most specific usage error and hands the session back via
  /// [`ShutdownError::into_inner`] so the caller can finish the sequence
  /// and retry:
  ///
  /// - [`ShutdownError::ProducersBlocked`]: a producer is still parked
  ///   inside `produce`.
  /// - [`ShutdownError::StillOpen`]: [`close`](Handoff::close) was never
  ///   called.
  /// - [`ShutdownError::Undrained`]: unconsumed items remain.
  pub fn shutdown(self) -> Result<(), ShutdownError<Handoff<T>>> {
    if self.shared.vacant.waiting() > 0 {
      return Err(ShutdownError::ProducersBlocked(self));
    }
    {
      let guard = self.shared.internal.lock();
      if !guard.closed {
        drop(guard);
        return Err(ShutdownError::StillOpen(self));
      }
      if !guard.ring.is_empty() {
        drop(guard);
        return Err(ShutdownError::Undrained(self));
      }
    }
    // Dropping the handle releases the session's reference; outstanding
    // producer/consumer handles keep the allocation alive until they drop.
    Ok(())
  }

  /// Returns the fixed capacity of the buffer.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.shared.capacity
  }

  /// Returns the number of items currently buffered.
  #[inline]
  pub fn len(&self) -> usize {
    self.shared.len()
  }

  /// Returns `true` if no items are currently buffered.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns `true` once the stream has been closed.
  #[inline]
  pub fn is_closed(&self) -> bool {
    self.shared.is_closed()
  }
}
