// src/handoff/core.rs

//! The core shared state and logic for the handoff buffer.
//!
//! This module contains the `HandoffShared` struct that every handle points
//! at. The design is the classic bounded-buffer decomposition:
//!
//! 1.  **Two counting signals**: `vacant` counts free slots (initially the
//!     full capacity) and `occupied` counts stored items (initially zero).
//!     Producers block on `vacant`, consumers on `occupied`. Both gates
//!     accept mixed sync and async waiters, which is what lets blocking and
//!     future-based handles interoperate on one buffer.
//! 2.  **One exclusion region**: a `parking_lot::Mutex` guards the slot ring,
//!     the closed latch, and the live-handle counts. No caller ever waits on
//!     a gate while holding the region, so producers and consumers cannot
//!     form a deadlock cycle.
//! 3.  **Close as a latch**: closing marks the region state and then closes
//!     both gates, waking every parked task. The `occupied` gate drains its
//!     remaining permits first (buffered items survive close), while the
//!     `vacant` gate refuses immediately (no item is accepted after close).
//!
//! Permit accounting keeps the ring reservations infallible: a producer only
//! reaches `reserve_empty` while holding a vacancy, and
//! `vacancies + held vacancies == capacity − len` at every consistent point;
//! symmetrically for consumers and occupancies.

use crate::coord::{ClosePolicy, CountGate, TryAcquire};
use crate::error::{CloseError, StartupError, TryConsumeError, TryProduceError};

use super::ring::SlotRing;

use parking_lot::Mutex;

/// The mutex-protected portion of the buffer state.
#[derive(Debug)]
pub(crate) struct HandoffInternal<T> {
  /// The slot storage for in-flight items.
  pub(crate) ring: SlotRing<T>,
  /// Latched by `close`; never cleared.
  pub(crate) closed: bool,
  /// The number of live `Producer` and `AsyncProducer` handles.
  pub(crate) producer_count: usize,
  /// The number of live `Consumer` and `AsyncConsumer` handles.
  pub(crate) consumer_count: usize,
}

/// The shared owner of the buffer state, designed to be wrapped in an `Arc`.
#[derive(Debug)]
pub(crate) struct HandoffShared<T> {
  /// Counts free slots; producers block here when the ring is full.
  pub(crate) vacant: CountGate,
  /// Counts stored items; consumers block here when the ring is empty.
  pub(crate) occupied: CountGate,
  pub(crate) internal: Mutex<HandoffInternal<T>>,
  pub(crate) capacity: usize,
}

impl<T: Send> HandoffShared<T> {
  /// Allocates the ring and both gates for a buffer of `capacity` slots.
  pub(crate) fn new(capacity: usize) -> Result<Self, StartupError> {
    let ring = SlotRing::with_capacity(capacity)?;
    Ok(HandoffShared {
      vacant: CountGate::new(capacity, capacity, ClosePolicy::Refuse),
      occupied: CountGate::new(capacity, 0, ClosePolicy::Drain),
      internal: Mutex::new(HandoffInternal {
        ring,
        closed: false,
        producer_count: 0,
        consumer_count: 0,
      }),
      capacity,
    })
  }

  /// Writes an item into the slot reserved by the vacancy permit the caller
  /// already holds, then publishes one occupancy.
  pub(crate) fn commit_produce(&self, item: T) {
    {
      let mut guard = self.internal.lock();
      let slot = guard.ring.reserve_empty();
      guard.ring.commit(slot, item);
    }
    self.occupied.release();
  }

  /// Takes the oldest item under the occupancy permit the caller already
  /// holds, then publishes one vacancy.
  pub(crate) fn commit_consume(&self) -> T {
    let item = {
      let mut guard = self.internal.lock();
      let slot = guard.ring.reserve_full();
      guard.ring.take(slot)
    };
    self.vacant.release();
    item
  }

  /// Non-blocking produce: take a vacancy if one is free, else report why.
  pub(crate) fn try_produce_core(&self, item: T) -> Result<(), TryProduceError<T>> {
    match self.vacant.try_acquire() {
      TryAcquire::Acquired => {
        self.commit_produce(item);
        Ok(())
      }
      TryAcquire::Closed => Err(TryProduceError::Closed(item)),
      TryAcquire::NoPermit => Err(TryProduceError::Full(item)),
    }
  }

  /// Non-blocking consume: redeem an occupancy if one is free, else report
  /// whether the stream is merely empty or closed and drained.
  pub(crate) fn try_consume_core(&self) -> Result<T, TryConsumeError> {
    match self.occupied.try_acquire() {
      TryAcquire::Acquired => Ok(self.commit_consume()),
      TryAcquire::Closed => Err(TryConsumeError::Closed),
      TryAcquire::NoPermit => Err(TryConsumeError::Empty),
    }
  }

  /// Latches the closed state and wakes every parked producer and consumer.
  pub(crate) fn close_core(&self) -> Result<(), CloseError> {
    {
      let mut guard = self.internal.lock();
      if guard.closed {
        return Err(CloseError);
      }
      guard.closed = true;
    }
    // Order matters for blocked producers: refuse new vacancies before the
    // occupied gate starts reporting dry-and-closed to consumers.
    self.vacant.close();
    self.occupied.close();
    Ok(())
  }

  /// Records a newly minted or cloned producer handle.
  pub(crate) fn register_producer(&self) {
    self.internal.lock().producer_count += 1;
  }

  /// Records a newly minted or cloned consumer handle.
  pub(crate) fn register_consumer(&self) {
    self.internal.lock().consumer_count += 1;
  }

  /// Retires a producer handle. Dropping the last one closes the stream,
  /// exactly as an explicit `close` would.
  pub(crate) fn retire_producer(&self) {
    let was_last;
    {
      let mut guard = self.internal.lock();
      guard.producer_count -= 1;
      was_last = guard.producer_count == 0 && !guard.closed;
      if was_last {
        guard.closed = true;
      }
    }
    if was_last {
      // Wake waiters outside the lock to reduce contention.
      self.vacant.close();
      self.occupied.close();
    }
  }

  /// Retires a consumer handle. Once no consumer is left, production is
  /// refused rather than blocking forever on a buffer no one will drain.
  pub(crate) fn retire_consumer(&self) {
    let was_last;
    {
      let mut guard = self.internal.lock();
      guard.consumer_count -= 1;
      was_last = guard.consumer_count == 0;
    }
    if was_last {
      self.vacant.close();
    }
  }

  pub(crate) fn is_closed(&self) -> bool {
    self.internal.lock().closed
  }

  pub(crate) fn len(&self) -> usize {
    self.internal.lock().ring.len()
  }
}
