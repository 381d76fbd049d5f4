//! A closable counting signal that supports both synchronous and
//! asynchronous waiters.
//!
//! `CountGate` is the blocking primitive underneath the handoff buffer: one
//! gate counts vacant slots (producers wait on it), another counts occupied
//! slots (consumers wait on it). It uses a `parking_lot::Mutex` to protect
//! its internal state, ensuring that the management of permits and the
//! unified waiter queue (sync `Thread`s and async `Waker`s) is free of race
//! conditions like lost wakeups and permit stealing.
//!
//! The mutex is only contended when the gate is out of permits and a new
//! waiter must be enqueued, or when a permit is released and a waiter must
//! be dequeued.
//!
//! Unlike a plain semaphore, a gate can be permanently closed. What close
//! means for acquisition is fixed at construction by [`ClosePolicy`]: a
//! draining gate keeps granting leftover permits and reports closure only
//! once the count is dry, while a refusing gate fails every acquisition the
//! moment it is closed.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use std::thread::{self, Thread};

use parking_lot::Mutex;

/// An enum representing either a sync or async waiter.
#[derive(Debug)]
enum Waiter {
  Sync(Thread),
  Async(Waker),
}

impl Waiter {
  /// Wakes the underlying thread or task.
  fn wake(self) {
    match self {
      Waiter::Sync(thread) => thread.unpark(),
      Waiter::Async(waker) => waker.wake(),
    }
  }

  /// Checks if this waiter would be woken by the given waker.
  fn will_wake(&self, waker: &Waker) -> bool {
    match self {
      Waiter::Async(self_waker) => self_waker.will_wake(waker),
      Waiter::Sync(_) => false,
    }
  }
}

/// What acquisition does with leftover permits once the gate is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosePolicy {
  /// Remaining permits are still granted after close; acquisition fails
  /// only once the count reaches zero.
  Drain,
  /// Close wins over remaining permits; every acquisition fails
  /// immediately once the gate is closed.
  Refuse,
}

/// Outcome of a non-blocking [`CountGate::try_acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryAcquire {
  /// A permit was taken.
  Acquired,
  /// No permit could be taken right now; one may appear later.
  NoPermit,
  /// The gate is closed and, per its policy, will never grant a permit.
  Closed,
}

/// The internal state of the gate, protected by a `Mutex`.
#[derive(Debug)]
struct GateInternal {
  /// The number of currently available permits.
  permits: usize,
  /// Latched by `close`; never cleared.
  closed: bool,
  /// A fair (FIFO) queue of waiting threads and tasks.
  waiters: VecDeque<Waiter>,
}

/// A closable counting signal with hybrid sync/async blocking.
pub struct CountGate {
  capacity: usize,
  policy: ClosePolicy,
  internal: Mutex<GateInternal>,
}

impl fmt::Debug for CountGate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let internal = self.internal.lock();
    f.debug_struct("CountGate")
      .field("capacity", &self.capacity)
      .field("policy", &self.policy)
      .field("permits", &internal.permits)
      .field("closed", &internal.closed)
      .field("waiters", &internal.waiters.len())
      .finish()
  }
}

impl CountGate {
  /// Creates a new gate holding `initial_permits` out of `capacity` total.
  pub fn new(capacity: usize, initial_permits: usize, policy: ClosePolicy) -> Self {
    debug_assert!(initial_permits <= capacity);
    Self {
      capacity,
      policy,
      internal: Mutex::new(GateInternal {
        permits: initial_permits,
        closed: false,
        waiters: VecDeque::new(),
      }),
    }
  }

  /// Returns the maximum number of permits the gate can hold.
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Returns the number of currently available permits.
  pub fn permits(&self) -> usize {
    self.internal.lock().permits
  }

  /// Returns the number of threads and tasks currently parked on the gate.
  pub fn waiting(&self) -> usize {
    self.internal.lock().waiters.len()
  }

  /// Returns `true` once the gate has been closed.
  pub fn is_closed(&self) -> bool {
    self.internal.lock().closed
  }

  /// Takes a permit if the locked state allows it, per the close policy.
  /// `Some(true)` = permit taken, `Some(false)` = closed, `None` = must wait.
  fn grab_locked(internal: &mut GateInternal, policy: ClosePolicy) -> Option<bool> {
    match policy {
      ClosePolicy::Refuse => {
        if internal.closed {
          return Some(false);
        }
        if internal.permits > 0 {
          internal.permits -= 1;
          return Some(true);
        }
      }
      ClosePolicy::Drain => {
        if internal.permits > 0 {
          internal.permits -= 1;
          return Some(true);
        }
        if internal.closed {
          return Some(false);
        }
      }
    }
    None
  }

  /// Acquires a permit, blocking the current thread until one is available.
  ///
  /// Returns `true` once a permit was taken, or `false` if the gate is
  /// closed and its policy rules out ever granting one.
  pub fn acquire_sync(&self) -> bool {
    // Optimistic fast path.
    match self.try_acquire() {
      TryAcquire::Acquired => return true,
      TryAcquire::Closed => return false,
      TryAcquire::NoPermit => {}
    }

    // Slow path, must lock and wait.
    let mut internal = self.internal.lock();
    loop {
      // Check for a permit. This is safe from stealing because `try_acquire`
      // will fail for new arrivals while we sit in the waiter queue.
      if let Some(outcome) = Self::grab_locked(&mut internal, self.policy) {
        return outcome;
      }

      // Add our thread to the waiter queue, unlock, and park.
      internal.waiters.push_back(Waiter::Sync(thread::current()));
      drop(internal);
      thread::park();
      internal = self.internal.lock();
    }
  }

  /// Acquires a permit asynchronously, returning a future that resolves
  /// with the same outcome as [`acquire_sync`](Self::acquire_sync).
  pub fn acquire_async(&self) -> AcquireFuture<'_> {
    AcquireFuture { gate: self }
  }

  /// Poll-based acquisition, for callers embedding the gate in their own
  /// futures. Registers `cx.waker()` when the gate would block.
  pub fn poll_acquire(&self, cx: &mut Context<'_>) -> Poll<bool> {
    let mut internal = self.internal.lock();

    if let Some(outcome) = Self::grab_locked(&mut internal, self.policy) {
      return Poll::Ready(outcome);
    }

    // No permit available. Add our waker to the queue if not already present.
    if !internal.waiters.iter().any(|w| w.will_wake(cx.waker())) {
      internal.waiters.push_back(Waiter::Async(cx.waker().clone()));
    }
    Poll::Pending
  }

  /// Attempts to acquire a permit without blocking.
  ///
  /// The key to preventing starvation: a permit can only be taken if no one
  /// is waiting. This gives waiters priority over new arrivals.
  pub fn try_acquire(&self) -> TryAcquire {
    let mut internal = self.internal.lock();
    if self.policy == ClosePolicy::Refuse && internal.closed {
      return TryAcquire::Closed;
    }
    if internal.waiters.is_empty() && internal.permits > 0 {
      internal.permits -= 1;
      return TryAcquire::Acquired;
    }
    if internal.closed && internal.permits == 0 {
      return TryAcquire::Closed;
    }
    TryAcquire::NoPermit
  }

  /// Releases a permit back to the gate and wakes the longest waiter.
  pub fn release(&self) {
    let mut internal = self.internal.lock();
    internal.permits += 1;

    if let Some(waiter) = internal.waiters.pop_front() {
      // A waiter exists. Wake them up; they will consume the permit we just
      // added. Waking is cheap, so the lock is kept.
      waiter.wake();
    } else {
      // No one was waiting. Cap the permit count so an idle release can
      // never push it past capacity.
      internal.permits = internal.permits.min(self.capacity);
    }
  }

  /// Closes the gate and wakes every waiter so it can observe the closed
  /// state. Idempotent.
  pub fn close(&self) {
    let woken;
    {
      let mut internal = self.internal.lock();
      if internal.closed {
        return;
      }
      internal.closed = true;
      woken = std::mem::take(&mut internal.waiters);
    }
    // Wake outside the lock to reduce contention.
    for waiter in woken {
      waiter.wake();
    }
  }
}

/// A future that resolves when a permit is acquired (or the gate's policy
/// rules one out forever).
#[must_use = "futures do nothing unless you .await or poll them"]
#[derive(Debug)]
pub struct AcquireFuture<'a> {
  gate: &'a CountGate,
}

impl Future for AcquireFuture<'_> {
  type Output = bool;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    self.gate.poll_acquire(cx)
  }
}
