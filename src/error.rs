// src/error.rs

//! Error types for the handoff buffer.
//!
//! Errors that carry a value hand it back to the caller through
//! [`into_inner`](ProduceError::into_inner), so a refused item is never
//! silently dropped.

use core::fmt;

// Helper macro for enums whose variants all carry the refused value:
// generates `into_inner`, `Display`, and `std::error::Error`.
macro_rules! impl_error_for_enum_with_inner {
    (
        $enum_name:ident < $generic_param:ident >,
        $($variant:ident ( $message:expr ) ),+
        $(,)?
    ) => {
        impl<$generic_param> $enum_name<$generic_param> {
            /// Consumes the error, returning the value it carried.
            #[inline]
            pub fn into_inner(self) -> $generic_param {
                match self {
                    $( $enum_name::$variant(v) => v, )+
                }
            }
        }

        impl<$generic_param> fmt::Display for $enum_name<$generic_param> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( $enum_name::$variant(_) => f.write_str($message), )+
                }
            }
        }

        impl<$generic_param> std::error::Error for $enum_name<$generic_param> {}
    };
}

/// Error returned by a blocking or async `produce` once the stream is closed.
/// The item being produced is returned.
#[derive(PartialEq, Eq, Clone)]
pub enum ProduceError<T> {
  /// The stream has been closed; no further items are accepted.
  Closed(T),
}

impl<T> fmt::Debug for ProduceError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProduceError::Closed(_) => write!(f, "ProduceError::Closed(..)"),
    }
  }
}

impl_error_for_enum_with_inner!(ProduceError<T>, Closed("stream closed"));

/// Error returned by `try_produce` when the operation could not be completed
/// immediately. The item being produced is returned.
#[derive(PartialEq, Eq, Clone)]
pub enum TryProduceError<T> {
  /// Every slot is occupied; the item would have to wait for a vacancy.
  Full(T),
  /// The stream has been closed; no further items are accepted.
  Closed(T),
}

impl<T> fmt::Debug for TryProduceError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TryProduceError::Full(_) => write!(f, "TryProduceError::Full(..)"),
      TryProduceError::Closed(_) => write!(f, "TryProduceError::Closed(..)"),
    }
  }
}

impl_error_for_enum_with_inner!(
  TryProduceError<T>,
  Full("buffer full"),
  Closed("stream closed"),
);

/// Error returned by `try_consume` when no item could be taken immediately.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryConsumeError {
  /// No item is buffered right now, but the stream is still open.
  Empty,
  /// The stream is closed and fully drained; no item will ever arrive.
  Closed,
}
impl std::error::Error for TryConsumeError {}
impl fmt::Display for TryConsumeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TryConsumeError::Empty => write!(f, "buffer empty"),
      TryConsumeError::Closed => write!(f, "stream closed and drained"),
    }
  }
}

/// Error returned by `bounded` when the buffer cannot be brought up.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StartupError {
  /// A capacity of zero cannot hold any in-flight item.
  ZeroCapacity,
  /// Slot storage could not be allocated.
  ResourceExhausted,
}
impl std::error::Error for StartupError {}
impl fmt::Display for StartupError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StartupError::ZeroCapacity => write!(f, "capacity must be at least 1"),
      StartupError::ResourceExhausted => write!(f, "failed to allocate slot storage"),
    }
  }
}

/// Error returned when attempting to close an already closed stream.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CloseError;
impl std::error::Error for CloseError {}
impl fmt::Display for CloseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "stream is already closed")
  }
}

/// Usage error reported by `shutdown` when the session has not completed the
/// produce → close → drain sequence. The session handle is returned so the
/// caller can finish the sequence and retry.
#[derive(PartialEq, Eq)]
pub enum ShutdownError<H> {
  /// At least one producer is still blocked inside `produce`.
  ProducersBlocked(H),
  /// `close` has not been called; consumers could still block forever.
  StillOpen(H),
  /// Unconsumed items remain in the buffer.
  Undrained(H),
}

impl<H> fmt::Debug for ShutdownError<H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ShutdownError::ProducersBlocked(_) => write!(f, "ShutdownError::ProducersBlocked(..)"),
      ShutdownError::StillOpen(_) => write!(f, "ShutdownError::StillOpen(..)"),
      ShutdownError::Undrained(_) => write!(f, "ShutdownError::Undrained(..)"),
    }
  }
}

impl_error_for_enum_with_inner!(
  ShutdownError<H>,
  ProducersBlocked("shutdown while a producer is blocked in produce"),
  StillOpen("shutdown before the stream was closed"),
  Undrained("shutdown with unconsumed items in the buffer"),
);
