#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! Bounded multi-producer/multi-consumer handoff buffer for Rust.
//!
//! Conveyor provides a fixed-capacity buffer that any number of producer
//! threads or tasks can feed and any number of consumer threads or tasks can
//! drain, with blocking backpressure on both sides and an explicit
//! end-of-stream protocol so no consumer is ever left waiting once production
//! has permanently ended. Synchronous and asynchronous handles interoperate
//! on the same buffer.

pub mod coord;
pub mod error;
pub mod handoff;

// Public re-exports for convenience.
pub use error::{
  CloseError, ProduceError, ShutdownError, StartupError, TryConsumeError, TryProduceError,
};
pub use handoff::{
  bounded, AsyncConsumer, AsyncProducer, ConsumeFuture, Consumed, Consumer, Handoff, ProduceFuture,
  Producer,
};
