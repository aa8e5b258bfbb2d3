//! Channel variants (spec §4.6), each matching a distinct concurrency
//! contract in the original: single-thread, multi-producer/single-consumer,
//! and bounded multi-producer/multi-consumer.

pub mod mpsc;
pub mod queue;
pub mod unsafe_channel;

pub use mpsc::Channel as MpscChannel;
pub use queue::AsyncQueue;
pub use unsafe_channel::UnsafeChannel;
