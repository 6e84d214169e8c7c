//! ADC sample-sequencer abstraction
//!
//! The on-chip converter runs a *sample sequence*: a fixed list of channel
//! steps triggered together, with all results landing in a FIFO. The
//! firmware configures one sequence (four external inputs, then the
//! temperature sensor) and triggers it from the I/O task.
//!
//! ```text
//! configure() ──► trigger() ──► poll is_complete() ──► read_results()
//!      once          each scan        bounded spin          count + data
//! ```
//!
//! Known quirk: the sequencer occasionally reports one result too many or
//! too few; the surplus/missing sample shows up on the next read. Callers
//! must check the count returned by [`AdcSequencer::read_results`].

/// Sample-sequencer contract.
///
/// Owned exclusively by the acquisition engine, so every method takes
/// `&mut self`.
pub trait AdcSequencer {
    /// Program the sequence steps and reference. Called once before the
    /// first trigger.
    fn configure(&mut self);

    /// Start one conversion sequence.
    fn trigger(&mut self);

    /// Completion flag for the sequence started by the last `trigger`.
    fn is_complete(&mut self) -> bool;

    /// Drain the result FIFO into `buf` and return how many results the
    /// hardware delivered. Never writes past `buf.len()`.
    fn read_results(&mut self, buf: &mut [u32]) -> usize;
}
