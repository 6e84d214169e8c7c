//! Board I/O: discrete lines, analog acquisition, and the task that polls
//! them.

pub mod analog;
pub mod discrete;
pub mod task;

pub use analog::{AdcScanner, AdcUnits, AnalogChannel, AnalogError, AnalogSamples, ScanError, ScanReport};
pub use discrete::{DiscreteChannel, DiscreteError, DiscreteIo};
pub use task::IoTask;
