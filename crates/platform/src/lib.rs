//! Hardware Abstraction Layer (HAL) for the LM3S8962 evaluation board
//!
//! This crate provides trait-based abstractions for the peripherals the
//! firmware core touches, so the core can be developed and tested without
//! the board.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: tasks, I/O state, config store)
//!         ↓
//! Platform HAL (this crate - trait abstractions + board constants)
//!         ↓
//! Hardware Layer (register access / vendor driver library)
//! ```
//!
//! # Abstractions
//!
//! - [`GpioPorts`] - masked port reads and writes
//! - [`AdcSequencer`] - ADC sample sequence (configure, trigger, read)
//! - [`WatchdogPeripheral`] - watchdog reload, interrupt and reset control
//! - [`Console`] - serial diagnostic character sink
//! - [`UserRegisters`] - factory OTP register pair (MAC address)
//! - [`ResetControl`] - latched reset cause
//! - [`flash`] - flash layout, via `embedded_storage::nor_flash::NorFlash`
//!
//! # Features
//!
//! - `std`: Enable standard library support and [`mocks`] (for testing)
//! - `defmt`: Enable defmt logging derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)
)]

#[cfg(feature = "std")]
extern crate std;

pub mod adc;
pub mod config;
pub mod console;
pub mod flash;
pub mod gpio;
pub mod mocks;
pub mod reset;
pub mod watchdog;

pub use adc::AdcSequencer;
pub use console::Console;
pub use flash::{NorFlash, ReadNorFlash, UserRegisters};
pub use gpio::{GpioPorts, PinState, Port, PortPin};
pub use reset::{ResetCause, ResetControl};
pub use watchdog::WatchdogPeripheral;
