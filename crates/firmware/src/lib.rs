//! CRI Quickstart firmware core
//!
//! Board-independent application logic for the LM3S8962 evaluation board:
//! shared I/O state, the analog acquisition loop, the supervisory watchdog
//! and the flash-backed configuration records.
//!
//! # Architecture
//!
//! ```text
//! Tasks (io, util) and boot (this crate)
//!         ↓
//! Shared state (io, config, watchdog monitor)
//!         ↓
//! Platform HAL (platform crate: traits + board constants)
//!         ↓
//! Board support (register access, scheduler)
//! ```
//!
//! # Features
//!
//! - `defmt` - Log through defmt on the target
//! - `std` - Log through tracing, enable host mocks
//! - `emulator` - Desktop simulator (tokio, tracing-subscriber)
//!
//! # Simulator
//!
//! ```bash
//! cargo run -p firmware --example simulator --features emulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)]
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)
)]

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

pub mod boot;
pub mod config;
pub mod io;
pub mod util;
pub mod watchdog;

pub use boot::{boot, run_monitored, System, TaskSpec, TASKS};
pub use config::{ConfigError, ConfigStore, PermanentConfig, UserConfig};
pub use io::{AnalogSamples, DiscreteIo, IoTask};
pub use util::UtilTask;
pub use watchdog::{SharedWatchdog, TaskId, TickOutcome, WatchdogMonitor};
