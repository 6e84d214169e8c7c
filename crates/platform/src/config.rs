//! Board configuration and constants
//!
//! Central compile-time values for the evaluation board. Everything that
//! used to be a `#define` in a board header lives here so the firmware
//! crate and the host tests agree on one set of numbers.

/// The application name (printed in the identity banner)
pub const APP_NAME: &str = "CRI Quickstart";

/// Board description line for the identity banner
pub const BOARD_NAME: &str = "LM3S8962 Eval Board";

/// Copyright line for the identity banner
pub const COPYRIGHT: &str = "Copyright (C) 2011 Consolidated Resource Imaging";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Clocks ───────────────────────────────────────────────────────────────────

/// System clock after PLL configuration (Hz).
pub const CPU_CLOCK_HZ: u32 = 50_000_000;

/// RTOS tick rate (Hz). Task periods are derived from this.
pub const TICK_RATE_HZ: u32 = 1_000;

// ── Analog ───────────────────────────────────────────────────────────────────

/// Internal ADC reference voltage in millivolts.
pub const ADC_VREF_MV: i32 = 3_000;

/// ADC full-scale code (10-bit converter).
pub const ADC_FULL_SCALE: i32 = 1_024;

/// Channels converted by one sample sequence (4 external + temperature).
pub const ADC_SEQUENCE_LEN: usize = 5;

/// Result FIFO depth of the sequencer. The hardware can hand back this many
/// results, so every buffer it writes into must be at least this long.
pub const ADC_FIFO_DEPTH: usize = 8;

// ── Task timing ──────────────────────────────────────────────────────────────

/// I/O task poll rate (Hz).
pub const IO_POLL_HZ: u32 = 10;

/// Utility (watchdog) task poll rate (Hz).
pub const UTIL_POLL_HZ: u32 = 100;

/// Milliseconds between I/O task wakeups.
pub const IO_POLL_PERIOD_MS: u64 = 1_000 / IO_POLL_HZ as u64;

/// Milliseconds between utility task wakeups.
pub const UTIL_POLL_PERIOD_MS: u64 = 1_000 / UTIL_POLL_HZ as u64;

/// Bounded wait for any I/O mutex: one tenth of the I/O poll period.
pub const IO_LOCK_TIMEOUT_MS: u64 = IO_POLL_PERIOD_MS / 10;

/// Seconds between heartbeat characters written by the I/O task.
pub const HEARTBEAT_INTERVAL_S: u32 = 10;

// ── Watchdog ─────────────────────────────────────────────────────────────────

/// The watchdog resets the part after this many milliseconds without an
/// acknowledgement. The interrupt fires at half this period; the second
/// unacknowledged timeout asserts reset.
pub const WDT_RESET_MS: u32 = 100;

/// Default liveness limit for every monitored task, in watchdog ticks.
pub const WDT_DEFAULT_LIMIT: u32 = 1_000;

// ── Task priorities (higher number runs first) ───────────────────────────────

/// Ethernet bring-up task.
pub const ETH_INIT_PRIORITY: u8 = 3;
/// I/O polling task.
pub const IO_TASK_PRIORITY: u8 = 3;
/// Web server task.
pub const WEB_TASK_PRIORITY: u8 = 2;
/// Ethernet / MAC service task.
pub const NET_TASK_PRIORITY: u8 = 1;
/// Utility task (arms and services the watchdog).
pub const UTIL_TASK_PRIORITY: u8 = 1;
/// Idle, for completeness.
pub const IDLE_TASK_PRIORITY: u8 = 0;
