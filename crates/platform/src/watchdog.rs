//! Watchdog peripheral abstraction
//!
//! The part's watchdog counts down from a reload value. On the first
//! timeout it raises an interrupt and reloads; if that interrupt has not
//! been cleared by the next timeout, and reset is enabled, it asserts a
//! system reset. Clearing the interrupt is the acknowledgement.
//!
//! ```text
//! countdown ─► timeout #1 ─► IRQ (clear = acknowledge, reload)
//!                   │
//!                   └─ not cleared ─► timeout #2 ─► SYSTEM RESET
//! ```

/// Watchdog register contract.
pub trait WatchdogPeripheral {
    /// Countdown reload value in peripheral clocks.
    fn set_reload(&mut self, clocks: u32);

    /// Route the timeout to the watchdog interrupt.
    fn enable_interrupt(&mut self);

    /// Allow the second unacknowledged timeout to reset the system.
    fn enable_reset(&mut self);

    /// Start counting. Cannot be undone until the next reset.
    fn enable(&mut self);

    /// Acknowledge the pending timeout interrupt, reloading the countdown.
    fn clear_interrupt(&mut self);
}

/// Reload value that makes the interrupt fire at half of `reset_ms`.
///
/// The peripheral resets on the *second* unacknowledged timeout, so a
/// countdown of half the reset period gives a worst-case reset time of
/// `reset_ms`.
#[must_use]
pub const fn reload_for_reset_ms(cpu_hz: u32, reset_ms: u32) -> u32 {
    (cpu_hz / 2_000).saturating_mul(reset_ms)
}
