//! Mock implementations for testing
//!
//! Host-side stand-ins for every platform trait, used by unit tests,
//! integration tests and the desktop simulator.

#![cfg(any(test, feature = "std"))]

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::collections::VecDeque;
use std::string::String;
use std::sync::{Mutex, PoisonError};
use std::vec;
use std::vec::Vec;

use crate::adc::AdcSequencer;
use crate::console::Console;
use crate::flash::{
    ErrorType, NorFlash, NorFlashErrorKind, ReadNorFlash, UserRegisters, ERASED_WORD,
    FLASH_CAPACITY, PAGE_SIZE, WORD_SIZE,
};
use crate::gpio::{GpioPorts, Port};
use crate::reset::{ResetCause, ResetControl};
use crate::watchdog::WatchdogPeripheral;

// ── GPIO ─────────────────────────────────────────────────────────────────────

/// Mock GPIO ports: seven 8-bit latches.
///
/// Input pins are driven from the test side with [`MockGpio::set_level`].
pub struct MockGpio {
    levels: [AtomicU8; Port::COUNT],
    writes: AtomicUsize,
}

impl MockGpio {
    /// All ports low.
    pub fn new() -> Self {
        Self {
            levels: core::array::from_fn(|_| AtomicU8::new(0)),
            writes: AtomicUsize::new(0),
        }
    }

    /// Force a whole port to `value`, as an external driver would.
    /// Not counted as a write.
    pub fn set_level(&self, port: Port, value: u8) {
        if let Some(level) = self.levels.get(port.index()) {
            level.store(value, Ordering::SeqCst);
        }
    }

    /// Current level of a whole port.
    pub fn level(&self, port: Port) -> u8 {
        self.levels
            .get(port.index())
            .map_or(0, |level| level.load(Ordering::SeqCst))
    }

    /// Number of `write_masked` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Default for MockGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPorts for MockGpio {
    fn read_masked(&self, port: Port, mask: u8) -> u8 {
        self.level(port) & mask
    }

    fn write_masked(&self, port: Port, mask: u8, value: u8) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(level) = self.levels.get(port.index()) {
            let _ = level.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |old| {
                Some((old & !mask) | (value & mask))
            });
        }
    }
}

// ── ADC ──────────────────────────────────────────────────────────────────────

/// Mock sample sequencer.
///
/// Each trigger consumes the next scripted result set; when the script runs
/// dry the steady-state set is returned. A result set may be shorter or
/// longer than the configured sequence to reproduce the count quirk.
pub struct MockAdc {
    script: VecDeque<Vec<u32>>,
    steady: Vec<u32>,
    pending: Vec<u32>,
    polls_until_ready: u32,
    polls_remaining: u32,
    configure_count: u32,
    trigger_count: u32,
}

impl MockAdc {
    /// Sequencer that always returns `steady` and completes on first poll.
    pub fn new(steady: &[u32]) -> Self {
        Self {
            script: VecDeque::new(),
            steady: steady.to_vec(),
            pending: Vec::new(),
            polls_until_ready: 0,
            polls_remaining: 0,
            configure_count: 0,
            trigger_count: 0,
        }
    }

    /// Queue a one-shot result set for a future trigger.
    pub fn push_results(&mut self, results: &[u32]) {
        self.script.push_back(results.to_vec());
    }

    /// Replace the steady-state result set.
    pub fn set_steady(&mut self, results: &[u32]) {
        self.steady = results.to_vec();
    }

    /// Number of `is_complete` polls that report busy after each trigger.
    /// `u32::MAX` makes the sequencer never complete.
    pub fn set_polls_until_ready(&mut self, polls: u32) {
        self.polls_until_ready = polls;
    }

    /// Number of `configure` calls so far.
    pub fn configure_count(&self) -> u32 {
        self.configure_count
    }

    /// Number of `trigger` calls so far.
    pub fn trigger_count(&self) -> u32 {
        self.trigger_count
    }
}

impl AdcSequencer for MockAdc {
    fn configure(&mut self) {
        self.configure_count = self.configure_count.saturating_add(1);
    }

    fn trigger(&mut self) {
        self.trigger_count = self.trigger_count.saturating_add(1);
        self.pending = self
            .script
            .pop_front()
            .unwrap_or_else(|| self.steady.clone());
        self.polls_remaining = self.polls_until_ready;
    }

    fn is_complete(&mut self) -> bool {
        if self.polls_remaining == 0 {
            return true;
        }
        if self.polls_remaining != u32::MAX {
            self.polls_remaining = self.polls_remaining.saturating_sub(1);
        }
        false
    }

    fn read_results(&mut self, buf: &mut [u32]) -> usize {
        let count = self.pending.len().min(buf.len());
        for (dst, src) in buf.iter_mut().zip(self.pending.iter()) {
            *dst = *src;
        }
        self.pending.clear();
        count
    }
}

// ── Watchdog ─────────────────────────────────────────────────────────────────

/// Mock watchdog peripheral.
///
/// Tests drive time with [`MockWatchdog::timeout`]. The first timeout
/// raises the interrupt; a timeout while it is still pending asserts reset
/// (if reset is enabled).
#[derive(Debug, Default)]
pub struct MockWatchdog {
    reload: Option<u32>,
    interrupt_enabled: bool,
    reset_enabled: bool,
    enabled: bool,
    pending: bool,
    reset_asserted: bool,
    clear_count: u32,
    sequence: Vec<&'static str>,
}

impl MockWatchdog {
    /// Disabled watchdog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the countdown to zero. Returns `true` if this raised the
    /// interrupt, `false` if the watchdog is disabled or reset fired.
    pub fn timeout(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        if self.pending && self.reset_enabled {
            self.reset_asserted = true;
            return false;
        }
        self.pending = true;
        self.interrupt_enabled
    }

    /// Reload value last programmed.
    pub fn reload(&self) -> Option<u32> {
        self.reload
    }

    /// Whether counting has been started.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether reset on second timeout is enabled.
    pub fn is_reset_enabled(&self) -> bool {
        self.reset_enabled
    }

    /// Whether the interrupt is raised and not yet cleared.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Whether the part would have reset.
    pub fn reset_asserted(&self) -> bool {
        self.reset_asserted
    }

    /// Number of acknowledgements.
    pub fn clear_count(&self) -> u32 {
        self.clear_count
    }

    /// Register calls made while arming, in order.
    pub fn sequence(&self) -> &[&'static str] {
        &self.sequence
    }
}

impl WatchdogPeripheral for MockWatchdog {
    fn set_reload(&mut self, clocks: u32) {
        self.reload = Some(clocks);
        self.sequence.push("reload");
    }

    fn enable_interrupt(&mut self) {
        self.interrupt_enabled = true;
        self.sequence.push("interrupt");
    }

    fn enable_reset(&mut self) {
        self.reset_enabled = true;
        self.sequence.push("reset");
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.sequence.push("enable");
    }

    fn clear_interrupt(&mut self) {
        self.pending = false;
        self.clear_count = self.clear_count.saturating_add(1);
    }
}

// ── Console ──────────────────────────────────────────────────────────────────

/// Mock console capturing everything written.
#[derive(Debug, Default)]
pub struct MockConsole {
    buf: Mutex<String>,
    echo: AtomicBool,
}

impl MockConsole {
    /// Empty console.
    pub fn new() -> Self {
        Self::default()
    }

    /// Console that also copies output to stdout (simulator use).
    pub fn echoing() -> Self {
        let console = Self::default();
        console.echo.store(true, Ordering::Relaxed);
        console
    }

    /// Everything written so far.
    pub fn output(&self) -> String {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Discard captured output.
    pub fn clear(&self) {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Console for MockConsole {
    fn write_byte(&self, byte: u8) {
        let ch = char::from(byte);
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ch);
        if self.echo.load(Ordering::Relaxed) {
            use std::io::Write;
            let mut out = std::io::stdout();
            let _ = out.write_all(&[byte]);
            let _ = out.flush();
        }
    }
}

// ── Flash ────────────────────────────────────────────────────────────────────

/// Mock NOR flash with the part's geometry.
///
/// Programming ANDs data into the array, exactly as NOR cells can only go
/// from 1 to 0; erase sets a whole page back to `0xFF`.
pub struct MockFlash {
    data: Vec<u8>,
    erase_count: u32,
    write_count: u32,
    fail_writes: bool,
    drop_writes: bool,
}

impl MockFlash {
    /// Fully erased part.
    pub fn new() -> Self {
        Self {
            data: vec![0xFF; FLASH_CAPACITY],
            erase_count: 0,
            write_count: 0,
            fail_writes: false,
            drop_writes: false,
        }
    }

    /// Raw view of `len` bytes at `offset`.
    pub fn contents(&self, offset: u32, len: usize) -> &[u8] {
        let start = offset as usize;
        self.data
            .get(start..start.saturating_add(len))
            .unwrap_or(&[])
    }

    /// Overwrite bytes directly, bypassing NOR semantics (corruption tests).
    pub fn poke(&mut self, offset: u32, bytes: &[u8]) {
        let start = offset as usize;
        if let Some(dst) = self.data.get_mut(start..start.saturating_add(bytes.len())) {
            dst.copy_from_slice(bytes);
        }
    }

    /// Make every subsequent program call fail with an error.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Make every subsequent program call report success without changing
    /// the array (a worn-out page).
    pub fn set_drop_writes(&mut self, drop: bool) {
        self.drop_writes = drop;
    }

    /// Page erases performed.
    pub fn erase_count(&self) -> u32 {
        self.erase_count
    }

    /// Program calls that succeeded.
    pub fn write_count(&self) -> u32 {
        self.write_count
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for MockFlash {
    type Error = NorFlashErrorKind;
}

impl ReadNorFlash for MockFlash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let src = self
            .data
            .get(start..start.saturating_add(bytes.len()))
            .ok_or(NorFlashErrorKind::OutOfBounds)?;
        bytes.copy_from_slice(src);
        Ok(())
    }

    fn capacity(&self) -> usize {
        FLASH_CAPACITY
    }
}

impl NorFlash for MockFlash {
    const WRITE_SIZE: usize = WORD_SIZE;
    const ERASE_SIZE: usize = PAGE_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let (from, to) = (from as usize, to as usize);
        if from > to || to > FLASH_CAPACITY {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        if from % PAGE_SIZE != 0 || to % PAGE_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        if let Some(range) = self.data.get_mut(from..to) {
            range.fill(0xFF);
        }
        self.erase_count = self.erase_count.saturating_add(1);
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        if start % WORD_SIZE != 0 || bytes.len() % WORD_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        if self.fail_writes {
            return Err(NorFlashErrorKind::Other);
        }
        let dst = self
            .data
            .get_mut(start..start.saturating_add(bytes.len()))
            .ok_or(NorFlashErrorKind::OutOfBounds)?;
        if !self.drop_writes {
            for (cell, byte) in dst.iter_mut().zip(bytes) {
                *cell &= *byte;
            }
        }
        self.write_count = self.write_count.saturating_add(1);
        Ok(())
    }
}

// ── OTP user registers ───────────────────────────────────────────────────────

/// Mock USER0/USER1 register pair.
#[derive(Debug, Clone, Copy)]
pub struct MockUserRegisters {
    regs: [u32; 2],
}

impl MockUserRegisters {
    /// Registers holding the given values.
    pub const fn new(user0: u32, user1: u32) -> Self {
        Self {
            regs: [user0, user1],
        }
    }

    /// Factory-fresh part: both registers all-ones.
    pub const fn unprogrammed() -> Self {
        Self::new(ERASED_WORD, ERASED_WORD)
    }
}

impl UserRegisters for MockUserRegisters {
    fn user_registers(&self) -> [u32; 2] {
        self.regs
    }
}

// ── Reset cause ──────────────────────────────────────────────────────────────

/// Mock reset-cause register.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockReset {
    latched: ResetCause,
}

impl MockReset {
    /// Register with `cause` latched.
    pub const fn new(cause: ResetCause) -> Self {
        Self { latched: cause }
    }
}

impl ResetControl for MockReset {
    fn reset_cause(&self) -> ResetCause {
        self.latched
    }

    fn clear_reset_cause(&mut self, cause: ResetCause) {
        self.latched = ResetCause::from_bits(self.latched.bits() & !cause.bits());
    }
}
