//! Task liveness monitor on top of the hardware watchdog.
//!
//! Every monitored task owns one check-in counter. The watchdog interrupt
//! increments all of them; each task zeroes its own counter once per loop.
//! A task that stops looping lets its counter climb past its limit, the
//! interrupt stops acknowledging the peripheral, and the second
//! unacknowledged timeout resets the part.
//!
//! ```text
//!            checkin(): store 0              on_interrupt(): +1 each
//!  task ───────────────────────► counter ◄─────────────────────── WDT IRQ
//!                                   │
//!                          counter > limit ?
//!                         no ──► clear_interrupt (acknowledge)
//!                        yes ──► print 'A'+index, withhold ──► reset
//! ```
//!
//! The counter is only ever incremented by the interrupt and only ever
//! zeroed by its owning task, so a check-in is a single store and never
//! needs a lock.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use platform::config::WDT_DEFAULT_LIMIT;
use platform::{Console, WatchdogPeripheral};

/// Watchdog peripheral shared between the interrupt handler and the task
/// that arms it. Every access runs inside a critical section.
pub type SharedWatchdog<W> = Mutex<CriticalSectionRawMutex, RefCell<W>>;

/// Tasks supervised by the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskId {
    /// Periodic I/O acquisition task.
    Io,
    /// Utility task (arms and feeds the watchdog).
    Util,
}

impl TaskId {
    /// Size of the monitor table.
    pub const COUNT: usize = 2;

    /// All tasks in table order.
    pub const ALL: [TaskId; TaskId::COUNT] = [TaskId::Io, TaskId::Util];

    /// Table index.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            TaskId::Io => "io",
            TaskId::Util => "util",
        }
    }

    /// Character printed on the console when this task starves the
    /// watchdog: `'A'` for the first table entry, `'B'` for the second.
    pub const fn diagnostic_char(self) -> u8 {
        match self {
            TaskId::Io => b'A',
            TaskId::Util => b'B',
        }
    }
}

/// Result of one watchdog interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Every task was within its limit; the peripheral was acknowledged.
    Acknowledged,
    /// This task exceeded its limit; acknowledgement withheld.
    Withheld(TaskId),
}

/// Monitor state as seen from software.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchdogState {
    /// Peripheral not yet configured.
    Disarmed,
    /// Counting, last timeout acknowledged.
    Armed,
    /// Last timeout withheld. The next timeout resets the part.
    Unacknowledged,
}

const STATE_DISARMED: u8 = 0;
const STATE_ARMED: u8 = 1;
const STATE_UNACKNOWLEDGED: u8 = 2;

/// Per-task check-in counters and limits.
pub struct WatchdogMonitor {
    counters: [AtomicU32; TaskId::COUNT],
    limits: [Option<u32>; TaskId::COUNT],
    state: AtomicU8,
}

impl WatchdogMonitor {
    /// Monitor with no registered tasks.
    pub const fn new() -> Self {
        Self {
            counters: [const { AtomicU32::new(0) }; TaskId::COUNT],
            limits: [None; TaskId::COUNT],
            state: AtomicU8::new(STATE_DISARMED),
        }
    }

    /// Monitor with every task registered at [`WDT_DEFAULT_LIMIT`].
    pub const fn with_default_limits() -> Self {
        let mut monitor = Self::new();
        monitor.limits = [Some(WDT_DEFAULT_LIMIT); TaskId::COUNT];
        monitor
    }

    /// Supervise `task`: it must check in at least once every `limit`
    /// watchdog ticks.
    pub fn register_task(&mut self, task: TaskId, limit: u32) {
        if let Some(slot) = self.limits.get_mut(task.index()) {
            *slot = Some(limit);
        }
        if let Some(counter) = self.counters.get(task.index()) {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Limit registered for `task`, if any.
    pub fn limit(&self, task: TaskId) -> Option<u32> {
        self.limits.get(task.index()).copied().flatten()
    }

    /// Prove liveness. A single store; safe against a concurrent interrupt.
    pub fn checkin(&self, task: TaskId) {
        if let Some(counter) = self.counters.get(task.index()) {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Current counter value (ticks since the task last checked in).
    pub fn counter(&self, task: TaskId) -> u32 {
        self.counters
            .get(task.index())
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }

    /// Current software view of the peripheral.
    pub fn state(&self) -> WatchdogState {
        match self.state.load(Ordering::Relaxed) {
            STATE_ARMED => WatchdogState::Armed,
            STATE_UNACKNOWLEDGED => WatchdogState::Unacknowledged,
            _ => WatchdogState::Disarmed,
        }
    }

    /// Configure and start the peripheral: reload, interrupt enable, reset
    /// enable, enable. Irreversible on the target.
    pub fn arm<W: WatchdogPeripheral>(&self, wdt: &mut W, reload: u32) {
        wdt.set_reload(reload);
        wdt.enable_interrupt();
        wdt.enable_reset();
        wdt.enable();
        self.state.store(STATE_ARMED, Ordering::Relaxed);
        info!("watchdog armed, reload {}", reload);
    }

    /// Watchdog interrupt body.
    ///
    /// Walks the table in order. The first task whose counter passes its
    /// limit is reported on the console and the interrupt is left pending;
    /// tasks after it are not incremented on this tick.
    pub fn on_interrupt<W, C>(&self, wdt: &mut W, console: &C) -> TickOutcome
    where
        W: WatchdogPeripheral,
        C: Console + ?Sized,
    {
        for task in TaskId::ALL {
            let Some(limit) = self.limit(task) else {
                continue;
            };
            let Some(counter) = self.counters.get(task.index()) else {
                continue;
            };
            let previous = counter
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| {
                    Some(c.saturating_add(1))
                })
                .unwrap_or(0);
            if previous.saturating_add(1) > limit {
                console.write_byte(task.diagnostic_char());
                self.set_state_if_armed(STATE_UNACKNOWLEDGED);
                error!("watchdog: task {} missed check-in, withholding", task.as_str());
                return TickOutcome::Withheld(task);
            }
        }
        wdt.clear_interrupt();
        self.set_state_if_armed(STATE_ARMED);
        TickOutcome::Acknowledged
    }

    /// Only [`arm`](Self::arm) leaves `Disarmed`.
    fn set_state_if_armed(&self, next: u8) {
        let _ = self
            .state
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                (current != STATE_DISARMED).then_some(next)
            });
    }

    /// [`arm`](Self::arm) through a [`SharedWatchdog`].
    pub fn arm_shared<W: WatchdogPeripheral>(&self, wdt: &SharedWatchdog<W>, reload: u32) {
        wdt.lock(|cell| self.arm(&mut *cell.borrow_mut(), reload));
    }

    /// [`on_interrupt`](Self::on_interrupt) through a [`SharedWatchdog`].
    /// This is what the interrupt vector calls.
    pub fn service<W, C>(&self, wdt: &SharedWatchdog<W>, console: &C) -> TickOutcome
    where
        W: WatchdogPeripheral,
        C: Console + ?Sized,
    {
        wdt.lock(|cell| self.on_interrupt(&mut *cell.borrow_mut(), console))
    }
}

impl Default for WatchdogMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::mocks::{MockConsole, MockWatchdog};

    fn armed(monitor: &WatchdogMonitor) -> MockWatchdog {
        let mut wdt = MockWatchdog::new();
        monitor.arm(&mut wdt, 1);
        wdt
    }

    #[test]
    fn arm_programs_registers_in_order() {
        let monitor = WatchdogMonitor::new();
        let mut wdt = MockWatchdog::new();
        monitor.arm(&mut wdt, 2_500_000);
        assert_eq!(wdt.sequence(), &["reload", "interrupt", "reset", "enable"]);
        assert_eq!(wdt.reload(), Some(2_500_000));
        assert_eq!(monitor.state(), WatchdogState::Armed);
    }

    #[test]
    fn task_checking_in_every_limit_ticks_never_trips() {
        let mut monitor = WatchdogMonitor::new();
        monitor.register_task(TaskId::Io, 10);
        let mut wdt = armed(&monitor);
        let console = MockConsole::new();

        for _ in 0..5 {
            for _ in 0..10 {
                assert_eq!(monitor.on_interrupt(&mut wdt, &console), TickOutcome::Acknowledged);
            }
            monitor.checkin(TaskId::Io);
        }
        assert!(console.output().is_empty());
    }

    #[test]
    fn task_silent_for_limit_plus_one_ticks_is_withheld() {
        let mut monitor = WatchdogMonitor::new();
        monitor.register_task(TaskId::Io, 10);
        let mut wdt = armed(&monitor);
        let console = MockConsole::new();

        for _ in 0..10 {
            monitor.on_interrupt(&mut wdt, &console);
        }
        assert_eq!(
            monitor.on_interrupt(&mut wdt, &console),
            TickOutcome::Withheld(TaskId::Io)
        );
        assert_eq!(console.output(), "A");
        assert_eq!(monitor.state(), WatchdogState::Unacknowledged);
    }

    #[test]
    fn withheld_tick_skips_later_tasks() {
        let mut monitor = WatchdogMonitor::new();
        monitor.register_task(TaskId::Io, 0);
        monitor.register_task(TaskId::Util, 100);
        let mut wdt = armed(&monitor);
        let console = MockConsole::new();

        assert_eq!(
            monitor.on_interrupt(&mut wdt, &console),
            TickOutcome::Withheld(TaskId::Io)
        );
        assert_eq!(monitor.counter(TaskId::Util), 0);
    }

    #[test]
    fn unregistered_tasks_are_ignored() {
        let monitor = WatchdogMonitor::new();
        let mut wdt = armed(&monitor);
        let console = MockConsole::new();
        for _ in 0..10_000 {
            assert_eq!(monitor.on_interrupt(&mut wdt, &console), TickOutcome::Acknowledged);
        }
        assert_eq!(monitor.counter(TaskId::Io), 0);
    }

    #[test]
    fn interrupt_before_arm_stays_disarmed() {
        let mut monitor = WatchdogMonitor::new();
        monitor.register_task(TaskId::Io, 1);
        let mut wdt = MockWatchdog::new();
        let console = MockConsole::new();

        assert_eq!(monitor.on_interrupt(&mut wdt, &console), TickOutcome::Acknowledged);
        assert_eq!(monitor.state(), WatchdogState::Disarmed);
        assert_eq!(
            monitor.on_interrupt(&mut wdt, &console),
            TickOutcome::Withheld(TaskId::Io)
        );
        assert_eq!(monitor.state(), WatchdogState::Disarmed);
    }

    #[test]
    fn acknowledge_after_withhold_rearms() {
        let mut monitor = WatchdogMonitor::new();
        monitor.register_task(TaskId::Io, 1);
        let mut wdt = armed(&monitor);
        let console = MockConsole::new();

        monitor.on_interrupt(&mut wdt, &console);
        monitor.on_interrupt(&mut wdt, &console);
        assert_eq!(monitor.state(), WatchdogState::Unacknowledged);
        monitor.checkin(TaskId::Io);
        assert_eq!(monitor.on_interrupt(&mut wdt, &console), TickOutcome::Acknowledged);
        assert_eq!(monitor.state(), WatchdogState::Armed);
    }

    #[test]
    fn default_limits_cover_every_task() {
        let monitor = WatchdogMonitor::with_default_limits();
        for task in TaskId::ALL {
            assert_eq!(monitor.limit(task), Some(WDT_DEFAULT_LIMIT));
        }
    }

    #[test]
    fn diagnostic_chars_follow_table_order() {
        for task in TaskId::ALL {
            assert_eq!(usize::from(task.diagnostic_char() - b'A'), task.index());
        }
    }
}
