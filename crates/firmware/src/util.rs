//! Utility task: arms the watchdog and proves its own liveness.
//!
//! Runs at [`UTIL_POLL_HZ`](platform::config::UTIL_POLL_HZ) at the lowest
//! application priority, so a higher-priority task that hogs the CPU starves
//! it and the watchdog reports `'B'`.

use embassy_time::{Duration, Ticker};
use platform::config::{CPU_CLOCK_HZ, UTIL_POLL_PERIOD_MS, WDT_RESET_MS};
use platform::watchdog::reload_for_reset_ms;
use platform::WatchdogPeripheral;

use crate::watchdog::{SharedWatchdog, TaskId, WatchdogMonitor};

/// Utility task state.
pub struct UtilTask<'a, W> {
    monitor: &'a WatchdogMonitor,
    wdt: &'a SharedWatchdog<W>,
    armed: bool,
}

impl<'a, W: WatchdogPeripheral> UtilTask<'a, W> {
    /// Bind the task to the monitor and the shared peripheral.
    pub fn new(monitor: &'a WatchdogMonitor, wdt: &'a SharedWatchdog<W>) -> Self {
        Self {
            monitor,
            wdt,
            armed: false,
        }
    }

    /// Arm the watchdog. Only the first call touches the peripheral.
    pub fn start(&mut self) {
        if self.armed {
            return;
        }
        self.monitor.checkin(TaskId::Util);
        self.monitor
            .arm_shared(self.wdt, reload_for_reset_ms(CPU_CLOCK_HZ, WDT_RESET_MS));
        self.armed = true;
    }

    /// One loop body: check in.
    pub fn iteration(&mut self) {
        self.start();
        self.monitor.checkin(TaskId::Util);
    }

    /// Task entry point.
    pub async fn run(mut self) -> ! {
        self.start();
        let mut ticker = Ticker::every(Duration::from_millis(UTIL_POLL_PERIOD_MS));
        loop {
            self.iteration();
            ticker.next().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use platform::mocks::MockWatchdog;

    use super::*;
    use crate::watchdog::WatchdogState;

    #[test]
    fn start_arms_once_with_half_period_reload() {
        let monitor = WatchdogMonitor::with_default_limits();
        let wdt = SharedWatchdog::new(RefCell::new(MockWatchdog::new()));
        let mut task = UtilTask::new(&monitor, &wdt);

        task.start();
        task.iteration();
        task.iteration();

        wdt.lock(|cell| {
            let wdt = cell.borrow();
            assert_eq!(wdt.sequence().len(), 4, "armed exactly once");
            assert_eq!(wdt.reload(), Some(2_500_000));
            assert!(wdt.is_enabled());
        });
        assert_eq!(monitor.state(), WatchdogState::Armed);
    }

    #[test]
    fn iteration_zeroes_util_counter() {
        let monitor = WatchdogMonitor::with_default_limits();
        let wdt = SharedWatchdog::new(RefCell::new(MockWatchdog::new()));
        let console = platform::mocks::MockConsole::new();
        let mut task = UtilTask::new(&monitor, &wdt);
        task.start();

        for _ in 0..7 {
            monitor.service(&wdt, &console);
        }
        assert_eq!(monitor.counter(TaskId::Util), 7);
        task.iteration();
        assert_eq!(monitor.counter(TaskId::Util), 0);
    }
}
