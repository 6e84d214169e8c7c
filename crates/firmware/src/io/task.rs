//! Periodic I/O task.
//!
//! Every poll period: check in with the watchdog, run one analog scan, and
//! every ten seconds write a heartbeat `.` to the console. The loop waits on
//! an absolute-deadline [`Ticker`], so the period does not drift with the
//! time spent scanning.

use embassy_time::{Duration, Ticker};
use platform::config::{HEARTBEAT_INTERVAL_S, IO_POLL_HZ, IO_POLL_PERIOD_MS};
use platform::{AdcSequencer, Console};

use super::analog::{AdcScanner, AnalogSamples, ScanError, ScanReport};
use crate::watchdog::{TaskId, WatchdogMonitor};

/// Iterations between heartbeat characters.
pub const HEARTBEAT_TICKS: u32 = IO_POLL_HZ.saturating_mul(HEARTBEAT_INTERVAL_S);

/// I/O task state.
pub struct IoTask<'a, A, C: ?Sized> {
    monitor: &'a WatchdogMonitor,
    samples: &'a AnalogSamples,
    scanner: AdcScanner<A>,
    console: &'a C,
    ticks: u32,
}

impl<'a, A, C> IoTask<'a, A, C>
where
    A: AdcSequencer,
    C: Console + ?Sized,
{
    /// Bind the task to its shared state. The task owns the sequencer.
    pub fn new(
        monitor: &'a WatchdogMonitor,
        samples: &'a AnalogSamples,
        adc: A,
        console: &'a C,
    ) -> Self {
        Self {
            monitor,
            samples,
            scanner: AdcScanner::new(adc),
            console,
            ticks: 0,
        }
    }

    /// The acquisition engine.
    pub fn scanner(&self) -> &AdcScanner<A> {
        &self.scanner
    }

    /// The acquisition engine, mutably.
    pub fn scanner_mut(&mut self) -> &mut AdcScanner<A> {
        &mut self.scanner
    }

    /// One loop body, without the wait.
    pub async fn iteration(&mut self) -> Result<ScanReport, ScanError> {
        self.monitor.checkin(TaskId::Io);

        let result = self.scanner.scan(self.samples).await;
        match result {
            Ok(report) if report.mismatches > 0 => {
                debug!("I/O scan needed {} attempts", report.attempts);
            }
            Ok(_) => {}
            Err(_) => warn!("I/O scan failed, previous samples kept"),
        }

        if self.ticks >= HEARTBEAT_TICKS {
            self.console.write_str(".");
            self.ticks = 0;
        }
        self.ticks = self.ticks.saturating_add(1);

        result
    }

    /// Task entry point.
    pub async fn run(mut self) -> ! {
        info!("io task running");
        let mut ticker = Ticker::every(Duration::from_millis(IO_POLL_PERIOD_MS));
        loop {
            let _ = self.iteration().await;
            ticker.next().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use platform::mocks::{MockAdc, MockConsole};

    use super::*;
    use crate::io::analog::{AdcUnits, AnalogChannel};

    #[tokio::test]
    async fn heartbeat_every_hundred_iterations() {
        let monitor = WatchdogMonitor::with_default_limits();
        let samples = AnalogSamples::new();
        let console = MockConsole::new();
        let mut task = IoTask::new(&monitor, &samples, MockAdc::new(&[1, 2, 3, 4, 5]), &console);

        for _ in 0..HEARTBEAT_TICKS {
            task.iteration().await.unwrap();
        }
        assert_eq!(console.output(), "");
        task.iteration().await.unwrap();
        assert_eq!(console.output(), ".");
        for _ in 0..HEARTBEAT_TICKS {
            task.iteration().await.unwrap();
        }
        assert_eq!(console.output(), "..");
    }

    #[tokio::test]
    async fn iteration_checks_in_and_publishes() {
        let monitor = WatchdogMonitor::with_default_limits();
        let wdt = crate::watchdog::SharedWatchdog::new(core::cell::RefCell::new(
            platform::mocks::MockWatchdog::new(),
        ));
        let samples = AnalogSamples::new();
        let console = MockConsole::new();
        let mut task = IoTask::new(&monitor, &samples, MockAdc::new(&[1, 2, 3, 4, 5]), &console);

        monitor.service(&wdt, &console);
        assert_eq!(monitor.counter(TaskId::Io), 1);
        task.iteration().await.unwrap();
        assert_eq!(monitor.counter(TaskId::Io), 0);
        assert_eq!(samples.read(AnalogChannel::Proc3, AdcUnits::Raw).await, 4);
    }

    #[tokio::test]
    async fn failed_scan_still_checks_in() {
        let monitor = WatchdogMonitor::with_default_limits();
        let samples = AnalogSamples::new();
        let console = MockConsole::new();
        let mut adc = MockAdc::new(&[1, 2, 3, 4, 5]);
        adc.set_polls_until_ready(u32::MAX);
        let mut task = IoTask::new(&monitor, &samples, adc, &console);

        assert_eq!(task.iteration().await, Err(ScanError::ConversionTimeout));
        assert_eq!(monitor.counter(TaskId::Io), 0);
    }
}
