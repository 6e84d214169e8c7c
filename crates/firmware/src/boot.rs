//! Boot sequence and the shared system context.
//!
//! Initialization order (MUST be respected):
//!   1. Clocks and console (board bring-up, outside this crate)
//!   2. Load configuration; invalid records fall back to defaults
//!   3. Identity banner on the console
//!   4. Report and clear the reset cause
//!   5. Shared I/O state (sample set, port locks), then the I/O task
//!   6. Utility task, which arms the watchdog
//!   7. Network tasks, then start the scheduler
//!
//! Everything tasks share lives in one [`System`] built here, instead of
//! in scattered globals. Tasks borrow from it for the life of the program.

use core::fmt::{self, Write as _};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_futures::join::join;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{with_timeout, Duration};
use platform::config::{
    APP_NAME, APP_VERSION, BOARD_NAME, COPYRIGHT, ETH_INIT_PRIORITY, IO_LOCK_TIMEOUT_MS,
    IO_POLL_PERIOD_MS, IO_TASK_PRIORITY, NET_TASK_PRIORITY, UTIL_POLL_PERIOD_MS,
    UTIL_TASK_PRIORITY, WEB_TASK_PRIORITY,
};
use platform::flash::NorFlash;
use platform::{
    AdcSequencer, Console, GpioPorts, ResetCause, ResetControl, UserRegisters, WatchdogPeripheral,
};

use crate::config::{ConfigStore, IpConfig, PermanentConfig, UserConfig};
use crate::io::{AnalogSamples, DiscreteIo, IoTask};
use crate::util::UtilTask;
use crate::watchdog::WatchdogMonitor;

/// Ordered list of boot steps, for documentation and testing.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. Clocks: PLL to 50 MHz, console UART",
    "2. Config: load permanent + user records, defaults if invalid",
    "3. Banner: program, board, part and serial numbers, notes",
    "4. Reset cause: report, then clear",
    "5. I/O: shared sample set and port locks, spawn io task",
    "6. Util: spawn util task (arms the watchdog)",
    "7. Network: spawn eth-init, start scheduler",
];

// ── Task table ───────────────────────────────────────────────────────────────

/// One entry in the task table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    /// Task name.
    pub name: &'static str,
    /// Fixed priority, higher runs first.
    pub priority: u8,
    /// Fixed period for polled tasks, `None` for event-driven ones.
    pub period_ms: Option<u64>,
    /// Whether the watchdog supervises it.
    pub monitored: bool,
}

/// Application tasks in creation order.
pub const TASKS: &[TaskSpec] = &[
    TaskSpec {
        name: "io",
        priority: IO_TASK_PRIORITY,
        period_ms: Some(IO_POLL_PERIOD_MS),
        monitored: true,
    },
    TaskSpec {
        name: "util",
        priority: UTIL_TASK_PRIORITY,
        period_ms: Some(UTIL_POLL_PERIOD_MS),
        monitored: true,
    },
    TaskSpec {
        name: "eth-init",
        priority: ETH_INIT_PRIORITY,
        period_ms: None,
        monitored: false,
    },
    TaskSpec {
        name: "web",
        priority: WEB_TASK_PRIORITY,
        period_ms: None,
        monitored: false,
    },
    TaskSpec {
        name: "net",
        priority: NET_TASK_PRIORITY,
        period_ms: None,
        monitored: false,
    },
];

// ── Console output ───────────────────────────────────────────────────────────

struct ConsoleWriter<'a, C: ?Sized>(&'a C);

impl<C: Console + ?Sized> fmt::Write for ConsoleWriter<'_, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s);
        Ok(())
    }
}

/// Print the identity banner.
pub fn print_identity<C>(console: &C, permanent: &PermanentConfig, user: &UserConfig)
where
    C: Console + ?Sized,
{
    let mut out = ConsoleWriter(console);
    let _ = write!(
        out,
        "\n{APP_NAME}\n{BOARD_NAME}\n{COPYRIGHT}\n\
         \x20     Software Version: {APP_VERSION}\n\
         \x20 Assembly Part Number: {}\n\
         Assembly Serial Number: {}\n\
         \x20    Board Part Number: {}\n\
         \x20  Board Serial Number: {}\n\
         Notes:\n {}\n",
        user.assembly_part_number,
        user.assembly_serial_number,
        permanent.board_part_number,
        permanent.board_serial_number,
        user.notes,
    );
}

/// Print the network identity the stack will come up with.
pub fn print_network<C>(console: &C, mac: [u8; 6], ip: &IpConfig)
where
    C: Console + ?Sized,
{
    let mut out = ConsoleWriter(console);
    let [m0, m1, m2, m3, m4, m5] = mac;
    let [a, b, c, d] = ip.address.to_be_bytes();
    let _ = write!(
        out,
        "\nMAC: {m0:02X}:{m1:02X}:{m2:02X}:{m3:02X}:{m4:02X}:{m5:02X}\n IP: {a}.{b}.{c}.{d}\n\n"
    );
}

/// Report the latched reset cause, then clear it. Returns what was latched.
pub fn report_reset_cause<R, C>(reset: &mut R, console: &C) -> ResetCause
where
    R: ResetControl + ?Sized,
    C: Console + ?Sized,
{
    let why = reset.reset_cause();
    if why.is_empty() {
        return why;
    }
    reset.clear_reset_cause(why);

    console.write_str("Reset reason: ");
    for label in why.labels() {
        console.write_str(label);
        console.write_str(" ");
    }
    console.write_str("\n");
    if why.contains(ResetCause::WATCHDOG) {
        warn!("previous run ended in a watchdog reset");
    }
    why
}

// ── System context ───────────────────────────────────────────────────────────

/// State shared by every task.
pub struct System<G, F> {
    /// Watchdog check-in table.
    pub monitor: WatchdogMonitor,
    /// Latest analog sample set.
    pub samples: AnalogSamples,
    /// Discrete accessor.
    pub discrete: DiscreteIo<G>,
    config: Mutex<CriticalSectionRawMutex, ConfigStore<F>>,
}

impl<G: GpioPorts, F: NorFlash> System<G, F> {
    /// Assemble the context from an already loaded store.
    pub fn new(gpio: G, store: ConfigStore<F>) -> Self {
        Self {
            monitor: WatchdogMonitor::with_default_limits(),
            samples: AnalogSamples::new(),
            discrete: DiscreteIo::new(gpio),
            config: Mutex::new(store),
        }
    }

    /// Exclusive access to the configuration store, waiting at most the I/O
    /// lock timeout.
    pub async fn config(
        &self,
    ) -> Option<MutexGuard<'_, CriticalSectionRawMutex, ConfigStore<F>>> {
        let guard = with_timeout(Duration::from_millis(IO_LOCK_TIMEOUT_MS), self.config.lock())
            .await
            .ok();
        if guard.is_none() {
            warn!("configuration lock timeout");
        }
        guard
    }
}

/// Boot steps 2 to 5: load configuration, announce, report the reset cause
/// and build the shared context. The caller spawns the tasks.
pub fn boot<G, F, U, R, C>(gpio: G, flash: F, otp: &U, reset: &mut R, console: &C) -> System<G, F>
where
    G: GpioPorts,
    F: NorFlash,
    U: UserRegisters + ?Sized,
    R: ResetControl + ?Sized,
    C: Console + ?Sized,
{
    let store = ConfigStore::load_with_otp(flash, otp);
    print_identity(console, store.permanent(), store.user());
    report_reset_cause(reset, console);
    print_network(console, store.permanent().mac, &store.user().ip_config());
    info!("boot complete, starting tasks");
    System::new(gpio, store)
}

/// Drive both monitored tasks from one future, for executors that cannot
/// spawn. Neither returns.
pub async fn run_monitored<A, C, W>(io: IoTask<'_, A, C>, util: UtilTask<'_, W>) -> !
where
    A: AdcSequencer,
    C: Console + ?Sized,
    W: WatchdogPeripheral,
{
    join(io.run(), util.run()).await.0
}
