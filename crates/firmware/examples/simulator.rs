//! Desktop simulator
//!
//! Boots the firmware core against host mocks and runs the I/O task, the
//! utility task and a simulated watchdog interrupt on tokio.
//!
//! Run with: cargo run -p firmware --example simulator --features emulator
//!
//! `--stall io|util` stops one task's loop after two seconds so the
//! watchdog trips and names it.

use core::cell::RefCell;
use std::time::Duration;

use clap::Parser;
use embassy_futures::join::join;
use embassy_time::Ticker;
use firmware::io::{AdcUnits, AnalogChannel, DiscreteChannel};
use firmware::watchdog::{SharedWatchdog, TaskId, TickOutcome};
use firmware::{boot, run_monitored, IoTask, UtilTask};
use platform::config::{self, IO_POLL_PERIOD_MS, UTIL_POLL_PERIOD_MS, WDT_RESET_MS};
use platform::mocks::{
    MockAdc, MockConsole, MockFlash, MockGpio, MockReset, MockUserRegisters, MockWatchdog,
};
use platform::{Port, ResetCause};
use tracing_subscriber::EnvFilter;

/// Raw counts for the five sequenced inputs: four external, then temperature.
const ADC_STEADY: [u32; 5] = [512, 256, 768, 1023, 600];

#[derive(Parser)]
#[command(name = "simulator")]
#[command(about = "Run the firmware core against host mocks", long_about = None)]
struct Options {
    /// How long to run, in seconds
    #[arg(long, default_value_t = 30)]
    seconds: u64,
    /// Stop one monitored task's loop to watch the watchdog trip
    #[arg(long, value_parser = ["io", "util"])]
    stall: Option<String>,
}

impl Options {
    fn stalled_task(&self) -> Option<TaskId> {
        match self.stall.as_deref()? {
            "io" => Some(TaskId::Io),
            _ => Some(TaskId::Util),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = Options::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("{} - Desktop Simulator", config::APP_NAME);
    println!("Running for {} s\n", options.seconds);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    rt.block_on(simulate(options));
    Ok(())
}

async fn simulate(options: Options) {
    let console = MockConsole::echoing();
    let gpio = MockGpio::new();
    // Buttons idle high (pulled up), LED off.
    gpio.set_level(Port::E, 0x0F);
    gpio.set_level(Port::F, 0x02);

    let otp = MockUserRegisters::new(0x00B7_FCA8, 0x0001_0000);
    let mut reset = MockReset::new(ResetCause::POWER_ON.union(ResetCause::EXTERNAL));
    let system = boot(gpio, MockFlash::new(), &otp, &mut reset, &console);

    let wdt = SharedWatchdog::new(RefCell::new(MockWatchdog::new()));
    let io = IoTask::new(
        &system.monitor,
        &system.samples,
        MockAdc::new(&ADC_STEADY),
        &console,
    );
    let util = UtilTask::new(&system.monitor, &wdt);
    let tasks = async {
        match options.stalled_task() {
            None => run_monitored(io, util).await,
            Some(task) => run_stalling(task, io, util).await,
        }
    };

    // The hardware reloads every half reset period; each expiry is one
    // interrupt.
    let interrupt_loop = async {
        let mut interval = tokio::time::interval(Duration::from_millis(u64::from(
            WDT_RESET_MS.saturating_div(2),
        )));
        loop {
            interval.tick().await;
            let raised = wdt.lock(|cell| cell.borrow_mut().timeout());
            if raised {
                if let TickOutcome::Withheld(task) = system.monitor.service(&wdt, &console) {
                    tracing::error!(task = task.as_str(), "watchdog withheld");
                }
            }
            if wdt.lock(|cell| cell.borrow().reset_asserted()) {
                tracing::error!("watchdog reset asserted");
                return;
            }
        }
    };

    let panel_loop = async {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        let mut led = false;
        loop {
            interval.tick().await;
            led = !led;
            if let Err(e) = system
                .discrete
                .write_if_changed(DiscreteChannel::Led0, led)
                .await
            {
                tracing::warn!(error = %e, "LED write failed");
            }
            let temp = system
                .samples
                .read(AnalogChannel::ProcTemp, AdcUnits::Engineering)
                .await;
            let proc0 = system
                .samples
                .read(AnalogChannel::Proc0, AdcUnits::Millivolts)
                .await;
            tracing::info!(
                led,
                select = system.discrete.read(DiscreteChannel::Select),
                proc0_mv = proc0,
                temp_milli_c = temp,
                "panel"
            );
        }
    };

    tokio::select! {
        () = tokio::time::sleep(Duration::from_secs(options.seconds)) => {
            tracing::info!("simulation finished");
        }
        () = interrupt_loop => {}
        _ = tasks => {}
        _ = panel_loop => {}
    }
}

/// Like [`run_monitored`], but `stalled` stops looping after two seconds
/// while the other task carries on.
async fn run_stalling(
    stalled: TaskId,
    mut io: IoTask<'_, MockAdc, MockConsole>,
    mut util: UtilTask<'_, MockWatchdog>,
) {
    let stall_after = Duration::from_secs(2);
    let started = tokio::time::Instant::now();
    util.start();

    let io_loop = async {
        let mut ticker = Ticker::every(embassy_time::Duration::from_millis(IO_POLL_PERIOD_MS));
        while stalled != TaskId::Io || started.elapsed() < stall_after {
            let _ = io.iteration().await;
            ticker.next().await;
        }
        tracing::warn!("io task stalled");
    };
    let util_loop = async {
        let mut ticker = Ticker::every(embassy_time::Duration::from_millis(UTIL_POLL_PERIOD_MS));
        while stalled != TaskId::Util || started.elapsed() < stall_after {
            util.iteration();
            ticker.next().await;
        }
        tracing::warn!("util task stalled");
    };

    join(io_loop, util_loop).await;
}
