//! Analog acquisition: sample sequencing, the shared sample set, and unit
//! conversion.
//!
//! The I/O task owns an [`AdcScanner`] and is the only writer of the shared
//! [`AnalogSamples`]. Readers anywhere copy one value out under the same
//! mutex and convert after releasing it. A scan never publishes a partial
//! set: results land in a local buffer first and are committed only when the
//! sequencer delivered exactly one full sequence.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration};
use platform::config::{
    ADC_FIFO_DEPTH, ADC_FULL_SCALE, ADC_SEQUENCE_LEN, ADC_VREF_MV, IO_LOCK_TIMEOUT_MS,
};
use platform::AdcSequencer;

/// Completion-flag polls before a conversion is declared lost.
pub const MAX_READY_POLLS: u32 = 10_000;

/// Trigger/read attempts per scan before giving up on a matching count.
pub const MAX_SCAN_ATTEMPTS: u32 = 8;

// ── Channels and units ───────────────────────────────────────────────────────

/// Slot in the sample set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnalogChannel {
    /// External input 0
    Proc0,
    /// External input 1
    Proc1,
    /// External input 2
    Proc2,
    /// External input 3
    Proc3,
    /// On-chip temperature sensor
    ProcTemp,
    /// Reserved FIFO slot
    Unused1,
    /// Reserved FIFO slot
    Unused2,
    /// Reserved FIFO slot
    Unused3,
}

impl AnalogChannel {
    /// All slots, in sample-set order.
    pub const ALL: [AnalogChannel; ADC_FIFO_DEPTH] = [
        AnalogChannel::Proc0,
        AnalogChannel::Proc1,
        AnalogChannel::Proc2,
        AnalogChannel::Proc3,
        AnalogChannel::ProcTemp,
        AnalogChannel::Unused1,
        AnalogChannel::Unused2,
        AnalogChannel::Unused3,
    ];

    /// Index into the sample set.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical name.
    pub const fn name(self) -> &'static str {
        match self {
            AnalogChannel::Proc0 => "adcProc0",
            AnalogChannel::Proc1 => "adcProc1",
            AnalogChannel::Proc2 => "adcProc2",
            AnalogChannel::Proc3 => "adcProc3",
            AnalogChannel::ProcTemp => "adcProcTemp",
            AnalogChannel::Unused1 => "adcUnused1",
            AnalogChannel::Unused2 => "adcUnused2",
            AnalogChannel::Unused3 => "adcUnused3",
        }
    }

    /// Channel for an exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Scaling applied by [`AnalogSamples::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcUnits {
    /// Converter counts.
    Raw,
    /// Millivolts at the pin.
    Millivolts,
    /// Engineering value ×1000. Milli-°C for the temperature sensor,
    /// millivolts for channels without a transfer function.
    Engineering,
}

impl AdcUnits {
    /// All units.
    pub const ALL: [AdcUnits; 3] = [AdcUnits::Raw, AdcUnits::Millivolts, AdcUnits::Engineering];

    /// Canonical name.
    pub const fn name(self) -> &'static str {
        match self {
            AdcUnits::Raw => "raw",
            AdcUnits::Millivolts => "millivolts",
            AdcUnits::Engineering => "engineering",
        }
    }

    /// Unit for an exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.name() == name)
    }
}

/// Counts to millivolts, truncating.
pub const fn to_millivolts(raw: u32) -> i32 {
    raw.wrapping_mul(ADC_VREF_MV as u32)
        .wrapping_div(ADC_FULL_SCALE as u32) as i32
}

/// Temperature sensor counts to milli-°C.
///
/// Sensor transfer function: `V = 2.7 - (T + 55) / 75`.
pub const fn temperature_milli_c(raw: u32) -> i32 {
    2_700i32
        .wrapping_sub(to_millivolts(raw))
        .wrapping_mul(75)
        .wrapping_sub(55_000)
}

/// Convert one raw count.
pub const fn convert(channel: AnalogChannel, raw: u32, units: AdcUnits) -> i32 {
    match units {
        AdcUnits::Raw => raw as i32,
        AdcUnits::Millivolts => to_millivolts(raw),
        AdcUnits::Engineering => match channel {
            AnalogChannel::ProcTemp => temperature_milli_c(raw),
            _ => to_millivolts(raw),
        },
    }
}

// ── Shared sample set ────────────────────────────────────────────────────────

/// Error reading the sample set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnalogError {
    /// Sample lock not acquired within the I/O lock timeout.
    #[error("timed out waiting for the sample lock")]
    LockTimeout,
}

/// The latest complete conversion sequence.
pub struct AnalogSamples {
    inner: Mutex<CriticalSectionRawMutex, [u32; ADC_FIFO_DEPTH]>,
}

impl AnalogSamples {
    /// All zeros.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new([0; ADC_FIFO_DEPTH]),
        }
    }

    /// Read one channel, or `Err` if the lock could not be taken in time.
    pub async fn try_read(&self, channel: AnalogChannel, units: AdcUnits) -> Result<i32, AnalogError> {
        let raw = {
            let set = with_timeout(Duration::from_millis(IO_LOCK_TIMEOUT_MS), self.inner.lock())
                .await
                .map_err(|_| AnalogError::LockTimeout)?;
            set.get(channel.index()).copied().unwrap_or(0)
        };
        Ok(convert(channel, raw, units))
    }

    /// Read one channel. A lock timeout is logged and reads as `0`.
    pub async fn read(&self, channel: AnalogChannel, units: AdcUnits) -> i32 {
        match self.try_read(channel, units).await {
            Ok(value) => value,
            Err(_) => {
                warn!("analog read {}: sample lock timeout", channel.name());
                0
            }
        }
    }

    /// Copy of the whole raw set.
    pub async fn snapshot(&self) -> Result<[u32; ADC_FIFO_DEPTH], AnalogError> {
        let set = with_timeout(Duration::from_millis(IO_LOCK_TIMEOUT_MS), self.inner.lock())
            .await
            .map_err(|_| AnalogError::LockTimeout)?;
        Ok(*set)
    }

    /// Publish one complete sequence.
    async fn commit(&self, results: &[u32; ADC_FIFO_DEPTH]) -> Result<(), AnalogError> {
        let mut set = with_timeout(Duration::from_millis(IO_LOCK_TIMEOUT_MS), self.inner.lock())
            .await
            .map_err(|_| AnalogError::LockTimeout)?;
        for (dst, src) in set.iter_mut().zip(results).take(ADC_SEQUENCE_LEN) {
            *dst = *src;
        }
        Ok(())
    }
}

impl Default for AnalogSamples {
    fn default() -> Self {
        Self::new()
    }
}

// ── Scanner ──────────────────────────────────────────────────────────────────

/// Why a scan did not publish new samples. The previous set stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanError {
    /// The completion flag never came up.
    #[error("A/D conversion did not complete")]
    ConversionTimeout,
    /// Every attempt returned the wrong number of results.
    #[error("A/D sample count wrong on {attempts} attempts")]
    SampleCountMismatch {
        /// Attempts made.
        attempts: u32,
    },
    /// Sample lock not acquired within the I/O lock timeout.
    #[error("timed out waiting for the sample lock")]
    LockTimeout,
}

/// Outcome of a successful scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanReport {
    /// Trigger/read attempts, including the successful one.
    pub attempts: u32,
    /// Attempts discarded for a wrong sample count.
    pub mismatches: u32,
}

/// Drives the sequencer and publishes complete sequences.
pub struct AdcScanner<A> {
    adc: A,
    configured: bool,
    total_mismatches: u32,
}

impl<A: AdcSequencer> AdcScanner<A> {
    /// Take ownership of the sequencer.
    pub const fn new(adc: A) -> Self {
        Self {
            adc,
            configured: false,
            total_mismatches: 0,
        }
    }

    /// The sequencer.
    pub fn adc(&self) -> &A {
        &self.adc
    }

    /// The sequencer, mutably.
    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }

    /// Wrong-count reads discarded since start-up.
    pub fn total_mismatches(&self) -> u32 {
        self.total_mismatches
    }

    /// Run one full conversion sequence and publish it.
    pub async fn scan(&mut self, samples: &AnalogSamples) -> Result<ScanReport, ScanError> {
        if !self.configured {
            self.adc.configure();
            self.configured = true;
        }

        let mut mismatches = 0u32;
        for attempt in 1..=MAX_SCAN_ATTEMPTS {
            self.adc.trigger();
            self.wait_complete()?;

            let mut local = [0u32; ADC_FIFO_DEPTH];
            let count = self.adc.read_results(&mut local);
            if count == ADC_SEQUENCE_LEN {
                samples
                    .commit(&local)
                    .await
                    .map_err(|_| ScanError::LockTimeout)?;
                return Ok(ScanReport {
                    attempts: attempt,
                    mismatches,
                });
            }

            mismatches = mismatches.saturating_add(1);
            self.total_mismatches = self.total_mismatches.saturating_add(1);
            debug!("A/D samples: is {}, should be {}", count, ADC_SEQUENCE_LEN);
        }

        warn!("A/D sample count wrong {} times, keeping previous set", MAX_SCAN_ATTEMPTS);
        Err(ScanError::SampleCountMismatch {
            attempts: MAX_SCAN_ATTEMPTS,
        })
    }

    fn wait_complete(&mut self) -> Result<(), ScanError> {
        for _ in 0..MAX_READY_POLLS {
            if self.adc.is_complete() {
                return Ok(());
            }
        }
        error!("A/D conversion timeout");
        Err(ScanError::ConversionTimeout)
    }
}

#[cfg(test)]
mod tests {
    use platform::mocks::MockAdc;

    use super::*;

    const SEQ: [u32; 5] = [100, 200, 300, 400, 512];

    #[test]
    fn millivolt_conversion_truncates() {
        assert_eq!(to_millivolts(0), 0);
        assert_eq!(to_millivolts(1), 2);
        assert_eq!(to_millivolts(512), 1_500);
        assert_eq!(to_millivolts(1_023), 2_997);
    }

    #[test]
    fn temperature_conversion() {
        assert_eq!(temperature_milli_c(0), 147_500);
        assert_eq!(temperature_milli_c(512), 35_000);
        assert_eq!(temperature_milli_c(1_023), -77_275);
    }

    #[test]
    fn engineering_falls_back_to_millivolts() {
        assert_eq!(convert(AnalogChannel::Proc2, 512, AdcUnits::Engineering), 1_500);
        assert_eq!(convert(AnalogChannel::ProcTemp, 512, AdcUnits::Engineering), 35_000);
        assert_eq!(convert(AnalogChannel::ProcTemp, 512, AdcUnits::Raw), 512);
    }

    #[test]
    fn names_round_trip() {
        for channel in AnalogChannel::ALL {
            assert_eq!(AnalogChannel::from_name(channel.name()), Some(channel));
        }
        for units in AdcUnits::ALL {
            assert_eq!(AdcUnits::from_name(units.name()), Some(units));
        }
        assert_eq!(AnalogChannel::from_name("adcInvalid"), None);
        assert_eq!(AnalogChannel::from_name("adcProc"), None);
    }

    #[tokio::test]
    async fn scan_publishes_exact_count() {
        let samples = AnalogSamples::new();
        let mut scanner = AdcScanner::new(MockAdc::new(&SEQ));

        let report = scanner.scan(&samples).await.unwrap();
        assert_eq!(report, ScanReport { attempts: 1, mismatches: 0 });
        assert_eq!(
            samples.snapshot().await.unwrap(),
            [100, 200, 300, 400, 512, 0, 0, 0]
        );
        assert_eq!(samples.read(AnalogChannel::ProcTemp, AdcUnits::Engineering).await, 35_000);
    }

    #[tokio::test]
    async fn wrong_count_is_retried_and_never_published() {
        let samples = AnalogSamples::new();
        let mut adc = MockAdc::new(&SEQ);
        adc.push_results(&[9, 9, 9, 9]);
        adc.push_results(&[9, 9, 9, 9, 9, 9]);
        let mut scanner = AdcScanner::new(adc);

        let report = scanner.scan(&samples).await.unwrap();
        assert_eq!(report, ScanReport { attempts: 3, mismatches: 2 });
        assert_eq!(scanner.total_mismatches(), 2);
        assert_eq!(samples.read(AnalogChannel::Proc0, AdcUnits::Raw).await, 100);
    }

    #[tokio::test]
    async fn persistent_mismatch_keeps_previous_set() {
        let samples = AnalogSamples::new();
        let mut scanner = AdcScanner::new(MockAdc::new(&SEQ));
        scanner.scan(&samples).await.unwrap();

        scanner.adc_mut().set_steady(&[7, 7, 7]);
        assert_eq!(
            scanner.scan(&samples).await,
            Err(ScanError::SampleCountMismatch { attempts: MAX_SCAN_ATTEMPTS })
        );
        assert_eq!(samples.read(AnalogChannel::Proc3, AdcUnits::Raw).await, 400);
    }

    #[tokio::test]
    async fn stuck_sequencer_times_out() {
        let samples = AnalogSamples::new();
        let mut adc = MockAdc::new(&SEQ);
        adc.set_polls_until_ready(u32::MAX);
        let mut scanner = AdcScanner::new(adc);
        assert_eq!(scanner.scan(&samples).await, Err(ScanError::ConversionTimeout));
    }

    #[tokio::test]
    async fn configure_runs_once() {
        let samples = AnalogSamples::new();
        let mut scanner = AdcScanner::new(MockAdc::new(&SEQ));
        for _ in 0..3 {
            scanner.scan(&samples).await.unwrap();
        }
        assert_eq!(scanner.adc().configure_count(), 1);
        assert_eq!(scanner.adc().trigger_count(), 3);
    }

    #[tokio::test]
    async fn held_lock_reads_as_zero() {
        let samples = AnalogSamples::new();
        let mut scanner = AdcScanner::new(MockAdc::new(&SEQ));
        scanner.scan(&samples).await.unwrap();

        let _held = samples.inner.try_lock().unwrap();
        assert_eq!(
            samples.try_read(AnalogChannel::Proc0, AdcUnits::Raw).await,
            Err(AnalogError::LockTimeout)
        );
        assert_eq!(samples.read(AnalogChannel::Proc0, AdcUnits::Raw).await, 0);
    }

    #[tokio::test]
    async fn held_lock_fails_commit_and_keeps_previous_set() {
        let samples = AnalogSamples::new();
        let mut scanner = AdcScanner::new(MockAdc::new(&SEQ));
        scanner.scan(&samples).await.unwrap();

        scanner.adc_mut().set_steady(&[1, 1, 1, 1, 1]);
        {
            let _held = samples.inner.try_lock().unwrap();
            assert_eq!(scanner.scan(&samples).await, Err(ScanError::LockTimeout));
        }
        assert_eq!(
            samples.snapshot().await.unwrap(),
            [100, 200, 300, 400, 512, 0, 0, 0]
        );
    }
}
