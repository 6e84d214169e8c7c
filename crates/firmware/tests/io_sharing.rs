//! Shared I/O state under concurrency
//!
//! Runs the discrete accessor and the sample set on a multi-threaded tokio
//! runtime so that writers, readers and the scanner genuinely overlap.
//!
//! Run with: cargo test -p firmware --test io_sharing
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;

use firmware::io::{
    AdcScanner, AdcUnits, AnalogChannel, AnalogSamples, DiscreteChannel, DiscreteError,
    DiscreteIo,
};
use platform::mocks::{MockAdc, MockGpio};
use platform::{Port, PortPin};

const SEQ_A: [u32; 5] = [10, 20, 30, 40, 50];
const SEQ_B: [u32; 5] = [1000, 900, 800, 700, 600];

// ─── Discrete lines ──────────────────────────────────────────────────────────

/// Many tasks drive the LED high at once. The read-modify-write happens under
/// the port lock, so exactly one of them observes the old low level.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_see_one_transition() {
    let io = Arc::new(DiscreteIo::new(MockGpio::new()));

    for round in 0..20 {
        let value = round % 2 == 0;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let io = Arc::clone(&io);
            handles.push(tokio::spawn(async move {
                io.write(DiscreteChannel::Led0, value).await
            }));
        }

        let mut saw_old = 0;
        for handle in handles {
            let previous = handle.await.unwrap().unwrap();
            if previous != value {
                saw_old += 1;
            }
        }
        assert_eq!(saw_old, 1, "round {round}: exactly one writer sees the transition");
        assert_eq!(io.read(DiscreteChannel::Led0), value);
    }
}

/// Writers on different bits of one port never clobber each other.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_masked_writes_preserve_neighbours() {
    let io = Arc::new(DiscreteIo::new(MockGpio::new()));

    let mut handles = Vec::new();
    for bit in 0..8u8 {
        let io = Arc::clone(&io);
        handles.push(tokio::spawn(async move {
            let pin = DiscreteChannel::Pin(PortPin::new(Port::D, bit).unwrap());
            for i in 0..100 {
                io.write(pin, i % 2 == 0).await.unwrap();
            }
            // Finish high on odd bits, low on even bits.
            io.write(pin, bit % 2 == 1).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(io.gpio().level(Port::D), 0b1010_1010);
}

/// Writing the level a line already has is a no-op on the port, and both
/// calls report the same level.
#[tokio::test]
async fn test_write_if_changed_skips_port() {
    let io = DiscreteIo::new(MockGpio::new());
    io.gpio().set_level(Port::F, 0x01);

    let first = io.write_if_changed(DiscreteChannel::Led0, true).await.unwrap();
    let second = io.write_if_changed(DiscreteChannel::Led0, true).await.unwrap();
    assert_eq!(first, second);
    assert!(first);
    assert_eq!(io.gpio().write_count(), 0);
}

/// Inputs refuse writes by name, but their raw pins are still addressable.
#[tokio::test]
async fn test_input_channel_refuses_write() {
    let io = DiscreteIo::new(MockGpio::new());
    assert_eq!(
        io.write(DiscreteChannel::Select, true).await,
        Err(DiscreteError::NotWritable)
    );
    assert_eq!(io.gpio().write_count(), 0);

    let raw = DiscreteChannel::from_name("pF1").unwrap();
    assert_eq!(io.write(raw, true).await, Ok(false));
    assert!(io.read(DiscreteChannel::Select));
}

// ─── Sample set ──────────────────────────────────────────────────────────────

/// Readers never observe a sample set mixing two conversion sequences.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_snapshots_are_whole_sequences() {
    let samples = Arc::new(AnalogSamples::new());

    let scanner = {
        let samples = Arc::clone(&samples);
        tokio::spawn(async move {
            let mut scanner = AdcScanner::new(MockAdc::new(&SEQ_A));
            for i in 0..500 {
                let seq = if i % 2 == 0 { SEQ_A } else { SEQ_B };
                scanner.adc_mut().set_steady(&seq);
                scanner.scan(&samples).await.unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..3 {
        let samples = Arc::clone(&samples);
        readers.push(tokio::spawn(async move {
            for _ in 0..500 {
                let set = samples.snapshot().await.unwrap();
                let head = &set[..5];
                assert!(
                    head == [0; 5] || head == SEQ_A || head == SEQ_B,
                    "torn sample set {head:?}"
                );
                tokio::task::yield_now().await;
            }
        }));
    }

    scanner.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
    assert_eq!(samples.snapshot().await.unwrap()[..5], SEQ_B);
}

/// A short read is discarded and the previous set stays visible.
#[tokio::test]
async fn test_short_read_keeps_previous_set() {
    let samples = AnalogSamples::new();
    let mut scanner = AdcScanner::new(MockAdc::new(&SEQ_A));
    scanner.scan(&samples).await.unwrap();

    scanner.adc_mut().set_steady(&SEQ_B[..3]);
    assert!(scanner.scan(&samples).await.is_err());
    assert_eq!(samples.read(AnalogChannel::Proc0, AdcUnits::Raw).await, 10);
    assert_eq!(samples.read(AnalogChannel::ProcTemp, AdcUnits::Raw).await, 50);
}
