//! Discrete (single-bit) I/O.
//!
//! Reads go straight to the port: a masked read is one load on the target
//! and cannot tear. Writes are read-then-write so the caller gets the
//! previous level back; that pair is serialized by one async mutex per port,
//! acquired with a bounded wait.
//!
//! | Name        | Pin | Direction |
//! |-------------|-----|-----------|
//! | `dioUp`     | PE0 | input     |
//! | `dioDown`   | PE1 | input     |
//! | `dioLeft`   | PE2 | input     |
//! | `dioRight`  | PE3 | input     |
//! | `dioSelect` | PF1 | input     |
//! | `dioLed0`   | PF0 | output    |
//! | `pA0`..`pG7`| any | output    |

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration};
use platform::config::IO_LOCK_TIMEOUT_MS;
use platform::{GpioPorts, Port, PortPin};

/// Errors from discrete writes. Both are recoverable; the caller may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscreteError {
    /// The channel is an input.
    #[error("discrete channel is not writable")]
    NotWritable,
    /// The port lock was not acquired within the I/O lock timeout.
    #[error("timed out waiting for the port lock")]
    LockTimeout,
}

/// A named single-bit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscreteChannel {
    /// Navigation switch, up.
    Up,
    /// Navigation switch, down.
    Down,
    /// Navigation switch, left.
    Left,
    /// Navigation switch, right.
    Right,
    /// Select push-button.
    Select,
    /// Status LED.
    Led0,
    /// Any port pin by address.
    Pin(PortPin),
}

const NAME_TABLE: [(&str, DiscreteChannel); 6] = [
    ("dioUp", DiscreteChannel::Up),
    ("dioDown", DiscreteChannel::Down),
    ("dioLeft", DiscreteChannel::Left),
    ("dioRight", DiscreteChannel::Right),
    ("dioSelect", DiscreteChannel::Select),
    ("dioLed0", DiscreteChannel::Led0),
];

const PIN_NAMES: [[&str; 8]; Port::COUNT] = [
    ["pA0", "pA1", "pA2", "pA3", "pA4", "pA5", "pA6", "pA7"],
    ["pB0", "pB1", "pB2", "pB3", "pB4", "pB5", "pB6", "pB7"],
    ["pC0", "pC1", "pC2", "pC3", "pC4", "pC5", "pC6", "pC7"],
    ["pD0", "pD1", "pD2", "pD3", "pD4", "pD5", "pD6", "pD7"],
    ["pE0", "pE1", "pE2", "pE3", "pE4", "pE5", "pE6", "pE7"],
    ["pF0", "pF1", "pF2", "pF3", "pF4", "pF5", "pF6", "pF7"],
    ["pG0", "pG1", "pG2", "pG3", "pG4", "pG5", "pG6", "pG7"],
];

impl DiscreteChannel {
    /// Board mnemonic channels, in table order.
    pub const NAMED: [DiscreteChannel; 6] = [
        DiscreteChannel::Up,
        DiscreteChannel::Down,
        DiscreteChannel::Left,
        DiscreteChannel::Right,
        DiscreteChannel::Select,
        DiscreteChannel::Led0,
    ];

    /// Port pin behind the channel.
    pub const fn pin(self) -> PortPin {
        match self {
            DiscreteChannel::Up => PortPin::masked(Port::E, 0),
            DiscreteChannel::Down => PortPin::masked(Port::E, 1),
            DiscreteChannel::Left => PortPin::masked(Port::E, 2),
            DiscreteChannel::Right => PortPin::masked(Port::E, 3),
            DiscreteChannel::Select => PortPin::masked(Port::F, 1),
            DiscreteChannel::Led0 => PortPin::masked(Port::F, 0),
            DiscreteChannel::Pin(pin) => pin,
        }
    }

    /// Whether [`DiscreteIo::write`] accepts this channel.
    pub const fn is_writable(self) -> bool {
        matches!(self, DiscreteChannel::Led0 | DiscreteChannel::Pin(_))
    }

    /// Channel for an exact name, e.g. `"dioLed0"` or `"pC5"`.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some((_, channel)) = NAME_TABLE.iter().find(|(n, _)| *n == name) {
            return Some(*channel);
        }
        let mut chars = name.chars();
        if chars.next() != Some('p') {
            return None;
        }
        let port = Port::from_letter(chars.next()?)?;
        let bit = chars.next()?.to_digit(10)?;
        if chars.next().is_some() {
            return None;
        }
        PortPin::new(port, u8::try_from(bit).ok()?).map(DiscreteChannel::Pin)
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        if let Some((name, _)) = NAME_TABLE.iter().find(|(_, c)| *c == self) {
            return name;
        }
        let pin = self.pin();
        PIN_NAMES
            .get(pin.port().index())
            .and_then(|row| row.get(usize::from(pin.bit())))
            .copied()
            .unwrap_or("p??")
    }
}

/// Discrete accessor over a set of GPIO ports.
pub struct DiscreteIo<G> {
    gpio: G,
    port_locks: [Mutex<CriticalSectionRawMutex, ()>; Port::COUNT],
}

impl<G: GpioPorts> DiscreteIo<G> {
    /// Wrap the ports. Pin directions are set up by board bring-up.
    pub const fn new(gpio: G) -> Self {
        Self {
            gpio,
            port_locks: [const { Mutex::new(()) }; Port::COUNT],
        }
    }

    /// Underlying ports.
    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    /// Current level. Lock-free.
    pub fn read(&self, channel: DiscreteChannel) -> bool {
        self.gpio.read_pin(channel.pin()).into()
    }

    /// Drive `channel` to `value` and return the level it had before.
    pub async fn write(&self, channel: DiscreteChannel, value: bool) -> Result<bool, DiscreteError> {
        if !channel.is_writable() {
            warn!("discrete write to input {}", channel.name());
            return Err(DiscreteError::NotWritable);
        }
        let pin = channel.pin();
        let Some(lock) = self.port_locks.get(pin.port().index()) else {
            return Err(DiscreteError::NotWritable);
        };
        let Ok(_guard) =
            with_timeout(Duration::from_millis(IO_LOCK_TIMEOUT_MS), lock.lock()).await
        else {
            warn!("discrete write to {}: port lock timeout", channel.name());
            return Err(DiscreteError::LockTimeout);
        };
        let previous = bool::from(self.gpio.read_pin(pin));
        self.gpio.write_pin(pin, value.into());
        trace!("discrete {} {} -> {}", channel.name(), u8::from(previous), u8::from(value));
        Ok(previous)
    }

    /// Write only when the level differs from `value`. Returns the previous
    /// level either way; an unchanged channel never touches the port.
    pub async fn write_if_changed(
        &self,
        channel: DiscreteChannel,
        value: bool,
    ) -> Result<bool, DiscreteError> {
        let current = self.read(channel);
        if current == value {
            return Ok(current);
        }
        self.write(channel, value).await
    }
}

#[cfg(test)]
mod tests {
    use platform::mocks::MockGpio;

    use super::*;

    #[test]
    fn names_round_trip() {
        for channel in DiscreteChannel::NAMED {
            assert_eq!(DiscreteChannel::from_name(channel.name()), Some(channel));
        }
        for port in Port::ALL {
            for bit in 0..8 {
                let channel = DiscreteChannel::Pin(PortPin::new(port, bit).unwrap());
                assert_eq!(DiscreteChannel::from_name(channel.name()), Some(channel));
            }
        }
    }

    #[test]
    fn names_match_exactly() {
        assert_eq!(DiscreteChannel::from_name("dioLed"), None);
        assert_eq!(DiscreteChannel::from_name("dioLed01"), None);
        assert_eq!(DiscreteChannel::from_name("pH0"), None);
        assert_eq!(DiscreteChannel::from_name("pA8"), None);
        assert_eq!(DiscreteChannel::from_name("pA10"), None);
        assert_eq!(DiscreteChannel::from_name(""), None);
    }

    #[test]
    fn board_mapping() {
        assert_eq!(DiscreteChannel::Select.pin(), PortPin::new(Port::F, 1).unwrap());
        assert_eq!(DiscreteChannel::Led0.pin(), PortPin::new(Port::F, 0).unwrap());
        assert_eq!(DiscreteChannel::Right.pin(), PortPin::new(Port::E, 3).unwrap());
    }

    #[test]
    fn read_reflects_port_level() {
        let dio = DiscreteIo::new(MockGpio::new());
        dio.gpio().set_level(Port::E, 0b0000_0100);
        assert!(dio.read(DiscreteChannel::Left));
        assert!(!dio.read(DiscreteChannel::Up));
    }

    #[tokio::test]
    async fn write_returns_previous_level() {
        let dio = DiscreteIo::new(MockGpio::new());
        assert_eq!(dio.write(DiscreteChannel::Led0, true).await, Ok(false));
        assert_eq!(dio.write(DiscreteChannel::Led0, false).await, Ok(true));
        assert!(!dio.read(DiscreteChannel::Led0));
    }

    #[tokio::test]
    async fn write_to_input_is_rejected() {
        let dio = DiscreteIo::new(MockGpio::new());
        assert_eq!(
            dio.write(DiscreteChannel::Select, true).await,
            Err(DiscreteError::NotWritable)
        );
        assert_eq!(dio.gpio().write_count(), 0);
    }

    #[tokio::test]
    async fn held_port_lock_times_out() {
        let dio = DiscreteIo::new(MockGpio::new());
        let _held = dio.port_locks[Port::F.index()].try_lock().unwrap();
        assert_eq!(
            dio.write(DiscreteChannel::Led0, true).await,
            Err(DiscreteError::LockTimeout)
        );
        // A different port is unaffected.
        let pa3 = DiscreteChannel::Pin(PortPin::new(Port::A, 3).unwrap());
        assert_eq!(dio.write(pa3, true).await, Ok(false));
    }
}
