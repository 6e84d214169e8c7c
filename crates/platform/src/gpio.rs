//! GPIO port abstraction layer
//!
//! The board exposes seven 8-bit GPIO ports (A–G). Pins are addressed as a
//! [`PortPin`] (port + bit). The [`GpioPorts`] trait is the register-level
//! contract the firmware's discrete accessor is written against.
//!
//! # Atomicity
//!
//! On the target, a masked port read or write is a single load/store to the
//! port's bit-banded data register. Reads therefore never tear and need no
//! lock. A write preceded by a read (read-modify-write of the *logical* pin
//! level) is not atomic as a pair and is serialized by the caller.

/// GPIO port identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    /// Port A
    A,
    /// Port B
    B,
    /// Port C
    C,
    /// Port D
    D,
    /// Port E
    E,
    /// Port F
    F,
    /// Port G
    G,
}

impl Port {
    /// Number of GPIO ports on the part.
    pub const COUNT: usize = 7;

    /// All ports, in register order.
    pub const ALL: [Port; Port::COUNT] = [
        Port::A,
        Port::B,
        Port::C,
        Port::D,
        Port::E,
        Port::F,
        Port::G,
    ];

    /// Zero-based index of this port (A = 0).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Port letter as used in pin names (`'A'`..`'G'`).
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Port::A => 'A',
            Port::B => 'B',
            Port::C => 'C',
            Port::D => 'D',
            Port::E => 'E',
            Port::F => 'F',
            Port::G => 'G',
        }
    }

    /// Port for a letter, if the part has one.
    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'A' => Some(Port::A),
            'B' => Some(Port::B),
            'C' => Some(Port::C),
            'D' => Some(Port::D),
            'E' => Some(Port::E),
            'F' => Some(Port::F),
            'G' => Some(Port::G),
            _ => None,
        }
    }
}

/// One bit of one port.
///
/// Wraps `(port, bit)` with the invariant `bit < 8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortPin {
    port: Port,
    bit: u8,
}

impl PortPin {
    /// Pins per port.
    pub const PINS_PER_PORT: u8 = 8;

    /// Create a pin, returning `None` if `bit >= 8`.
    #[must_use]
    pub const fn new(port: Port, bit: u8) -> Option<Self> {
        if bit < Self::PINS_PER_PORT {
            Some(Self { port, bit })
        } else {
            None
        }
    }

    /// Create a pin from a bit number taken modulo 8.
    ///
    /// For board pin maps built in `const` context.
    #[must_use]
    pub const fn masked(port: Port, bit: u8) -> Self {
        Self { port, bit: bit & 0x07 }
    }

    /// The owning port.
    #[must_use]
    pub const fn port(self) -> Port {
        self.port
    }

    /// Bit number within the port (0–7).
    #[must_use]
    pub const fn bit(self) -> u8 {
        self.bit
    }

    /// Single-bit mask for this pin within its port.
    #[must_use]
    pub const fn mask(self) -> u8 {
        1u8.wrapping_shl(self.bit as u32)
    }
}

/// Pin state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    /// High (logic 1)
    High,
    /// Low (logic 0)
    Low,
}

impl From<bool> for PinState {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<PinState> for bool {
    fn from(value: PinState) -> Self {
        matches!(value, PinState::High)
    }
}

/// Register-level access to the GPIO ports.
///
/// Both methods take `&self`: the data registers are memory mapped and a
/// single masked access is atomic on the target. Implementations must not
/// block.
pub trait GpioPorts {
    /// Read the bits selected by `mask`. Unselected bits read as 0.
    fn read_masked(&self, port: Port, mask: u8) -> u8;

    /// Write `value` to the bits selected by `mask`, leaving others untouched.
    fn write_masked(&self, port: Port, mask: u8, value: u8);

    /// Read one pin.
    fn read_pin(&self, pin: PortPin) -> PinState {
        PinState::from(self.read_masked(pin.port(), pin.mask()) != 0)
    }

    /// Drive one pin.
    fn write_pin(&self, pin: PortPin, state: PinState) {
        let value = match state {
            PinState::High => pin.mask(),
            PinState::Low => 0,
        };
        self.write_masked(pin.port(), pin.mask(), value);
    }
}
