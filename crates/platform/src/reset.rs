//! Reset-cause register.
//!
//! The system controller latches why the part last came out of reset. The
//! bits accumulate across resets until software clears them, so boot code
//! reads, reports, then clears.

/// Set of latched reset causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetCause(u32);

impl ResetCause {
    /// External reset pin.
    pub const EXTERNAL: Self = Self(0x01);
    /// Power-on reset.
    pub const POWER_ON: Self = Self(0x02);
    /// Brown-out reset.
    pub const BROWN_OUT: Self = Self(0x04);
    /// Watchdog reset.
    pub const WATCHDOG: Self = Self(0x08);
    /// Software-requested reset.
    pub const SOFTWARE: Self = Self(0x10);
    /// LDO regulator out of range.
    pub const LDO: Self = Self(0x20);

    /// Report order and labels, as printed at boot.
    pub const LABELS: [(ResetCause, &'static str); 6] = [
        (Self::LDO, "LDO"),
        (Self::SOFTWARE, "SW"),
        (Self::WATCHDOG, "WDOG"),
        (Self::BROWN_OUT, "Brown-out"),
        (Self::POWER_ON, "Power-on"),
        (Self::EXTERNAL, "External"),
    ];

    /// From the raw register value.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw register value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// No cause latched.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is set here.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Labels of the causes present, in report order.
    pub fn labels(self) -> impl Iterator<Item = &'static str> {
        Self::LABELS
            .into_iter()
            .filter(move |(cause, _)| self.contains(*cause))
            .map(|(_, label)| label)
    }
}

/// Access to the reset-cause register.
pub trait ResetControl {
    /// Currently latched causes.
    fn reset_cause(&self) -> ResetCause;

    /// Clear the given causes.
    fn clear_reset_cause(&mut self, cause: ResetCause);
}
