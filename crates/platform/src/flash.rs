//! On-chip flash layout and one-time-programmable user registers
//!
//! The part has 256 KiB of NOR flash erased in 1 KiB pages. Erase sets every
//! bit to 1; programming can only clear bits. Configuration records live in
//! the last two pages:
//!
//! ```text
//! 0x3F800 ┌───────────────────────┐
//!         │ user record page      │  rewritable
//! 0x3FC00 ├───────────────────────┤
//!         │ permanent record page │  write-once
//! 0x40000 └───────────────────────┘
//! ```
//!
//! The firmware talks to flash through [`embedded_storage::nor_flash`], which
//! expresses exactly these erase/program semantics.

pub use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};

/// Total flash size in bytes.
pub const FLASH_CAPACITY: usize = 0x4_0000;

/// Erase granularity in bytes.
pub const PAGE_SIZE: usize = 1_024;

/// Program granularity in bytes (one 32-bit word).
pub const WORD_SIZE: usize = 4;

/// Flash offset of the write-once permanent configuration page.
pub const PERMANENT_OFFSET: u32 = 0x3_FC00;

/// Flash offset of the rewritable user configuration page.
pub const USER_OFFSET: u32 = 0x3_F800;

/// Value of an erased flash word.
pub const ERASED_WORD: u32 = 0xFFFF_FFFF;

/// The two factory-programmed user registers (USER0/USER1).
///
/// The factory stores the board MAC address here, three bytes per register
/// in the low 24 bits. Unprogrammed registers read all-ones.
pub trait UserRegisters {
    /// Current values of USER0 and USER1.
    fn user_registers(&self) -> [u32; 2];

    /// MAC address held in the registers, if both are programmed.
    fn mac_address(&self) -> Option<[u8; 6]> {
        let [user0, user1] = self.user_registers();
        if user0 == ERASED_WORD || user1 == ERASED_WORD {
            return None;
        }
        let lo = user0.to_le_bytes();
        let hi = user1.to_le_bytes();
        Some([lo[0], lo[1], lo[2], hi[0], hi[1], hi[2]])
    }
}
