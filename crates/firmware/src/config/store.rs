//! Flash-backed configuration store.
//!
//! Holds the working copy of both records plus their validity as found in
//! flash. The permanent record is write-once: it is programmed only onto an
//! erased page and is otherwise refused. The user record is erased and
//! reprogrammed on every save.

use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind};
use platform::flash::{UserRegisters, PAGE_SIZE, PERMANENT_OFFSET, USER_OFFSET};

use super::checksum::{is_erased, is_valid};
use super::record::{PermanentConfig, UserConfig, PERMANENT_LEN, RECORD_VERSION, USER_LEN};

/// Flash failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashFault {
    /// Offset or length not aligned to the program/erase unit.
    NotAligned,
    /// Range outside the part.
    OutOfBounds,
    /// Anything else the driver reports.
    Other,
}

fn flash_fault<E: NorFlashError>(e: E) -> ConfigError {
    ConfigError::Flash(match e.kind() {
        NorFlashErrorKind::NotAligned => FlashFault::NotAligned,
        NorFlashErrorKind::OutOfBounds => FlashFault::OutOfBounds,
        _ => FlashFault::Other,
    })
}

/// Configuration save failures. The working copy is unchanged on error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The permanent page already holds data.
    #[error("permanent configuration page is not erased")]
    NotErased,
    /// The record read back from flash does not checksum.
    #[error("configuration record failed verification after programming")]
    VerifyFailed,
    /// The flash driver reported an error.
    #[error("flash operation failed: {0:?}")]
    Flash(FlashFault),
}

/// Configuration records and the flash they live in.
pub struct ConfigStore<F> {
    flash: F,
    permanent: PermanentConfig,
    user: UserConfig,
    permanent_valid: bool,
    user_valid: bool,
}

impl<F: NorFlash> ConfigStore<F> {
    /// Load both records, falling back to defaults for any that are invalid.
    pub fn load(flash: F) -> Self {
        Self::load_inner(flash, None)
    }

    /// Like [`load`](Self::load), but seeds the default MAC address from the
    /// factory user registers when they are programmed.
    pub fn load_with_otp<U: UserRegisters + ?Sized>(flash: F, otp: &U) -> Self {
        Self::load_inner(flash, otp.mac_address())
    }

    fn load_inner(mut flash: F, otp_mac: Option<[u8; 6]>) -> Self {
        let stored = read_record::<_, PERMANENT_LEN>(&mut flash, PERMANENT_OFFSET);
        let (permanent, permanent_valid) = match stored {
            Some(bytes) if is_valid(&bytes) => (PermanentConfig::decode(&bytes), true),
            _ => {
                warn!("permanent configuration invalid, using defaults");
                let mut record = PermanentConfig::default();
                if let Some(mac) = otp_mac {
                    record.mac = mac;
                }
                (record, false)
            }
        };

        let stored = read_record::<_, USER_LEN>(&mut flash, USER_OFFSET);
        let (user, user_valid) = match stored {
            Some(bytes) if is_valid(&bytes) => (UserConfig::decode(&bytes), true),
            _ => {
                warn!("user configuration invalid, using defaults");
                (UserConfig::default(), false)
            }
        };

        info!(
            "configuration loaded (permanent {}, user {})",
            u8::from(permanent_valid),
            u8::from(user_valid)
        );

        Self {
            flash,
            permanent,
            user,
            permanent_valid,
            user_valid,
        }
    }

    /// Working copy of the permanent record.
    pub fn permanent(&self) -> &PermanentConfig {
        &self.permanent
    }

    /// Working copy of the user record.
    pub fn user(&self) -> &UserConfig {
        &self.user
    }

    /// Whether the permanent record in flash checksummed at last load/save.
    pub fn permanent_valid(&self) -> bool {
        self.permanent_valid
    }

    /// Whether the user record in flash checksummed at last load/save.
    pub fn user_valid(&self) -> bool {
        self.user_valid
    }

    /// Whether the permanent page is still unprogrammed, i.e. whether
    /// [`save_permanent`](Self::save_permanent) would be accepted.
    pub fn permanent_erased(&mut self) -> Result<bool, ConfigError> {
        let mut bytes = [0u8; PERMANENT_LEN];
        self.flash
            .read(PERMANENT_OFFSET, &mut bytes)
            .map_err(flash_fault)?;
        Ok(is_erased(&bytes))
    }

    /// The flash device.
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// The flash device, mutably.
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Program the write-once permanent record.
    ///
    /// Refused with [`ConfigError::NotErased`] unless the page is erased, in
    /// which case flash is not touched.
    pub fn save_permanent(&mut self, record: &PermanentConfig) -> Result<(), ConfigError> {
        if !self.permanent_erased()? {
            warn!("refusing to overwrite permanent configuration");
            return Err(ConfigError::NotErased);
        }

        let mut record = record.clone();
        record.version = RECORD_VERSION;
        let encoded = record.encode();
        self.flash
            .write(PERMANENT_OFFSET, &encoded)
            .map_err(flash_fault)?;

        let readback = read_record::<_, PERMANENT_LEN>(&mut self.flash, PERMANENT_OFFSET);
        self.permanent_valid = readback.is_some_and(|bytes| is_valid(&bytes));
        if !self.permanent_valid {
            error!("permanent configuration failed verification");
            return Err(ConfigError::VerifyFailed);
        }
        self.permanent = record;
        info!("permanent configuration saved");
        Ok(())
    }

    /// Erase and reprogram the user record.
    pub fn save_user(&mut self, record: &UserConfig) -> Result<(), ConfigError> {
        let mut current = [0u8; USER_LEN];
        self.flash
            .read(USER_OFFSET, &mut current)
            .map_err(flash_fault)?;
        if !is_erased(&current) {
            erase_page(&mut self.flash, USER_OFFSET)?;
        }

        let mut record = record.clone();
        record.version = RECORD_VERSION;
        let encoded = record.encode();
        self.flash
            .write(USER_OFFSET, &encoded)
            .map_err(flash_fault)?;

        let readback = read_record::<_, USER_LEN>(&mut self.flash, USER_OFFSET);
        self.user_valid = readback.is_some_and(|bytes| is_valid(&bytes));
        if !self.user_valid {
            error!("user configuration failed verification");
            return Err(ConfigError::VerifyFailed);
        }
        self.user = record;
        info!("user configuration saved");
        Ok(())
    }

    /// Factory re-provisioning: erase the permanent page so it can be
    /// programmed again. Returns whether the page now reads erased. The
    /// working copy is kept.
    pub fn erase_permanent(&mut self) -> Result<bool, ConfigError> {
        warn!("erasing permanent configuration");
        erase_page(&mut self.flash, PERMANENT_OFFSET)?;
        self.permanent_valid = false;
        self.permanent_erased()
    }
}

fn read_record<F: NorFlash, const N: usize>(flash: &mut F, offset: u32) -> Option<[u8; N]> {
    let mut bytes = [0u8; N];
    flash.read(offset, &mut bytes).ok()?;
    Some(bytes)
}

fn erase_page<F: NorFlash>(flash: &mut F, offset: u32) -> Result<(), ConfigError> {
    let end = offset
        .checked_add(PAGE_SIZE as u32)
        .ok_or(ConfigError::Flash(FlashFault::OutOfBounds))?;
    flash.erase(offset, end).map_err(flash_fault)
}
