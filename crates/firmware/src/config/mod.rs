//! Persistent configuration: the write-once permanent identity record and
//! the rewritable user record, each in its own flash page.

pub mod checksum;
pub mod record;
pub mod store;

pub use checksum::{checksum, is_erased, is_valid};
pub use record::{IpConfig, IpMode, PermanentConfig, UserConfig};
pub use store::{ConfigError, ConfigStore, FlashFault};
