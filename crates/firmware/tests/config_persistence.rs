//! Configuration persistence integration tests
//!
//! Saves records through the store, hands the same flash to a fresh store
//! (a power cycle), and checks what comes back.
//!
//! Run with: cargo test -p firmware --test config_persistence
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use firmware::config::record::{truncated, PERMANENT_LEN, RECORD_VERSION, USER_LEN};
use firmware::config::{is_erased, is_valid, ConfigError, ConfigStore, IpMode, PermanentConfig, UserConfig};
use platform::flash::{PERMANENT_OFFSET, USER_OFFSET};
use platform::mocks::{MockFlash, MockUserRegisters};

fn power_cycle(store: &mut ConfigStore<MockFlash>) -> ConfigStore<MockFlash> {
    ConfigStore::load(core::mem::take(store.flash_mut()))
}

// ─── User record ─────────────────────────────────────────────────────────────

/// The last saved user record is the one that survives a power cycle.
#[test]
fn test_user_record_last_save_wins() {
    let mut store = ConfigStore::load(MockFlash::new());

    let mut first = UserConfig::default();
    first.ip = [10, 0, 0, 1];
    store.save_user(&first).unwrap();

    let mut second = UserConfig::default();
    second.ip = [10, 0, 0, 2];
    second.ip_mode = IpMode::Dhcp;
    second.notes = truncated("bench unit 7");
    store.save_user(&second).unwrap();

    let reloaded = power_cycle(&mut store);
    assert!(reloaded.user_valid());
    assert_eq!(reloaded.user().ip, [10, 0, 0, 2]);
    assert_eq!(reloaded.user().ip_mode, IpMode::Dhcp);
    assert_eq!(reloaded.user().notes.as_str(), "bench unit 7");
    assert_eq!(reloaded.user().version, RECORD_VERSION);
    assert_eq!(reloaded.user().ip_config().address, 0x0A00_0002);
}

/// Rewriting the user record erases its page first; the permanent page is
/// never touched by user saves.
#[test]
fn test_user_save_does_not_touch_permanent_page() {
    let mut store = ConfigStore::load(MockFlash::new());
    store.save_permanent(&PermanentConfig::default()).unwrap();
    let permanent = store.flash().contents(PERMANENT_OFFSET, PERMANENT_LEN).to_vec();

    store.save_user(&UserConfig::default()).unwrap();
    assert_eq!(store.flash().erase_count(), 0, "blank page needs no erase");
    store.save_user(&UserConfig::default()).unwrap();
    assert_eq!(store.flash().erase_count(), 1);

    assert_eq!(store.flash().contents(PERMANENT_OFFSET, PERMANENT_LEN), &permanent[..]);
    assert!(is_valid(store.flash().contents(USER_OFFSET, USER_LEN)));
}

/// Over-long strings are cut to fit their fields and still checksum.
#[test]
fn test_long_notes_are_truncated() {
    let long = "x".repeat(400);
    let mut record = UserConfig::default();
    record.notes = truncated(&long);
    assert_eq!(record.notes.len(), 255);

    let mut store = ConfigStore::load(MockFlash::new());
    store.save_user(&record).unwrap();
    let reloaded = power_cycle(&mut store);
    assert_eq!(reloaded.user().notes.len(), 255);
}

// ─── Permanent record ────────────────────────────────────────────────────────

/// Programmed once, the permanent record survives power cycles and refuses
/// a second programming.
#[test]
fn test_permanent_record_write_once_across_power_cycle() {
    let mut store = ConfigStore::load(MockFlash::new());
    assert!(store.permanent_erased().unwrap());

    let mut record = PermanentConfig::default();
    record.board_serial_number = truncated("20260101042");
    record.mac = [0xA8, 0xFC, 0xB7, 0x00, 0x01, 0x2A];
    store.save_permanent(&record).unwrap();

    let mut reloaded = power_cycle(&mut store);
    assert!(reloaded.permanent_valid());
    assert_eq!(reloaded.permanent().board_serial_number.as_str(), "20260101042");
    assert_eq!(reloaded.permanent().mac, [0xA8, 0xFC, 0xB7, 0x00, 0x01, 0x2A]);

    assert_eq!(
        reloaded.save_permanent(&PermanentConfig::default()),
        Err(ConfigError::NotErased)
    );
    assert!(!is_erased(reloaded.flash().contents(PERMANENT_OFFSET, PERMANENT_LEN)));
}

/// Unprogrammed flash with programmed factory registers boots with the
/// factory MAC and default identity strings.
#[test]
fn test_blank_board_takes_factory_mac() {
    let otp = MockUserRegisters::new(0x00B7_FCA8, 0x0003_0201);
    let store = ConfigStore::load_with_otp(MockFlash::new(), &otp);
    assert!(!store.permanent_valid());
    assert_eq!(store.permanent().mac, [0xA8, 0xFC, 0xB7, 0x01, 0x02, 0x03]);
    assert_eq!(
        store.permanent().board_part_number,
        PermanentConfig::default().board_part_number
    );
}
