//! Configuration record layouts.
//!
//! Both records are packed little-endian with natural 4-byte alignment:
//!
//! ```text
//! Permanent (148 bytes)            User (412 bytes)
//! ┌──────────┬─────┐               ┌───────────┬─────┐
//! │ length   │ i32 │               │ length    │ i32 │
//! │ version  │ i32 │               │ version   │ i32 │
//! │ bd_pn    │ 64  │               │ assy_pn   │ 64  │
//! │ bd_sn    │ 64  │               │ assy_sn   │ 64  │
//! │ mac      │ 8   │ (6 used)      │ ip        │ 4   │
//! │ checksum │ i32 │               │ netmask   │ 4   │
//! └──────────┴─────┘               │ gateway   │ 4   │
//!                                  │ ip mode   │ u32 │
//!                                  │ notes     │ 256 │
//!                                  │ checksum  │ i32 │
//!                                  └───────────┴─────┘
//! ```
//!
//! Text fields are NUL-padded byte strings. One byte is always left for the
//! terminator, so a 64-byte field holds at most 63 characters.

use heapless::String;

use super::checksum::seal;

/// Encoded size of [`PermanentConfig`].
pub const PERMANENT_LEN: usize = 148;

/// Encoded size of [`UserConfig`].
pub const USER_LEN: usize = 412;

/// Version word written on every save.
pub const RECORD_VERSION: i32 = -1;

/// Width of part and serial number fields.
pub const ID_FIELD_LEN: usize = 64;

/// Width of the notes field.
pub const NOTES_FIELD_LEN: usize = 256;

/// Part or serial number text.
pub type IdString = String<63>;

/// Free-form notes text.
pub type NotesString = String<255>;

// ── Field codec ──────────────────────────────────────────────────────────────

struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn bytes(&mut self, bytes: &[u8]) {
        let end = self.pos.saturating_add(bytes.len());
        if let Some(dst) = self.buf.get_mut(self.pos..end) {
            dst.copy_from_slice(bytes);
        }
        self.pos = end;
    }

    fn i32(&mut self, value: i32) {
        self.bytes(&value.to_le_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.bytes(&value.to_le_bytes());
    }

    /// Text padded with NULs to `width`.
    fn text(&mut self, text: &str, width: usize) {
        let end = self.pos.saturating_add(width);
        if let Some(dst) = self.buf.get_mut(self.pos..end) {
            dst.fill(0);
            let len = text.len().min(width.saturating_sub(1));
            if let (Some(d), Some(s)) = (dst.get_mut(..len), text.as_bytes().get(..len)) {
                d.copy_from_slice(s);
            }
        }
        self.pos = end;
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let end = self.pos.saturating_add(N);
        let out = self
            .buf
            .get(self.pos..end)
            .and_then(|s| <[u8; N]>::try_from(s).ok())
            .unwrap_or([0; N]);
        self.pos = end;
        out
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.array())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }

    /// Text up to the first NUL, truncated at the first invalid UTF-8 byte.
    fn text<const CAP: usize>(&mut self, width: usize) -> String<CAP> {
        let end = self.pos.saturating_add(width);
        let field = self.buf.get(self.pos..end).unwrap_or(&[]);
        self.pos = end;

        let field = field.split(|b| *b == 0).next().unwrap_or(&[]);
        let valid = match core::str::from_utf8(field) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(field.get(..e.valid_up_to()).unwrap_or(&[])).unwrap_or(""),
        };
        truncated(valid)
    }
}

/// Copy as much of `s` as fits, on a char boundary.
pub fn truncated<const CAP: usize>(s: &str) -> String<CAP> {
    let mut out = String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

// ── IP configuration ─────────────────────────────────────────────────────────

/// How the network stack obtains its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IpMode {
    /// Use the stored address, netmask and gateway.
    #[default]
    Static,
    /// Ask a DHCP server.
    Dhcp,
    /// Link-local auto-configuration.
    AutoIp,
}

impl IpMode {
    /// Stored encoding.
    pub const fn as_raw(self) -> u32 {
        match self {
            IpMode::Static => 0,
            IpMode::Dhcp => 1,
            IpMode::AutoIp => 2,
        }
    }

    /// Decode the stored word.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(IpMode::Static),
            1 => Some(IpMode::Dhcp),
            2 => Some(IpMode::AutoIp),
            _ => None,
        }
    }
}

/// Network settings as the network stack consumes them: addresses packed
/// most significant octet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IpConfig {
    /// Interface address.
    pub address: u32,
    /// Subnet mask.
    pub netmask: u32,
    /// Default gateway.
    pub gateway: u32,
    /// Addressing mode.
    pub mode: IpMode,
}

/// Pack a dotted quad: `a.b.c.d` → `a<<24 | b<<16 | c<<8 | d`.
pub const fn ip_to_u32(octets: [u8; 4]) -> u32 {
    u32::from_be_bytes(octets)
}

// ── Permanent record ─────────────────────────────────────────────────────────

/// Factory identity: board part/serial number and MAC address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermanentConfig {
    /// Layout version word.
    pub version: i32,
    /// Board part number.
    pub board_part_number: IdString,
    /// Board serial number.
    pub board_serial_number: IdString,
    /// Ethernet MAC address.
    pub mac: [u8; 6],
}

impl Default for PermanentConfig {
    fn default() -> Self {
        Self {
            version: RECORD_VERSION,
            board_part_number: truncated("8A7W5 100569-001 Rev x1"),
            board_serial_number: truncated("20110214001"),
            mac: [0xA8, 0xFC, 0xB7, 0x00, 0x00, 0x00],
        }
    }
}

impl PermanentConfig {
    /// Serialize with a fresh length word and checksum.
    pub fn encode(&self) -> [u8; PERMANENT_LEN] {
        let mut buf = [0u8; PERMANENT_LEN];
        let mut w = Writer::new(&mut buf);
        w.i32(PERMANENT_LEN as i32);
        w.i32(self.version);
        w.text(&self.board_part_number, ID_FIELD_LEN);
        w.text(&self.board_serial_number, ID_FIELD_LEN);
        w.bytes(&self.mac);
        w.bytes(&[0, 0]);
        seal(&mut buf, PERMANENT_LEN.saturating_sub(4));
        buf
    }

    /// Deserialize without validating; see [`super::checksum::is_valid`].
    pub fn decode(buf: &[u8; PERMANENT_LEN]) -> Self {
        let mut r = Reader::new(buf);
        let _length = r.i32();
        let version = r.i32();
        let board_part_number = r.text(ID_FIELD_LEN);
        let board_serial_number = r.text(ID_FIELD_LEN);
        let mac: [u8; 8] = r.array();
        let [m0, m1, m2, m3, m4, m5, _, _] = mac;
        Self {
            version,
            board_part_number,
            board_serial_number,
            mac: [m0, m1, m2, m3, m4, m5],
        }
    }
}

// ── User record ──────────────────────────────────────────────────────────────

/// Field-editable assembly identity and network settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserConfig {
    /// Layout version word.
    pub version: i32,
    /// Assembly part number.
    pub assembly_part_number: IdString,
    /// Assembly serial number.
    pub assembly_serial_number: IdString,
    /// Static IP address.
    pub ip: [u8; 4],
    /// Static netmask.
    pub netmask: [u8; 4],
    /// Static gateway.
    pub gateway: [u8; 4],
    /// Addressing mode.
    pub ip_mode: IpMode,
    /// Free-form notes.
    pub notes: NotesString,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            version: 1,
            assembly_part_number: truncated("8A7W5 100xxx-001 Rev x1"),
            assembly_serial_number: truncated("2011mmdd001"),
            ip: [192, 168, 8, 199],
            netmask: [255, 255, 255, 0],
            gateway: [192, 168, 8, 1],
            ip_mode: IpMode::Static,
            notes: NotesString::new(),
        }
    }
}

impl UserConfig {
    /// Serialize with a fresh length word and checksum.
    pub fn encode(&self) -> [u8; USER_LEN] {
        let mut buf = [0u8; USER_LEN];
        let mut w = Writer::new(&mut buf);
        w.i32(USER_LEN as i32);
        w.i32(self.version);
        w.text(&self.assembly_part_number, ID_FIELD_LEN);
        w.text(&self.assembly_serial_number, ID_FIELD_LEN);
        w.bytes(&self.ip);
        w.bytes(&self.netmask);
        w.bytes(&self.gateway);
        w.u32(self.ip_mode.as_raw());
        w.text(&self.notes, NOTES_FIELD_LEN);
        seal(&mut buf, USER_LEN.saturating_sub(4));
        buf
    }

    /// Deserialize without validating. An unknown IP mode decodes as
    /// [`IpMode::Static`].
    pub fn decode(buf: &[u8; USER_LEN]) -> Self {
        let mut r = Reader::new(buf);
        let _length = r.i32();
        let version = r.i32();
        let assembly_part_number = r.text(ID_FIELD_LEN);
        let assembly_serial_number = r.text(ID_FIELD_LEN);
        let ip = r.array();
        let netmask = r.array();
        let gateway = r.array();
        let ip_mode = IpMode::from_raw(r.u32()).unwrap_or_default();
        let notes = r.text(NOTES_FIELD_LEN);
        Self {
            version,
            assembly_part_number,
            assembly_serial_number,
            ip,
            netmask,
            gateway,
            ip_mode,
            notes,
        }
    }

    /// Network view of this record.
    pub fn ip_config(&self) -> IpConfig {
        IpConfig {
            address: ip_to_u32(self.ip),
            netmask: ip_to_u32(self.netmask),
            gateway: ip_to_u32(self.gateway),
            mode: self.ip_mode,
        }
    }
}
