//! Frame construction and response decoding for the ZoneTouch 3 console.
//!
//! Two frame types are spoken. The request-all-information frame is a
//! fixed 14-byte command whose checksum never varies and is baked into the
//! literal; its response (the [`Snapshot`]) carries every system and zone
//! field at fixed byte offsets. The zone-update frame is a 24-byte
//! template with the zone index, power command and percentage substituted
//! at fixed positions and a CRC-16/Modbus checksum written over bytes
//! 4..22 into the last two bytes.
//!
//! The decoder is pure: it takes a caller-owned [`Snapshot`] and never
//! performs I/O, caches, or refreshes. Callers decide when a snapshot is
//! stale and fetch a new one.

use crate::checksum::crc16_hex_pairs;
use crate::hexfield;
use crate::Error;
use std::fmt;

#[cfg(feature = "protocol_serde")]
use serde::{Deserialize, Serialize};

/// TCP port the console listens on.
pub const DEFAULT_PORT: u16 = 7030;

/// Placeholder percentage byte sent with power on/off commands.
///
/// The value is outside the valid 0-100 range; the console ignores the
/// percentage field for power command codes and deployed firmware has
/// always been sent this byte, so it is kept for wire compatibility
/// (see DESIGN.md).
pub const POWER_TOGGLE_PERCENTAGE: u8 = 150;

/// A text field of the snapshot: byte offset plus byte length,
/// NUL-padded ASCII on the wire.
#[derive(Debug, Clone, Copy)]
struct TextField {
    offset: usize,
    length: usize,
}

impl TextField {
    fn decode(self, snapshot: &str) -> Result<String, Error> {
        hexfield::to_ascii(hexfield::extract(snapshot, self.offset, self.length)?)
    }
}

/// An unsigned big-endian integer field of the snapshot.
#[derive(Debug, Clone, Copy)]
struct UintField {
    offset: usize,
    length: usize,
}

impl UintField {
    fn decode(self, snapshot: &str) -> Result<u64, Error> {
        hexfield::to_int(hexfield::extract(snapshot, self.offset, self.length)?)
    }
}

const SYSTEM_ID: TextField = TextField {
    offset: 12,
    length: 8,
};
const SYSTEM_NAME: TextField = TextField {
    offset: 20,
    length: 16,
};
const SYSTEM_INSTALLER: TextField = TextField {
    offset: 46,
    length: 10,
};
const INSTALLER_NUMBER: TextField = TextField {
    offset: 56,
    length: 12,
};
const CONSOLE_RAW_TEMPERATURE: UintField = UintField {
    offset: 68,
    length: 2,
};
const FIRMWARE_VERSION: TextField = TextField {
    offset: 79,
    length: 7,
};
const CONSOLE_VERSION: TextField = TextField {
    offset: 95,
    length: 7,
};

// Zone records start at byte 123 and repeat every 22 bytes.
const ZONE_RECORD_BASE: usize = 123;
const ZONE_RECORD_STRIDE: usize = 22;
const ZONE_NAME_OFFSET: usize = 10;
const ZONE_NAME_LENGTH: usize = 12;

fn zone_state_field(zone: u8) -> UintField {
    UintField {
        offset: ZONE_RECORD_BASE + ZONE_RECORD_STRIDE * usize::from(zone),
        length: 1,
    }
}

fn zone_percentage_field(zone: u8) -> UintField {
    UintField {
        offset: ZONE_RECORD_BASE + 1 + ZONE_RECORD_STRIDE * usize::from(zone),
        length: 1,
    }
}

fn zone_name_field(zone: u8) -> TextField {
    TextField {
        offset: ZONE_RECORD_BASE + ZONE_NAME_OFFSET + ZONE_RECORD_STRIDE * usize::from(zone),
        length: ZONE_NAME_LENGTH,
    }
}

/// The fixed "request all information" command.
///
/// No field varies between calls, so the trailing checksum (`CB 8C` over
/// bytes 4..12) is part of the literal. Sending this frame is the only
/// way to obtain a [`Snapshot`].
pub struct AllInformation;

impl AllInformation {
    pub fn request() -> Vec<u8> {
        vec![
            0x55, 0x55, 0x55, 0xAA, 0x90, 0xB0, 0x01, 0x1F, 0x00, 0x02, 0xFF, 0xF0, 0xCB, 0x8C,
        ]
    }
}

/// Power state of a zone, from the top two bits of its state byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "protocol_serde", derive(Serialize, Deserialize))]
pub enum ZonePower {
    Off,
    On,
    Turbo,
    /// Bit pattern `10`, not produced by known firmware. Reported as-is
    /// but treated as not running.
    Unknown,
}

impl ZonePower {
    pub fn from_state_byte(byte: u8) -> Self {
        match byte >> 6 {
            0b00 => ZonePower::Off,
            0b01 => ZonePower::On,
            0b11 => ZonePower::Turbo,
            _ => ZonePower::Unknown,
        }
    }

    /// Whether the zone damper is driven (On or Turbo).
    pub fn is_on(self) -> bool {
        matches!(self, ZonePower::On | ZonePower::Turbo)
    }
}

impl fmt::Display for ZonePower {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ZonePower::Off => write!(f, "off"),
            ZonePower::On => write!(f, "on"),
            ZonePower::Turbo => write!(f, "turbo"),
            ZonePower::Unknown => write!(f, "unknown"),
        }
    }
}

/// One response to the request-all-information exchange, as upper-case
/// hex. Owned by the caller; every decode below is a pure function of
/// this buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "protocol_serde", derive(Serialize, Deserialize))]
pub struct Snapshot(String);

impl Snapshot {
    pub fn new(response_hex: String) -> Self {
        Self(response_hex)
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.0.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn system_id(&self) -> Result<String, Error> {
        SYSTEM_ID.decode(&self.0)
    }

    pub fn system_name(&self) -> Result<String, Error> {
        SYSTEM_NAME.decode(&self.0)
    }

    pub fn system_installer(&self) -> Result<String, Error> {
        SYSTEM_INSTALLER.decode(&self.0)
    }

    pub fn installer_number(&self) -> Result<String, Error> {
        INSTALLER_NUMBER.decode(&self.0)
    }

    pub fn firmware_version(&self) -> Result<String, Error> {
        FIRMWARE_VERSION.decode(&self.0)
    }

    pub fn console_version(&self) -> Result<String, Error> {
        CONSOLE_VERSION.decode(&self.0)
    }

    /// Console temperature in degrees Celsius.
    ///
    /// The console reports `(celsius * 10) + 500`; the reverse mapping
    /// uses ceiling division, so raw 650 is 15 and raw 655 is 16.
    pub fn console_temperature(&self) -> Result<i32, Error> {
        let raw = CONSOLE_RAW_TEMPERATURE.decode(&self.0)? as i32;
        // `i32::div_ceil` is unstable; this is the equivalent ceiling division.
        let delta = raw - 500;
        Ok(delta / 10 + i32::from(delta % 10 > 0))
    }

    pub fn zone_power(&self, zone: u8) -> Result<ZonePower, Error> {
        let byte = zone_state_field(zone).decode(&self.0)? as u8;
        Ok(ZonePower::from_state_byte(byte))
    }

    /// Damper open percentage of a zone, 0-100.
    pub fn zone_percentage(&self, zone: u8) -> Result<u8, Error> {
        Ok(zone_percentage_field(zone).decode(&self.0)? as u8)
    }

    pub fn zone_name(&self, zone: u8) -> Result<String, Error> {
        zone_name_field(zone).decode(&self.0)
    }
}

/// System metadata decoded from one snapshot.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "protocol_serde", derive(Serialize, Deserialize))]
pub struct SystemInfo {
    pub id: String,
    pub name: String,
    pub installer: String,
    pub installer_number: String,
    pub firmware_version: String,
    pub console_version: String,
    pub temperature: i32,
}

impl SystemInfo {
    pub fn decode(snapshot: &Snapshot) -> Result<Self, Error> {
        Ok(Self {
            id: snapshot.system_id()?,
            name: snapshot.system_name()?,
            installer: snapshot.system_installer()?,
            installer_number: snapshot.installer_number()?,
            firmware_version: snapshot.firmware_version()?,
            console_version: snapshot.console_version()?,
            temperature: snapshot.console_temperature()?,
        })
    }
}

/// Name, power state and damper percentage of one zone.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "protocol_serde", derive(Serialize, Deserialize))]
pub struct ZoneStatus {
    pub zone: u8,
    pub name: String,
    pub power: ZonePower,
    pub percentage: u8,
}

impl ZoneStatus {
    pub fn decode(snapshot: &Snapshot, zone: u8) -> Result<Self, Error> {
        Ok(Self {
            zone,
            name: snapshot.zone_name(zone)?,
            power: snapshot.zone_power(zone)?,
            percentage: snapshot.zone_percentage(zone)?,
        })
    }
}

/// Command code carried at byte 19 of the zone-update frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PowerCommand {
    Off = 0x02,
    On = 0x03,
    SetPercentage = 0x80,
}

const ZONE_UPDATE_TEMPLATE: [u8; 24] = [
    0x55, 0x55, 0x55, 0xAA, 0x80, 0xB0, 0x0F, 0xC0, 0x00, 0x0C, 0x20, 0x00, 0x00, 0x00, 0x00,
    0x04, 0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00,
];
const ZONE_OFFSET: usize = 18;
const POWER_OFFSET: usize = 19;
const PERCENTAGE_OFFSET: usize = 20;
const CHECKSUM_OFFSET: usize = 22;

/// The zone-update command frame.
pub struct ZoneUpdate;

impl ZoneUpdate {
    /// Assembles the 24-byte update frame for `zone` with the checksum
    /// applied. The console acknowledges the frame but the reply carries
    /// nothing a caller needs; it is read and discarded by the client.
    pub fn request(zone: u8, command: PowerCommand, percentage: u8) -> Result<Vec<u8>, Error> {
        if command == PowerCommand::SetPercentage && percentage > 100 {
            return Err(Error::InvalidArgument(format!(
                "percentage {percentage} exceeds 100"
            )));
        }
        let mut frame = ZONE_UPDATE_TEMPLATE.to_vec();
        frame[ZONE_OFFSET] = zone;
        frame[POWER_OFFSET] = command as u8;
        frame[PERCENTAGE_OFFSET] = percentage;
        let crc = crc16_hex_pairs(&frame[4..CHECKSUM_OFFSET]);
        frame[CHECKSUM_OFFSET] = crc[0];
        frame[CHECKSUM_OFFSET + 1] = crc[1];
        Ok(frame)
    }
}

/// The older per-zone retrieval codec.
///
/// Early console firmware was polled with a dedicated zone-state request
/// and answered with 8-byte zone records: power in the top two bits of
/// record byte 0, percentage in the low seven bits of record byte 1.
/// Kept as an alternate codec selected by client configuration; it never
/// mixes with the snapshot path above.
pub mod legacy {
    use super::ZonePower;
    use crate::hexfield;
    use crate::Error;

    const ZONE_RECORD_BASE: usize = 18;
    const ZONE_RECORD_STRIDE: usize = 8;

    /// The fixed per-zone state request (checksum `A4 31` baked in).
    pub struct ZoneState;

    impl ZoneState {
        pub fn request() -> Vec<u8> {
            vec![
                0x55, 0x55, 0x55, 0xAA, 0x80, 0xB0, 0x01, 0xC0, 0x00, 0x08, 0x21, 0x00, 0x00,
                0x00, 0x00, 0x00, 0x00, 0x00, 0xA4, 0x31,
            ]
        }
    }

    fn record(response_hex: &str, zone: u8) -> Result<&str, Error> {
        hexfield::extract(
            response_hex,
            ZONE_RECORD_BASE + ZONE_RECORD_STRIDE * usize::from(zone),
            ZONE_RECORD_STRIDE,
        )
    }

    pub fn zone_power(response_hex: &str, zone: u8) -> Result<ZonePower, Error> {
        let byte = hexfield::to_int(hexfield::extract(record(response_hex, zone)?, 0, 1)?)? as u8;
        Ok(ZonePower::from_state_byte(byte))
    }

    pub fn zone_percentage(response_hex: &str, zone: u8) -> Result<u8, Error> {
        let byte = hexfield::to_int(hexfield::extract(record(response_hex, zone)?, 1, 1)?)? as u8;
        Ok(byte & 0x7F)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(bytes: &mut [u8], offset: usize, text: &str) {
        bytes[offset..offset + text.len()].copy_from_slice(text.as_bytes());
    }

    fn sample_snapshot() -> Snapshot {
        let mut bytes = vec![0u8; 320];
        put(&mut bytes, 12, "ZT3A1234");
        put(&mut bytes, 20, "Holiday House");
        put(&mut bytes, 46, "AirCo Pty");
        put(&mut bytes, 56, "0400123456");
        // Raw temperature 650 -> 15 degrees.
        bytes[68] = 0x02;
        bytes[69] = 0x8A;
        put(&mut bytes, 79, "1.0.5");
        put(&mut bytes, 95, "3.1.0");
        // Zone 0: on, 100%, "Living".
        bytes[123] = 0x40;
        bytes[124] = 100;
        put(&mut bytes, 133, "Living");
        // Zone 1: turbo, 50%, "Kitchen".
        bytes[145] = 0xC0;
        bytes[146] = 50;
        put(&mut bytes, 155, "Kitchen");
        // Zone 2: off, 0%.
        bytes[167] = 0x00;
        bytes[168] = 0;
        put(&mut bytes, 177, "Bed 1");
        // Zone 3: unmapped bit pattern `10`.
        bytes[189] = 0x80;
        bytes[190] = 25;
        put(&mut bytes, 199, "Bed 2");
        Snapshot::new(hexfield::encode_upper(&bytes))
    }

    #[test]
    fn system_fields() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.system_id().unwrap(), "ZT3A1234");
        assert_eq!(snapshot.system_name().unwrap(), "Holiday House");
        assert_eq!(snapshot.system_installer().unwrap(), "AirCo Pty");
        assert_eq!(snapshot.installer_number().unwrap(), "0400123456");
        assert_eq!(snapshot.firmware_version().unwrap(), "1.0.5");
        assert_eq!(snapshot.console_version().unwrap(), "3.1.0");
    }

    #[test]
    fn temperature_uses_ceiling_division() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.console_temperature().unwrap(), 15);

        // Raw 655 rounds up to 16.
        let mut bytes = hexfield::decode(snapshot.as_hex()).unwrap();
        bytes[68] = 0x02;
        bytes[69] = 0x8F;
        let snapshot = Snapshot::new(hexfield::encode_upper(&bytes));
        assert_eq!(snapshot.console_temperature().unwrap(), 16);
    }

    #[test]
    fn zone_power_bit_mapping() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.zone_power(0).unwrap(), ZonePower::On);
        assert_eq!(snapshot.zone_power(1).unwrap(), ZonePower::Turbo);
        assert_eq!(snapshot.zone_power(2).unwrap(), ZonePower::Off);
        assert_eq!(snapshot.zone_power(3).unwrap(), ZonePower::Unknown);
        assert!(!snapshot.zone_power(3).unwrap().is_on());
    }

    #[test]
    fn zone_fields() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.zone_percentage(0).unwrap(), 100);
        assert_eq!(snapshot.zone_percentage(1).unwrap(), 50);
        assert_eq!(snapshot.zone_name(0).unwrap(), "Living");
        assert_eq!(snapshot.zone_name(1).unwrap(), "Kitchen");
        let status = ZoneStatus::decode(&snapshot, 1).unwrap();
        assert_eq!(status.name, "Kitchen");
        assert_eq!(status.power, ZonePower::Turbo);
        assert_eq!(status.percentage, 50);
    }

    #[test]
    fn zone_index_out_of_range() {
        let snapshot = sample_snapshot();
        assert!(matches!(
            snapshot.zone_power(50),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(
            snapshot.zone_name(50),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn decoding_is_idempotent() {
        let snapshot = sample_snapshot();
        assert_eq!(
            snapshot.system_name().unwrap(),
            snapshot.system_name().unwrap()
        );
        assert_eq!(
            snapshot.zone_percentage(1).unwrap(),
            snapshot.zone_percentage(1).unwrap()
        );
    }

    #[test]
    fn update_frame_round_trip() {
        let frame = ZoneUpdate::request(3, PowerCommand::On, 50).unwrap();
        assert_eq!(frame.len(), 24);
        assert_eq!(&frame[18..21], &[0x03, 0x03, 0x32]);
        // The checksum pairs land big-endian-first at bytes 22 and 23.
        assert_eq!(&frame[22..], &[0x18, 0xA5]);
        // And the same bytes are visible through the hex extractor.
        let hex = hexfield::encode_upper(&frame);
        assert_eq!(hexfield::extract(&hex, 18, 3).unwrap(), "030332");
    }

    #[test]
    fn update_frame_rejects_invalid_percentage() {
        assert!(matches!(
            ZoneUpdate::request(0, PowerCommand::SetPercentage, 101),
            Err(Error::InvalidArgument(_))
        ));
        assert!(ZoneUpdate::request(0, PowerCommand::SetPercentage, 100).is_ok());
        // Power toggles carry the out-of-range placeholder byte.
        let frame = ZoneUpdate::request(0, PowerCommand::Off, POWER_TOGGLE_PERCENTAGE).unwrap();
        assert_eq!(frame[20], 150);
    }

    #[test]
    fn legacy_record_decode() {
        let mut bytes = vec![0u8; 18 + 8 * 5 + 2];
        // Zone 0: on, 100%. Zone 1: turbo with the percentage high bit set.
        bytes[18] = 0x40;
        bytes[19] = 100;
        bytes[26] = 0xC0;
        bytes[27] = 0x80 | 50;
        let hex = hexfield::encode_upper(&bytes);
        assert_eq!(legacy::zone_power(&hex, 0).unwrap(), ZonePower::On);
        assert_eq!(legacy::zone_percentage(&hex, 0).unwrap(), 100);
        assert_eq!(legacy::zone_power(&hex, 1).unwrap(), ZonePower::Turbo);
        assert_eq!(legacy::zone_percentage(&hex, 1).unwrap(), 50);
        assert!(matches!(
            legacy::zone_percentage(&hex, 9),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn all_information_request_is_fixed() {
        let frame = AllInformation::request();
        assert_eq!(frame.len(), 14);
        assert_eq!(&frame[..4], &[0x55, 0x55, 0x55, 0xAA]);
        // Baked checksum matches the engine over the frame body.
        assert_eq!(
            &frame[12..],
            &crate::checksum::crc16_hex_pairs(&frame[4..12])
        );
    }
}
