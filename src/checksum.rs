//! CRC-16/Modbus as spoken by the ZoneTouch 3 console.
//!
//! The algorithm is the textbook Modbus CRC (init 0xFFFF, reflected
//! polynomial 0xA001), but the console deviates from the Modbus wire
//! convention when placing the result: instead of transmitting the CRC
//! low-byte-first, command frames carry the two hex pairs of the
//! big-endian rendering in consecutive byte positions, high-order pair
//! first. [`crc16_hex_pairs`] reproduces that placement exactly.

const POLY: u16 = 0xA001;
const INIT: u16 = 0xFFFF;

/// Computes the CRC-16/Modbus checksum over `data`.
pub fn crc16_modbus(data: &[u8]) -> u16 {
    let mut crc = INIT;
    for byte in data {
        crc ^= u16::from(*byte);
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Returns the checksum as the two frame bytes in console order:
/// high-order byte first, despite the Modbus convention.
pub fn crc16_hex_pairs(data: &[u8]) -> [u8; 2] {
    crc16_modbus(data).to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_modbus_vector() {
        // The standard CRC-16/MODBUS check value for ASCII "123456789".
        assert_eq!(crc16_modbus(b"123456789"), 0x4B37);
    }

    #[test]
    fn zero_bytes() {
        assert_eq!(crc16_modbus(&[0x00, 0x00]), 0xB001);
    }

    #[test]
    fn frame_byte_order_is_big_endian() {
        assert_eq!(crc16_hex_pairs(b"123456789"), [0x4B, 0x37]);
    }

    #[test]
    fn matches_baked_request_checksum() {
        // The fixed request-all-information frame carries CB 8C over its
        // body bytes 4..12.
        let body = [0x90, 0xB0, 0x01, 0x1F, 0x00, 0x02, 0xFF, 0xF0];
        assert_eq!(crc16_hex_pairs(&body), [0xCB, 0x8C]);
    }
}
