//! Byte-offset field extraction over hex-encoded buffers.
//!
//! The console transport yields responses as upper-case hex, two
//! characters per byte. All snapshot decoding works against that
//! representation: a field is a byte offset plus a byte length, and this
//! module slices, integer-converts and ASCII-decodes those ranges.

use crate::Error;

/// Encodes raw bytes as upper-case hex, the form the transport returns.
pub fn encode_upper(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // Writing to a String cannot fail.
        let _ = write!(out, "{byte:02X}");
    }
    out
}

/// Decodes a hex buffer back into raw bytes.
pub fn decode(hex: &str) -> Result<Vec<u8>, Error> {
    if hex.len() % 2 != 0 {
        return Err(Error::MalformedField(format!(
            "odd hex buffer length {}",
            hex.len()
        )));
    }
    (0..hex.len() / 2)
        .map(|i| {
            let pair = hex
                .get(i * 2..i * 2 + 2)
                .ok_or_else(|| Error::MalformedField("non-ASCII hex buffer".into()))?;
            u8::from_str_radix(pair, 16)
                .map_err(|_| Error::MalformedField(format!("invalid hex pair {pair:?}")))
        })
        .collect()
}

/// Returns the hex pairs for bytes `[offset, offset + length)` of `buffer`.
///
/// Fails with [`Error::OutOfRange`] when the range runs past the end of
/// the buffer, for example when a zone index exceeds what the snapshot
/// covers.
pub fn extract(buffer: &str, offset: usize, length: usize) -> Result<&str, Error> {
    let available = buffer.len() / 2;
    if offset + length > available {
        return Err(Error::OutOfRange {
            offset,
            length,
            available,
        });
    }
    buffer
        .get(offset * 2..(offset + length) * 2)
        .ok_or_else(|| Error::MalformedField("non-ASCII hex buffer".into()))
}

/// Interprets a hex sub-buffer as a big-endian unsigned integer.
pub fn to_int(sub: &str) -> Result<u64, Error> {
    if sub.len() > 16 {
        return Err(Error::MalformedField(format!(
            "integer field wider than 8 bytes: {sub:?}"
        )));
    }
    u64::from_str_radix(sub, 16)
        .map_err(|_| Error::MalformedField(format!("invalid integer field {sub:?}")))
}

/// Decodes a hex sub-buffer as UTF-8 text, trimming trailing NUL padding.
///
/// Only NUL bytes are stripped; the console pads fixed-width name fields
/// with `\0`, and interior whitespace is significant.
pub fn to_ascii(sub: &str) -> Result<String, Error> {
    let bytes = decode(sub)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| Error::MalformedField(format!("invalid UTF-8 in text field: {e}")))?;
    Ok(text.trim_end_matches('\0').to_string())
}

/// Encodes an integer as lower-case hex without a `0x` prefix or padding.
pub fn from_int(value: u64) -> String {
    format!("{value:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_byte_range() {
        assert_eq!(extract("AABBCCDDEE", 1, 2).unwrap(), "BBCC");
        assert_eq!(extract("AABBCCDDEE", 0, 5).unwrap(), "AABBCCDDEE");
        assert_eq!(extract("AABBCCDDEE", 4, 1).unwrap(), "EE");
    }

    #[test]
    fn extract_out_of_range() {
        assert!(matches!(
            extract("AABBCCDDEE", 4, 2),
            Err(Error::OutOfRange {
                offset: 4,
                length: 2,
                available: 5,
            })
        ));
        assert!(matches!(
            extract("", 0, 1),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn int_conversion() {
        assert_eq!(to_int("BBCC").unwrap(), 48076);
        assert_eq!(to_int("00").unwrap(), 0);
        assert_eq!(to_int("028A").unwrap(), 650);
        assert!(matches!(to_int("ZZ"), Err(Error::MalformedField(_))));
    }

    #[test]
    fn ascii_trims_trailing_nul_only() {
        assert_eq!(to_ascii("41420000").unwrap(), "AB");
        // Interior and leading padding is preserved.
        assert_eq!(to_ascii("00414200").unwrap(), "\0AB");
        assert_eq!(to_ascii("41204200").unwrap(), "A B");
    }

    #[test]
    fn int_encoding_is_unpadded_lower_hex() {
        assert_eq!(from_int(255), "ff");
        assert_eq!(from_int(3), "3");
        assert_eq!(from_int(0), "0");
    }

    #[test]
    fn hex_round_trip() {
        let bytes = [0x55, 0x55, 0x55, 0xAA, 0x00, 0xFF];
        let hex = encode_upper(&bytes);
        assert_eq!(hex, "555555AA00FF");
        assert_eq!(decode(&hex).unwrap(), bytes);
        assert!(matches!(decode("ABC"), Err(Error::MalformedField(_))));
    }
}
