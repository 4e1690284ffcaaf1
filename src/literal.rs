//! Literal grammars shared by the reader and the writer.
//!
//! Number text, string escaping, ISO-8601 instants and the two binary
//! encodings live here so that both directions agree on one definition.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// A rejected literal body: offset relative to the start of the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invalid {
    pub at: usize,
    pub msg: String,
}

impl Invalid {
    fn new(at: usize, msg: impl Into<String>) -> Self {
        Invalid {
            at,
            msg: msg.into(),
        }
    }
}

/// Appends the RDN text of a number.
///
/// Finite values use the shortest text that reads back to the same double.
/// Magnitudes at or above 1e21 and below 1e-6 switch to exponent form.
pub(crate) fn write_number(out: &mut String, n: f64) {
    if n.is_nan() {
        out.push_str("NaN");
    } else if n.is_infinite() {
        out.push_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        let abs = n.abs();
        if abs != 0.0 && !(1e-6..1e21).contains(&abs) {
            let text = format!("{:e}", n);
            // `{:e}` omits the sign of positive exponents
            match text.find('e') {
                Some(idx) if !text[idx + 1..].starts_with('-') => {
                    out.push_str(&text[..=idx]);
                    out.push('+');
                    out.push_str(&text[idx + 1..]);
                }
                _ => out.push_str(&text),
            }
        } else {
            out.push_str(&n.to_string());
        }
    }
}

#[inline]
fn needs_escape(b: u8) -> bool {
    b < 0x20 || b == b'"' || b == b'\\'
}

/// Appends `s` as a double-quoted RDN string.
pub(crate) fn write_string(out: &mut String, s: &str) {
    out.push('"');
    if !s.bytes().any(needs_escape) {
        out.push_str(s);
    } else {
        for ch in s.chars() {
            match ch {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\u{08}' => out.push_str("\\b"),
                '\t' => out.push_str("\\t"),
                '\n' => out.push_str("\\n"),
                '\u{0C}' => out.push_str("\\f"),
                '\r' => out.push_str("\\r"),
                c if (c as u32) < 0x20 => {
                    let code = c as u32 as u8;
                    out.push_str("\\u00");
                    out.push(char::from(b"0123456789abcdef"[usize::from(code >> 4)]));
                    out.push(char::from(b"0123456789abcdef"[usize::from(code & 0x0F)]));
                }
                c => out.push(c),
            }
        }
    }
    out.push('"');
}

/// `YYYY-MM-DDTHH:MM:SS.mmmZ`, without the leading `@`.
pub(crate) fn format_iso_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// `0000-01-01T00:00:00Z`, the earliest instant a date literal can express.
pub(crate) const MIN_DATETIME_MILLIS: i64 = -62_167_219_200_000;

/// Whether `dt` has a date literal form. Earlier instants would need a
/// signed year, which `@` does not accept.
pub(crate) fn is_writable_datetime(dt: &DateTime<Utc>) -> bool {
    dt.timestamp_millis() >= MIN_DATETIME_MILLIS
}

/// Appends a date literal.
///
/// Instants after year 9999 have no four-digit ISO form and are written as
/// epoch milliseconds instead. Instants before year 0000 are clamped to
/// `@0000-01-01T00:00:00.000Z`.
pub(crate) fn write_datetime(out: &mut String, dt: &DateTime<Utc>, unix_millis: bool) {
    use chrono::Datelike;

    if !is_writable_datetime(dt) {
        out.push_str("@0000-01-01T00:00:00.000Z");
        return;
    }

    let millis = dt.timestamp_millis();
    let fits_iso = (0..=9999).contains(&dt.year());
    // Ten digits or fewer would read back as seconds
    let fits_millis = millis >= 10_000_000_000;

    out.push('@');
    if (unix_millis && fits_millis) || (!fits_iso && millis > 0) {
        out.push_str(&millis.to_string());
    } else {
        out.push_str(&format_iso_datetime(dt));
    }
}

pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX_UPPER[usize::from(b >> 4)]));
        out.push(char::from(HEX_UPPER[usize::from(b & 0x0F)]));
    }
    out
}

#[inline]
fn is_base64_alphabet(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

/// Checks the shape of a base64 body and returns its exact decoded length.
///
/// Run before decoding so oversized payloads are refused without allocating.
pub(crate) fn base64_decoded_len(body: &[u8]) -> Result<usize, Invalid> {
    if body.len() % 4 != 0 {
        return Err(Invalid::new(
            body.len(),
            format!(
                "Base64 length must be a multiple of 4, got {}",
                body.len()
            ),
        ));
    }
    let mut padding = 0;
    for (i, &b) in body.iter().enumerate() {
        if b == b'=' {
            let tail = &body[i..];
            if tail.len() > 2 || !tail.iter().all(|&p| p == b'=') {
                return Err(Invalid::new(i, "Misplaced base64 padding"));
            }
            padding = tail.len();
            break;
        }
        if !is_base64_alphabet(b) {
            return Err(Invalid::new(
                i,
                format!("Invalid base64 character '{}'", char::from(b)),
            ));
        }
    }
    Ok(body.len() / 4 * 3 - padding)
}

/// Decodes a standard, padded base64 body.
pub(crate) fn decode_base64(body: &[u8]) -> Result<Vec<u8>, Invalid> {
    base64_decoded_len(body)?;
    // Shape is valid here, so the engine can only object to non-zero
    // bits under the padding in the final group.
    STANDARD
        .decode(body)
        .map_err(|e| Invalid::new(body.len().saturating_sub(4), format!("Invalid base64: {}", e)))
}

/// Checks the shape of a hex body and returns its decoded length.
pub(crate) fn hex_decoded_len(body: &[u8]) -> Result<usize, Invalid> {
    if body.len() % 2 != 0 {
        return Err(Invalid::new(
            body.len(),
            format!("Hex length must be even, got {}", body.len()),
        ));
    }
    Ok(body.len() / 2)
}

#[inline]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decodes a case-insensitive hex body.
pub(crate) fn decode_hex(body: &[u8]) -> Result<Vec<u8>, Invalid> {
    let len = hex_decoded_len(body)?;
    let mut out = Vec::with_capacity(len);
    for (i, pair) in body.chunks_exact(2).enumerate() {
        let digit = |j: usize| {
            hex_value(pair[j]).ok_or_else(|| {
                Invalid::new(
                    i * 2 + j,
                    format!("Invalid hex character '{}'", char::from(pair[j])),
                )
            })
        };
        out.push(digit(0)? << 4 | digit(1)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn number(n: f64) -> String {
        let mut out = String::new();
        write_number(&mut out, n);
        out
    }

    #[test]
    fn test_number_text() {
        assert_eq!(number(0.0), "0");
        assert_eq!(number(-0.0), "-0");
        assert_eq!(number(42.0), "42");
        assert_eq!(number(-1.5), "-1.5");
        assert_eq!(number(0.1), "0.1");
        assert_eq!(number(1e21), "1e+21");
        assert_eq!(number(1.5e300), "1.5e+300");
        assert_eq!(number(1e-7), "1e-7");
        assert_eq!(number(123456789012345680000.0), "123456789012345680000");
        assert_eq!(number(f64::NAN), "NaN");
        assert_eq!(number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_string_escapes() {
        let mut out = String::new();
        write_string(&mut out, "a\"b\\c\u{08}\t\n\u{0C}\r\u{01}\u{1F}é");
        assert_eq!(out, "\"a\\\"b\\\\c\\b\\t\\n\\f\\r\\u0001\\u001fé\"");
    }

    #[test]
    fn test_datetime_text() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let mut out = String::new();
        write_datetime(&mut out, &dt, false);
        assert_eq!(out, "@2024-01-15T10:30:00.000Z");

        out.clear();
        write_datetime(&mut out, &dt, true);
        assert_eq!(out, "@1705314600000");

        // Too few digits for the millisecond form
        let early = Utc.timestamp_millis_opt(5_000).unwrap();
        out.clear();
        write_datetime(&mut out, &early, true);
        assert_eq!(out, "@1970-01-01T00:00:05.000Z");
    }

    #[test]
    fn test_datetime_before_year_zero() {
        let floor = Utc.timestamp_millis_opt(MIN_DATETIME_MILLIS).unwrap();
        let mut out = String::new();
        write_datetime(&mut out, &floor, false);
        assert_eq!(out, "@0000-01-01T00:00:00.000Z");
        assert!(is_writable_datetime(&floor));

        let before = Utc.with_ymd_and_hms(-1, 1, 1, 0, 0, 0).unwrap();
        assert!(!is_writable_datetime(&before));
        for unix_millis in [false, true] {
            out.clear();
            write_datetime(&mut out, &before, unix_millis);
            assert_eq!(out, "@0000-01-01T00:00:00.000Z");
        }
        let back = crate::parse(&out).unwrap();
        assert_eq!(back.as_datetime(), Some(&floor));
    }

    #[test]
    fn test_base64_shape() {
        assert_eq!(base64_decoded_len(b""), Ok(0));
        assert_eq!(base64_decoded_len(b"SGVsbG8="), Ok(5));
        assert_eq!(base64_decoded_len(b"SGk="), Ok(2));
        assert_eq!(base64_decoded_len(b"SA=="), Ok(1));
        assert_eq!(base64_decoded_len(b"SGV").unwrap_err().at, 3);
        assert_eq!(base64_decoded_len(b"SG=k").unwrap_err().at, 2);
        assert_eq!(base64_decoded_len(b"S===").unwrap_err().at, 1);
        assert_eq!(base64_decoded_len(b"SG.k").unwrap_err().at, 2);
        assert_eq!(base64_decoded_len(b"SA==SA==").unwrap_err().at, 2);
    }

    #[test]
    fn test_base64_decode() {
        assert_eq!(decode_base64(b"SGVsbG8=").unwrap(), b"Hello");
        // 'B' leaves non-zero bits under the padding
        assert!(decode_base64(b"SB==").is_err());
        assert!(decode_base64(b"SGl=").is_err());
    }

    #[test]
    fn test_hex_decode() {
        assert_eq!(decode_hex(b"48656C6c6F").unwrap(), b"Hello");
        assert_eq!(decode_hex(b"").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_hex(b"486").unwrap_err().at, 3);
        assert_eq!(decode_hex(b"48G6").unwrap_err().at, 2);
    }

    #[test]
    fn test_encoders() {
        assert_eq!(encode_base64(b"Hello"), "SGVsbG8=");
        assert_eq!(encode_hex(&[0x00, 0xAB, 0x7f]), "00AB7F");
    }
}
