use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use uuid::Uuid;

pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x12345678_1234_1234_1234_1234567890ab);
pub const ANGLE_Y_UUID: Uuid = Uuid::from_u128(0xabcd1234_0001_1000_8000_00805f9b34fb);
pub const ANGLE_Z_UUID: Uuid = Uuid::from_u128(0xabcd1234_0002_1000_8000_00805f9b34fb);
pub const FLEX_ANGLE_UUID: Uuid = Uuid::from_u128(0xabcd1234_0003_1000_8000_00805f9b34fb);

#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
    #[error("payload is not valid base64: {0}")]
    Base64(String),

    #[error("payload is not UTF-8")]
    Utf8,

    #[error("payload {0:?} does not start with a number")]
    NotANumber(String),
}

/// Sensor channel carried by one notifying characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    AngleY,
    AngleZ,
    FlexAngle,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::AngleY, Channel::AngleZ, Channel::FlexAngle];

    pub fn uuid(&self) -> Uuid {
        match self {
            Channel::AngleY => ANGLE_Y_UUID,
            Channel::AngleZ => ANGLE_Z_UUID,
            Channel::FlexAngle => FLEX_ANGLE_UUID,
        }
    }

    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        Channel::ALL.into_iter().find(|channel| channel.uuid() == uuid)
    }
}

/// Characteristic value as handed over by a JS-style bridge (base64 text).
pub fn decode_base64_value(encoded: &str) -> Result<f64, DecodeError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|err| DecodeError::Base64(err.to_string()))?;
    decode_ascii_value(&bytes)
}

/// Characteristic value as raw bytes of a decimal ASCII string.
pub fn decode_ascii_value(bytes: &[u8]) -> Result<f64, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;
    parse_float_prefix(text).ok_or_else(|| DecodeError::NotANumber(text.to_string()))
}

/// Notification payload as either transport delivers it: the decimal ASCII
/// bytes themselves, or that text base64-encoded by a bridge.
///
/// Base64 of a decimal string never starts with a digit, sign or dot, so
/// trying ASCII first cannot misread an encoded payload.
pub fn decode_payload(bytes: &[u8]) -> Result<f64, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;
    if let Some(value) = parse_float_prefix(text) {
        return Ok(value);
    }
    decode_base64_value(text).map_err(|_| DecodeError::NotANumber(text.to_string()))
}

/// Longest leading decimal number in `text`; trailing garbage is ignored.
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts when it has digits of its own.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    trimmed[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_ascii_number() {
        let encoded = STANDARD.encode("-12.75");
        assert_eq!(decode_base64_value(&encoded), Ok(-12.75));
    }

    #[test]
    fn raw_bytes_ignore_trailing_noise() {
        assert_eq!(decode_ascii_value(b"23.5\0\0"), Ok(23.5));
        assert_eq!(decode_ascii_value(b" 7deg"), Ok(7.0));
    }

    #[test]
    fn rejects_non_numbers() {
        assert!(matches!(
            decode_ascii_value(b"nan?"),
            Err(DecodeError::NotANumber(_))
        ));
        assert!(matches!(
            decode_base64_value("***"),
            Err(DecodeError::Base64(_))
        ));
        assert_eq!(decode_ascii_value(&[0xff, 0xfe]), Err(DecodeError::Utf8));
    }

    #[test]
    fn payload_accepts_raw_or_base64_text() {
        assert_eq!(decode_payload(b"18.25"), Ok(18.25));
        assert_eq!(decode_payload(STANDARD.encode("-3.5").as_bytes()), Ok(-3.5));
        assert_eq!(decode_payload(STANDARD.encode("42").as_bytes()), Ok(42.0));
        assert!(matches!(
            decode_payload(b"garbage"),
            Err(DecodeError::NotANumber(_))
        ));
        assert!(matches!(
            decode_payload(STANDARD.encode("offline").as_bytes()),
            Err(DecodeError::NotANumber(_))
        ));
    }

    #[test]
    fn float_prefix_edge_cases() {
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("3."), Some(3.0));
        assert_eq!(parse_float_prefix("1e3x"), Some(1000.0));
        assert_eq!(parse_float_prefix("2e"), Some(2.0));
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix("."), None);
    }

    #[test]
    fn channels_round_trip_through_uuid() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_uuid(channel.uuid()), Some(channel));
        }
        assert_eq!(Channel::from_uuid(SERVICE_UUID), None);
    }
}
