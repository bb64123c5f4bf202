//! # Encoded Polyline Codec
//!
//! Decodes and encodes the encoded polyline format used by OSRM, Google and most
//! routing providers.
//!
//! Each coordinate is stored as a signed delta from the previous one, scaled by
//! `10^precision` and rounded to an integer. The delta is zig-zag folded (sign in
//! the low bit), split into 5-bit chunks (least significant first), each chunk
//! ORed with `0x20` when more chunks follow, and offset by 63 into the printable
//! range `?`..=`~`. Latitude comes before longitude for every point.
//!
//! ## Example
//!
//! ```rust
//! use green_exposure::polyline::{decode_polyline, encode_polyline};
//!
//! let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
//! assert_eq!(points.len(), 3);
//! assert!((points[0].latitude - 38.5).abs() < 1e-9);
//! assert!((points[0].longitude - (-120.2)).abs() < 1e-9);
//!
//! assert_eq!(encode_polyline(&points), "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
//! ```

use crate::{DecodeError, GeoPoint};

/// Precision used by Google and by OSRM's `geometries=polyline`.
pub const DEFAULT_PRECISION: u32 = 5;

const CHUNK_BITS: u32 = 5;
const CHUNK_MASK: i64 = 0x1f;
const CONTINUATION: i64 = 0x20;
const ASCII_OFFSET: u8 = 63;
const MAX_BYTE: u8 = 126;

/// Decode a polyline at the default precision (1e5).
pub fn decode_polyline(encoded: &str) -> Result<Vec<GeoPoint>, DecodeError> {
    decode_polyline_with_precision(encoded, DEFAULT_PRECISION)
}

/// Decode a polyline encoded at `10^precision` (use 6 for OSRM `polyline6`).
///
/// The empty string decodes to an empty route.
pub fn decode_polyline_with_precision(
    encoded: &str,
    precision: u32,
) -> Result<Vec<GeoPoint>, DecodeError> {
    let factor = 10f64.powi(precision as i32);
    let bytes = encoded.as_bytes();
    let mut points = Vec::with_capacity(bytes.len() / 4);

    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let position = index;
        lat = lat
            .checked_add(decode_value(bytes, &mut index)?)
            .ok_or(DecodeError::Overflow { position })?;
        // A latitude with nothing after it is a half-written point.
        if index >= bytes.len() {
            return Err(DecodeError::Truncated { position: index });
        }
        let position = index;
        lng = lng
            .checked_add(decode_value(bytes, &mut index)?)
            .ok_or(DecodeError::Overflow { position })?;

        points.push(GeoPoint::new(lat as f64 / factor, lng as f64 / factor));
    }

    Ok(points)
}

fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i64, DecodeError> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let position = *index;
        let byte = *bytes
            .get(position)
            .ok_or(DecodeError::Truncated { position })?;
        if !(ASCII_OFFSET..=MAX_BYTE).contains(&byte) {
            return Err(DecodeError::InvalidCharacter { byte, position });
        }
        if shift >= 64 - CHUNK_BITS {
            return Err(DecodeError::Overflow { position });
        }

        let chunk = (byte - ASCII_OFFSET) as i64;
        result |= (chunk & CHUNK_MASK) << shift;
        shift += CHUNK_BITS;
        *index += 1;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

/// Encode points at the default precision (1e5).
pub fn encode_polyline(points: &[GeoPoint]) -> String {
    encode_polyline_with_precision(points, DEFAULT_PRECISION)
}

/// Encode points at `10^precision`.
pub fn encode_polyline_with_precision(points: &[GeoPoint], precision: u32) -> String {
    let factor = 10f64.powi(precision as i32);
    let mut out = String::with_capacity(points.len() * 8);

    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for p in points {
        let lat = (p.latitude * factor).round() as i64;
        let lng = (p.longitude * factor).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn encode_value(delta: i64, out: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };

    while value >= CONTINUATION {
        let chunk = (CONTINUATION | (value & CHUNK_MASK)) as u8 + ASCII_OFFSET;
        out.push(chunk as char);
        value >>= CHUNK_BITS;
    }
    out.push((value as u8 + ASCII_OFFSET) as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference string from Google's polyline algorithm documentation.
    const GOOGLE_SAMPLE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_decode_reference_polyline() {
        let points = decode_polyline(GOOGLE_SAMPLE).unwrap();
        let expected = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];
        assert_eq!(points.len(), expected.len());
        for (p, (lat, lng)) in points.iter().zip(expected) {
            assert!(approx_eq(p.latitude, lat, 1e-9));
            assert!(approx_eq(p.longitude, lng, 1e-9));
        }
    }

    #[test]
    fn test_encode_reference_polyline() {
        let points = vec![
            GeoPoint::new(38.5, -120.2),
            GeoPoint::new(40.7, -120.95),
            GeoPoint::new(43.252, -126.453),
        ];
        assert_eq!(encode_polyline(&points), GOOGLE_SAMPLE);
    }

    #[test]
    fn test_decode_empty_string() {
        assert!(decode_polyline("").unwrap().is_empty());
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_polyline(&[]), "");
    }

    #[test]
    fn test_round_trip_london_walk() {
        let walk = vec![
            GeoPoint::new(51.50740, -0.12780),
            GeoPoint::new(51.50801, -0.12903),
            GeoPoint::new(51.50899, -0.13001),
            GeoPoint::new(51.51003, -0.13100),
            GeoPoint::new(51.50003, -0.10001),
        ];
        let decoded = decode_polyline(&encode_polyline(&walk)).unwrap();
        assert_eq!(decoded.len(), walk.len());
        for (a, b) in walk.iter().zip(&decoded) {
            assert!(approx_eq(a.latitude, b.latitude, 1e-5));
            assert!(approx_eq(a.longitude, b.longitude, 1e-5));
        }
    }

    #[test]
    fn test_round_trip_extreme_coordinates() {
        let points = vec![
            GeoPoint::new(-90.0, -180.0),
            GeoPoint::new(90.0, 180.0),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(-0.00001, 0.00001),
        ];
        let decoded = decode_polyline(&encode_polyline(&points)).unwrap();
        for (a, b) in points.iter().zip(&decoded) {
            assert!(approx_eq(a.latitude, b.latitude, 1e-5));
            assert!(approx_eq(a.longitude, b.longitude, 1e-5));
        }
    }

    #[test]
    fn test_round_trip_precision_6() {
        let points = vec![
            GeoPoint::new(52.520008, 13.404954),
            GeoPoint::new(52.521234, 13.409876),
        ];
        let encoded = encode_polyline_with_precision(&points, 6);
        let decoded = decode_polyline_with_precision(&encoded, 6).unwrap();
        for (a, b) in points.iter().zip(&decoded) {
            assert!(approx_eq(a.latitude, b.latitude, 1e-6));
            assert!(approx_eq(a.longitude, b.longitude, 1e-6));
        }
        // Reading a polyline6 string at precision 5 scales it by 10
        let wrong = decode_polyline(&encoded).unwrap();
        assert!(approx_eq(wrong[0].latitude, 525.20008, 1e-5));
    }

    #[test]
    fn test_decode_truncated_mid_value() {
        // '_' (0x5f) has the continuation bit set, so a value must follow
        let err = decode_polyline("_p~iF~ps|U_").unwrap_err();
        assert_eq!(err, DecodeError::Truncated { position: 11 });
    }

    #[test]
    fn test_decode_latitude_without_longitude() {
        let err = decode_polyline("_p~iF").unwrap_err();
        assert_eq!(err, DecodeError::Truncated { position: 5 });
    }

    #[test]
    fn test_decode_invalid_character() {
        let err = decode_polyline("_p~iF ps|U").unwrap_err();
        assert_eq!(err, DecodeError::InvalidCharacter { byte: b' ', position: 5 });

        let err = decode_polyline("é").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidCharacter { position: 0, .. }));
    }

    #[test]
    fn test_decode_overflow() {
        // Endless continuation chunks
        let encoded = "~".repeat(20);
        let err = decode_polyline(&encoded).unwrap_err();
        assert!(matches!(err, DecodeError::Overflow { .. }));
    }

    #[test]
    fn test_decode_running_total_overflow() {
        // Each 12-chunk value is a delta of -2^59; sixteen reach i64::MIN exactly,
        // the seventeenth latitude (byte 16 * 24) no longer fits.
        let value = "~".repeat(11) + "^";
        let encoded = value.repeat(64);
        assert_eq!(
            decode_polyline(&encoded),
            Err(DecodeError::Overflow { position: 384 })
        );

        // Just under the limit still decodes
        let points = decode_polyline(&value.repeat(32)).unwrap();
        assert_eq!(points.len(), 16);
        assert_eq!(points[15].latitude, i64::MIN as f64 / 1e5);
    }

    #[test]
    fn test_decode_preserves_order() {
        let points: Vec<GeoPoint> = (0..20)
            .map(|i| GeoPoint::new(48.0 + i as f64 * 0.001, 11.0 - i as f64 * 0.002))
            .collect();
        let decoded = decode_polyline(&encode_polyline(&points)).unwrap();
        for (i, p) in decoded.iter().enumerate() {
            assert!(approx_eq(p.latitude, 48.0 + i as f64 * 0.001, 1e-5));
        }
    }
}
