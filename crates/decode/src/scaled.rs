//! Scaled-numeric codec.
//!
//! The remote format carries real numbers as integers: coordinates as signed
//! fixed-point with seven decimal places, and IEEE-754 floats/doubles as the
//! raw integer bit pattern of the value. These functions undo that.

use exn::ResultExt;

use crate::error::{ErrorKind, Result};

/// Scale factor for fixed-point coordinates (degrees × 10⁷).
pub const FIXED32_SCALE: f64 = 1e7;

fn narrow(raw: i64, field: &'static str) -> Result<u32> {
    // Both the signed and the unsigned rendering of a 32-bit value are accepted.
    u32::try_from(raw)
        .or_else(|_| i32::try_from(raw).map(|n| n as u32))
        .or_raise(|| ErrorKind::InvalidWidth { field, value: raw })
}

/// Decodes a signed fixed-point value with seven decimal places.
///
/// ```rust
/// use mediasync_decode::scaled::fixed32_to_f64;
/// assert_eq!(fixed32_to_f64(515_007_700, "latitude").unwrap(), 51.50077);
/// // Negative values may arrive as their unsigned 32-bit rendering.
/// assert_eq!(fixed32_to_f64(4_294_967_295, "longitude").unwrap(), -1e-7);
/// ```
pub fn fixed32_to_f64(raw: i64, field: &'static str) -> Result<f64> {
    let signed = narrow(raw, field)? as i32;
    Ok(f64::from(signed) / FIXED32_SCALE)
}

/// Decodes a 32-bit integer holding the bit pattern of an IEEE-754 float.
pub fn int32_to_f64(raw: i64, field: &'static str) -> Result<f64> {
    Ok(f64::from(f32::from_bits(narrow(raw, field)?)))
}

/// Decodes a 64-bit integer holding the bit pattern of an IEEE-754 double.
pub fn int64_to_f64(bits: u64) -> f64 {
    f64::from_bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0.0)]
    #[case(515_007_700, 51.50077)]
    #[case(-1_277_000, -0.1277)]
    #[case(i64::from(u32::MAX), -1e-7)]
    fn test_fixed32(#[case] raw: i64, #[case] expected: f64) {
        assert_eq!(fixed32_to_f64(raw, "coordinate").unwrap(), expected);
    }

    #[test]
    fn test_fixed32_rejects_wide_values() {
        let err = fixed32_to_f64(1 << 40, "latitude").unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidWidth { field: "latitude", value: 1 << 40 });
    }

    #[rstest]
    #[case(1.8)]
    #[case(0.008)]
    #[case(4.25)]
    fn test_int32_bit_pattern(#[case] value: f32) {
        let raw = i64::from(value.to_bits());
        assert_eq!(int32_to_f64(raw, "aperture").unwrap(), f64::from(value));
    }

    #[test]
    fn test_int32_accepts_signed_rendering() {
        let raw = i64::from((-2.5f32).to_bits() as i32);
        assert_eq!(int32_to_f64(raw, "aperture").unwrap(), -2.5);
    }

    #[test]
    fn test_int64_bit_pattern() {
        assert_eq!(int64_to_f64(29.97f64.to_bits()), 29.97);
        assert_eq!(int64_to_f64(0), 0.0);
    }
}
