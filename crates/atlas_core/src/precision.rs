use serde::{Deserialize, Serialize};

const LOG2_10: f64 = 3.321928094887362;
const LOG2_E: f64 = std::f64::consts::LOG2_E;

/// Decimal working precision for one sweep, carried by value wherever
/// evaluation or comparison happens. The bit conversion adds one decimal
/// digit of headroom, so round-tripping a result through its decimal form
/// stays faithful to the last digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    decimal_digits: u32,
}

impl Precision {
    pub fn from_decimal_digits(decimal_digits: u32) -> Self {
        Self { decimal_digits }
    }

    pub fn decimal_digits(self) -> u32 {
        self.decimal_digits
    }

    /// Mantissa bits that guarantee `decimal_digits` significant decimals.
    pub fn bits(self) -> u32 {
        (((self.decimal_digits + 1) as f64) * LOG2_10).round() as u32
    }
}

/// Extra bits consumed by cancellation inside the ascending series.
/// Terms peak near exp(|z|) before the alternating sum collapses back to
/// the function's scale, so each unit of |z| costs log2(e) bits.
pub fn series_guard_bits(z_abs: f64) -> u32 {
    (z_abs * LOG2_E).ceil() as u32 + 32
}

/// Extra bits for the modified reflection. I_{-nu} and I_nu both grow like
/// exp(Re z) while their difference shrinks like exp(-Re z).
pub fn reflection_guard_bits(re_z: f64) -> u32 {
    (2.0 * re_z.max(0.0) * LOG2_E).ceil() as u32
}

/// Extra bits when the order sits close to (but not on) an integer, where
/// sin(pi nu) loses about -log2(distance) bits in the reflection quotient.
pub fn near_integer_guard_bits(nu: f64) -> u32 {
    let distance = (nu - nu.round()).abs();
    if distance == 0.0 || distance >= 0.25 {
        0
    } else {
        (-distance.log2()).ceil() as u32 + 4
    }
}

#[cfg(test)]
mod tests {
    use super::{near_integer_guard_bits, reflection_guard_bits, series_guard_bits, Precision};

    #[test]
    fn bits_cover_requested_decimal_digits() {
        assert_eq!(Precision::from_decimal_digits(64).bits(), 216);
        assert_eq!(Precision::from_decimal_digits(128).bits(), 429);
        assert_eq!(Precision::from_decimal_digits(256).bits(), 854);
        assert_eq!(Precision::from_decimal_digits(512).bits(), 1704);
    }

    #[test]
    fn bits_exceed_plain_digit_conversion() {
        for digits in [1u32, 16, 40, 100, 333] {
            let bits = Precision::from_decimal_digits(digits).bits();
            assert!(
                (bits as f64) > digits as f64 * 3.32,
                "{digits} digits got only {bits} bits"
            );
        }
    }

    #[test]
    fn series_guard_grows_with_argument_magnitude() {
        assert_eq!(series_guard_bits(0.0), 32);
        let small = series_guard_bits(4.0);
        let large = series_guard_bits(256.0);
        assert!(small < large);
        assert!(large >= 256 + 32, "guard {large} cannot absorb exp(256)");
    }

    #[test]
    fn reflection_guard_ignores_left_half_plane() {
        assert_eq!(reflection_guard_bits(-5.0), 0);
        assert_eq!(reflection_guard_bits(0.0), 0);
        assert!(reflection_guard_bits(64.0) >= 128);
    }

    #[test]
    fn near_integer_guard_applies_only_inside_quarter_band() {
        assert_eq!(near_integer_guard_bits(3.0), 0);
        assert_eq!(near_integer_guard_bits(2.75), 0);
        assert_eq!(near_integer_guard_bits(-16.25), 0);
        let tight = near_integer_guard_bits(2.0009765625);
        assert!(tight >= 14, "expected at least 14 guard bits, got {tight}");
    }
}
