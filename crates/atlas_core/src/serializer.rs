use crate::precision::Precision;
use rug::{Complex, Float};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal rendering policy for reference values.
///
/// A value prints in fixed-point form only when the decimal exponent of its
/// leading digit lies strictly inside `(fixed_low, fixed_high)`; everything
/// else prints in scientific form `d.ddd...e+X`, with the exponent suffix
/// omitted when it would be zero. An empty window therefore forces
/// scientific notation throughout, which is what the 40-digit survey tables
/// use. Zero always prints as `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DigitFormat {
    pub significant_digits: usize,
    pub fixed_low: i32,
    pub fixed_high: i32,
    pub strip_trailing_zeros: bool,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueParseError {
    #[error("Empty value text.")]
    Empty,
    #[error("Unparseable numeric text: {text:?}")]
    BadNumber { text: String },
}

impl DigitFormat {
    /// Uniform 40-digit scientific notation, trailing zeros kept.
    pub fn survey() -> Self {
        Self {
            significant_digits: 40,
            fixed_low: 2,
            fixed_high: 1,
            strip_trailing_zeros: false,
        }
    }

    /// Default mixed fixed/scientific rendering at the given digit count,
    /// with trailing zeros stripped. Used by the modified-second-kind grid.
    pub fn plain(decimal_digits: u32) -> Self {
        let digits = decimal_digits as i32;
        Self {
            significant_digits: decimal_digits as usize,
            fixed_low: (-(digits / 3)).min(-5),
            fixed_high: digits,
            strip_trailing_zeros: true,
        }
    }

    pub fn format_float(&self, value: &Float) -> String {
        if value.is_zero() {
            return String::from("0.0");
        }
        if !value.is_finite() {
            return value.to_string();
        }
        let (negative, digits, exp) = value.to_sign_string_exp(10, Some(self.significant_digits));
        // exp places the point before the first digit: value = 0.digits * 10^exp.
        let Some(exp) = exp else {
            return digits;
        };
        let point_exp = exp - 1;
        let body = if self.fixed_low < point_exp && point_exp < self.fixed_high {
            self.fixed_body(&digits, exp)
        } else {
            self.scientific_body(&digits, point_exp)
        };
        if negative {
            format!("-{body}")
        } else {
            body
        }
    }

    pub fn format_complex(&self, value: &Complex) -> String {
        let re = self.format_float(value.real());
        let im = self.format_float(value.imag());
        if im.starts_with('-') {
            format!("{re}{im}i")
        } else {
            format!("{re}+{im}i")
        }
    }

    /// Parses `re`, `re+imi` or `imi` text back into a complex value at the
    /// given precision. Accepts exactly what the formatter emits, so a
    /// format/parse round trip reproduces the text byte for byte.
    pub fn parse_complex(
        &self,
        text: &str,
        precision: Precision,
    ) -> Result<Complex, ValueParseError> {
        let bits = precision.bits();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValueParseError::Empty);
        }
        let Some(body) = trimmed.strip_suffix('i') else {
            let re = parse_float_text(trimmed, bits)?;
            return Ok(Complex::with_val(bits, (re, Float::new(bits))));
        };
        match imaginary_split(body) {
            Some(split) => {
                let (re_text, im_text) = body.split_at(split);
                let re = parse_float_text(re_text, bits)?;
                let im = parse_float_text(im_text, bits)?;
                Ok(Complex::with_val(bits, (re, im)))
            }
            None => {
                let im = parse_float_text(body, bits)?;
                Ok(Complex::with_val(bits, (Float::new(bits), im)))
            }
        }
    }

    pub fn parse_float(&self, text: &str, precision: Precision) -> Result<Float, ValueParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValueParseError::Empty);
        }
        parse_float_text(trimmed, precision.bits())
    }

    fn scientific_body(&self, digits: &str, point_exp: i32) -> String {
        let (lead, rest) = digits.split_at(1);
        let mut fraction = rest.to_string();
        if self.strip_trailing_zeros {
            while fraction.ends_with('0') {
                fraction.pop();
            }
        }
        if fraction.is_empty() {
            fraction.push('0');
        }
        if point_exp == 0 {
            format!("{lead}.{fraction}")
        } else if point_exp > 0 {
            format!("{lead}.{fraction}e+{point_exp}")
        } else {
            format!("{lead}.{fraction}e{point_exp}")
        }
    }

    fn fixed_body(&self, digits: &str, exp: i32) -> String {
        let digit_count = digits.len() as i32;
        let body = if exp <= 0 {
            format!("0.{}{}", "0".repeat(-exp as usize), digits)
        } else if exp >= digit_count {
            format!("{}{}.0", digits, "0".repeat((exp - digit_count) as usize))
        } else {
            let (int_part, frac_part) = digits.split_at(exp as usize);
            format!("{int_part}.{frac_part}")
        };
        if self.strip_trailing_zeros {
            strip_fraction_zeros(body)
        } else {
            body
        }
    }
}

/// Index of the sign that separates the real part from the imaginary part,
/// skipping signs that belong to an exponent. Returns None for bare
/// imaginary text.
pub(crate) fn imaginary_split(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    for index in (1..bytes.len()).rev() {
        let sign = bytes[index] == b'+' || bytes[index] == b'-';
        if sign && bytes[index - 1] != b'e' && bytes[index - 1] != b'E' {
            return Some(index);
        }
    }
    None
}

fn strip_fraction_zeros(body: String) -> String {
    if !body.contains('.') {
        return body;
    }
    let trimmed = body.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

fn parse_float_text(text: &str, bits: u32) -> Result<Float, ValueParseError> {
    let incomplete = Float::parse(text).map_err(|_| ValueParseError::BadNumber {
        text: text.to_string(),
    })?;
    Ok(Float::with_val(bits, incomplete))
}

#[cfg(test)]
mod tests {
    use super::{imaginary_split, DigitFormat, ValueParseError};
    use crate::precision::Precision;
    use rug::{Complex, Float};

    fn float(value: f64) -> Float {
        Float::with_val(160, value)
    }

    #[test]
    fn survey_format_is_always_scientific_with_forty_digits() {
        let format = DigitFormat::survey();
        let half = format.format_float(&float(0.5));
        assert_eq!(half, format!("5.{}e-1", "0".repeat(39)));
        let ten = format.format_float(&float(10.0));
        assert_eq!(ten, format!("1.{}e+1", "0".repeat(39)));
    }

    #[test]
    fn survey_format_drops_zero_exponent_suffix() {
        let format = DigitFormat::survey();
        let unit = format.format_float(&float(1.0));
        assert_eq!(unit, format!("1.{}", "0".repeat(39)));
        assert!(!unit.contains('e'));
    }

    #[test]
    fn zero_prints_as_fixed_zero() {
        let format = DigitFormat::survey();
        assert_eq!(format.format_float(&float(0.0)), "0.0");
        assert_eq!(format.format_float(&float(-0.0)), "0.0");
    }

    #[test]
    fn complex_join_uses_explicit_sign_and_i_suffix() {
        let format = DigitFormat::survey();
        let value = Complex::with_val(160, (0.5, -0.25));
        let text = format.format_complex(&value);
        assert!(text.ends_with('i'));
        assert!(text.contains("e-1-2.5"), "unexpected join in {text}");
        let real_only = Complex::with_val(160, (2.0, 0.0));
        assert!(format.format_complex(&real_only).ends_with("+0.0i"));
    }

    #[test]
    fn plain_format_mixes_fixed_and_scientific() {
        let format = DigitFormat::plain(64);
        assert_eq!(format.format_float(&float(0.5)), "0.5");
        assert_eq!(format.format_float(&float(1024.0)), "1024.0");
        assert_eq!(format.format_float(&float(0.00390625)), "0.00390625");
        let tiny = format.format_float(&float(8.25e-30));
        assert!(tiny.starts_with("8.25"), "got {tiny}");
        assert!(tiny.ends_with("e-30"), "got {tiny}");
    }

    #[test]
    fn imaginary_split_skips_exponent_signs() {
        assert_eq!(imaginary_split("1.0e-5+2.0e-7"), Some(6));
        assert_eq!(imaginary_split("-2.5e+2-1.5"), Some(7));
        assert_eq!(imaginary_split("3.5"), None);
    }

    #[test]
    fn format_parse_round_trip_reproduces_text() {
        let format = DigitFormat::survey();
        let precision = Precision::from_decimal_digits(40);
        let value = Complex::with_val(precision.bits(), (-0.6875, 123.0625));
        let text = format.format_complex(&value);
        let parsed = format
            .parse_complex(&text, precision)
            .expect("own output should parse");
        assert_eq!(format.format_complex(&parsed), text);
    }

    #[test]
    fn parse_handles_real_and_bare_imaginary_text() {
        let format = DigitFormat::survey();
        let precision = Precision::from_decimal_digits(40);
        let real = format
            .parse_complex("2.5e-1", precision)
            .expect("real text should parse");
        assert_eq!(real.real().to_f64(), 0.25);
        assert!(real.imag().is_zero());
        let imaginary = format
            .parse_complex("1.5i", precision)
            .expect("imaginary text should parse");
        assert!(imaginary.real().is_zero());
        assert_eq!(imaginary.imag().to_f64(), 1.5);
    }

    #[test]
    fn parse_rejects_empty_and_garbled_text() {
        let format = DigitFormat::survey();
        let precision = Precision::from_decimal_digits(40);
        assert_eq!(
            format.parse_complex("  ", precision),
            Err(ValueParseError::Empty)
        );
        let err = format
            .parse_complex("1.2q+3.4i", precision)
            .expect_err("garbled text should fail");
        assert!(matches!(err, ValueParseError::BadNumber { .. }));
    }
}
