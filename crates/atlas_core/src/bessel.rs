mod reflection;
pub(crate) mod series;

use crate::precision::{self, Precision};
use num_complex::Complex64;
use rug::ops::NegAssign;
use rug::{Complex, Float};
use serde::{Deserialize, Serialize};
use std::fmt;

use self::series::SeriesKind;

/// The four Bessel families covered by the reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BesselFamily {
    FirstKind,
    SecondKind,
    ModifiedFirstKind,
    ModifiedSecondKind,
}

impl BesselFamily {
    pub const ALL: [BesselFamily; 4] = [
        BesselFamily::FirstKind,
        BesselFamily::SecondKind,
        BesselFamily::ModifiedFirstKind,
        BesselFamily::ModifiedSecondKind,
    ];

    /// Short name used in directory and file names.
    pub fn name(self) -> &'static str {
        match self {
            BesselFamily::FirstKind => "besselj",
            BesselFamily::SecondKind => "bessely",
            BesselFamily::ModifiedFirstKind => "besseli",
            BesselFamily::ModifiedSecondKind => "besselk",
        }
    }

    /// K is even in nu, so sweeps skip its negative orders rather than
    /// duplicate the positive-order tables.
    pub fn supports_order(self, nu: f64) -> bool {
        !matches!(self, BesselFamily::ModifiedSecondKind if nu < 0.0)
    }
}

impl fmt::Display for BesselFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reason a single (nu, z) point produced no reference value.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
pub enum EvaluationFailure {
    #[error("{family} is undefined at nu = {nu}, z = {z}.")]
    Undefined {
        family: BesselFamily,
        nu: f64,
        z: Complex64,
    },
    #[error("Ascending series did not converge within {terms} terms.")]
    NoConvergence { terms: usize },
    #[error("Evaluation produced a non-finite result.")]
    NonFinite,
}

/// Evaluates the Bessel families in MPFR/MPC arithmetic. Working precision
/// is raised above the target by guard bits sized from the argument and the
/// order, so the value rounded back to the target precision is trustworthy
/// in every digit it keeps.
#[derive(Debug, Clone)]
pub struct MpEvaluator {
    precision: Precision,
}

impl MpEvaluator {
    pub fn new(precision: Precision) -> Self {
        MpEvaluator { precision }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn evaluate(
        &self,
        family: BesselFamily,
        nu: f64,
        z: Complex64,
    ) -> Result<Complex, EvaluationFailure> {
        let target = self.precision.bits();
        if z.re == 0.0 && z.im == 0.0 {
            return origin_value(family, nu, z, target);
        }
        let mut wp = target
            + precision::series_guard_bits(z.norm())
            + precision::near_integer_guard_bits(nu);
        if family == BesselFamily::ModifiedSecondKind {
            wp += precision::reflection_guard_bits(z.re);
        }
        let raw = match family {
            BesselFamily::FirstKind => series_value(SeriesKind::Ordinary, nu, z, wp)?,
            BesselFamily::ModifiedFirstKind => series_value(SeriesKind::Modified, nu, z, wp)?,
            BesselFamily::SecondKind => {
                if nu < 0.0 && nu.fract() == 0.0 {
                    let mut value = reflection::bessely(-nu, z, wp)?;
                    negate_if_odd(&mut value, -nu);
                    value
                } else {
                    reflection::bessely(nu, z, wp)?
                }
            }
            BesselFamily::ModifiedSecondKind => reflection::besselk(nu.abs(), z, wp)?,
        };
        let value = Complex::with_val(target, &raw);
        if !(value.real().is_finite() && value.imag().is_finite()) {
            return Err(EvaluationFailure::NonFinite);
        }
        Ok(value)
    }
}

/// J and I by the ascending series, with negative integer orders folded
/// onto the positive order first: J_{-n} = (-1)^n J_n and I_{-n} = I_n.
/// Negative non-integer orders feed the series directly; the reciprocal
/// gamma coefficients absorb them.
fn series_value(
    kind: SeriesKind,
    nu: f64,
    z: Complex64,
    wp: u32,
) -> Result<Complex, EvaluationFailure> {
    let zc = Complex::with_val(wp, (z.re, z.im));
    if nu < 0.0 && nu.fract() == 0.0 {
        let order = Float::with_val(wp, -nu);
        let mut value = series::ascending_series(kind, &order, &zc, wp)?;
        if kind == SeriesKind::Ordinary {
            negate_if_odd(&mut value, -nu);
        }
        return Ok(value);
    }
    let order = Float::with_val(wp, nu);
    series::ascending_series(kind, &order, &zc, wp)
}

/// J and I have finite limits at z = 0; Y and K do not. Negative
/// non-integer orders of J and I diverge there as well.
fn origin_value(
    family: BesselFamily,
    nu: f64,
    z: Complex64,
    target: u32,
) -> Result<Complex, EvaluationFailure> {
    match family {
        BesselFamily::FirstKind | BesselFamily::ModifiedFirstKind => {
            if nu == 0.0 {
                Ok(Complex::with_val(target, (1.0, 0.0)))
            } else if nu > 0.0 || nu.fract() == 0.0 {
                Ok(Complex::with_val(target, (0.0, 0.0)))
            } else {
                Err(EvaluationFailure::Undefined { family, nu, z })
            }
        }
        BesselFamily::SecondKind | BesselFamily::ModifiedSecondKind => {
            Err(EvaluationFailure::Undefined { family, nu, z })
        }
    }
}

fn negate_if_odd(value: &mut Complex, n: f64) {
    if n.rem_euclid(2.0) == 1.0 {
        value.neg_assign();
    }
}
