use super::series::{ascending_series, SeriesKind};
use super::EvaluationFailure;
use num_complex::Complex64;
use rug::float::Constant;
use rug::ops::NegAssign;
use rug::{Complex, Float};

/// sin(pi x) and cos(pi x) with the integer part of x removed exactly, so
/// the result stays accurate for orders hundreds of periods out and for
/// epsilon-sized residuals alike.
pub(crate) fn sin_cos_pi(x: &Float, wp: u32) -> (Float, Float) {
    let nearest = Float::with_val(x.prec(), x.round_ref());
    let fraction = Float::with_val(x.prec(), x - &nearest);
    let mut angle = Float::with_val(wp, Constant::Pi);
    angle *= &fraction;
    let (mut sin, mut cos) = angle.sin_cos(Float::new(wp));
    if nearest.to_f64().rem_euclid(2.0) == 1.0 {
        sin.neg_assign();
        cos.neg_assign();
    }
    (sin, cos)
}

/// Y_nu(z) = (J_nu(z) cos(pi nu) - J_{-nu}(z)) / sin(pi nu). Integer orders
/// go through an epsilon-shifted order at doubled working precision; the
/// quotient then cancels the shift to within the caller's guard bits.
pub(crate) fn bessely(nu: f64, z: Complex64, wp: u32) -> Result<Complex, EvaluationFailure> {
    if nu.fract() == 0.0 {
        let doubled = 2 * wp;
        let mut shifted = Float::with_val(doubled, nu);
        shifted += Float::with_val(doubled, Float::i_exp(1, -(wp as i32)));
        let zc = Complex::with_val(doubled, (z.re, z.im));
        reflect_second_kind(&shifted, &zc, doubled)
    } else {
        let order = Float::with_val(wp, nu);
        let zc = Complex::with_val(wp, (z.re, z.im));
        reflect_second_kind(&order, &zc, wp)
    }
}

/// K_nu(z) = pi/2 (I_{-nu}(z) - I_nu(z)) / sin(pi nu), nu >= 0. Same
/// epsilon-shift treatment for integer orders as the second kind.
pub(crate) fn besselk(nu: f64, z: Complex64, wp: u32) -> Result<Complex, EvaluationFailure> {
    if nu.fract() == 0.0 {
        let doubled = 2 * wp;
        let mut shifted = Float::with_val(doubled, nu);
        shifted += Float::with_val(doubled, Float::i_exp(1, -(wp as i32)));
        let zc = Complex::with_val(doubled, (z.re, z.im));
        reflect_modified_second_kind(&shifted, &zc, doubled)
    } else {
        let order = Float::with_val(wp, nu);
        let zc = Complex::with_val(wp, (z.re, z.im));
        reflect_modified_second_kind(&order, &zc, wp)
    }
}

fn reflect_second_kind(nu: &Float, z: &Complex, wp: u32) -> Result<Complex, EvaluationFailure> {
    let j_pos = ascending_series(SeriesKind::Ordinary, nu, z, wp)?;
    let negated = Float::with_val(wp, -nu);
    let j_neg = ascending_series(SeriesKind::Ordinary, &negated, z, wp)?;
    let (sin_pi, cos_pi) = sin_cos_pi(nu, wp);
    let mut value = j_pos;
    value *= &cos_pi;
    value -= &j_neg;
    value /= &sin_pi;
    Ok(value)
}

fn reflect_modified_second_kind(
    nu: &Float,
    z: &Complex,
    wp: u32,
) -> Result<Complex, EvaluationFailure> {
    let i_pos = ascending_series(SeriesKind::Modified, nu, z, wp)?;
    let negated = Float::with_val(wp, -nu);
    let i_neg = ascending_series(SeriesKind::Modified, &negated, z, wp)?;
    let (sin_pi, _) = sin_cos_pi(nu, wp);
    let mut value = i_neg;
    value -= &i_pos;
    value /= &sin_pi;
    let mut half_pi = Float::with_val(wp, Constant::Pi);
    half_pi >>= 1u32;
    value *= &half_pi;
    Ok(value)
}
