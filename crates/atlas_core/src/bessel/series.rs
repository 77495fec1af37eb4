use super::EvaluationFailure;
use rug::ops::{NegAssign, Pow};
use rug::{Complex, Float};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SeriesKind {
    /// J: alternating terms, (z/2)^nu sum_k (-z^2/4)^k / (k! Gamma(nu+k+1)).
    Ordinary,
    /// I: same series with all terms positive.
    Modified,
}

pub(crate) fn norm_sq(prec: u32, value: &Complex) -> Float {
    let mut mag = Float::with_val(prec, value.real() * value.real());
    mag += Float::with_val(prec, value.imag() * value.imag());
    mag
}

/// Ascending power series at `wp` bits. Callers must keep z away from the
/// origin and reduce negative integer orders first; every other real order
/// is admissible because Gamma(nu+k+1) then never hits a pole.
pub(crate) fn ascending_series(
    kind: SeriesKind,
    nu: &Float,
    z: &Complex,
    wp: u32,
) -> Result<Complex, EvaluationFailure> {
    let mut half = Complex::with_val(wp, z);
    half /= 2u32;
    let mut w = Complex::with_val(wp, &half * &half);
    if kind == SeriesKind::Ordinary {
        w.neg_assign();
    }

    let mut coeff = Float::with_val(wp, nu + 1u32);
    coeff.gamma_mut();
    if !coeff.is_finite() {
        return Err(EvaluationFailure::NonFinite);
    }
    coeff.recip_mut();

    let mut term = Complex::with_val(wp, &coeff);
    let mut sum = term.clone();

    // Terms grow until (k+1)|nu+k+1| overtakes |z^2/4|; only past that
    // point is a small term proof of convergence.
    let z_abs = norm_sq(53, z).sqrt().to_f64();
    let past_peak = (nu.to_f64().abs() + 0.5 * z_abs) as usize + 2;
    let max_terms = 1024 + 4 * past_peak + 4 * wp as usize;

    let mut k: usize = 0;
    loop {
        term *= &w;
        let mut divisor = Float::with_val(wp, nu + (k as u32 + 1));
        divisor *= k as u32 + 1;
        if divisor.is_zero() {
            return Err(EvaluationFailure::NonFinite);
        }
        term /= &divisor;
        sum += &term;
        k += 1;

        if k >= past_peak {
            let mut bound = norm_sq(wp, &sum);
            bound >>= 2 * (wp + 8);
            if norm_sq(wp, &term) <= bound {
                break;
            }
        }
        if k >= max_terms {
            return Err(EvaluationFailure::NoConvergence { terms: k });
        }
    }

    let prefix = Complex::with_val(wp, (&half).pow(nu));
    sum *= &prefix;
    if !sum.real().is_finite() || !sum.imag().is_finite() {
        return Err(EvaluationFailure::NonFinite);
    }
    Ok(sum)
}
