use crate::bessel::series::norm_sq;
use crate::dataset::{CandidateRow, ReferenceRow};
use crate::precision::Precision;
use crate::serializer::{DigitFormat, ValueParseError};
use nalgebra::DMatrix;
use rug::{Complex, Float};
use std::collections::{HashMap, HashSet};

/// Clamp window applied to relative errors before taking log10. The floor
/// keeps exact matches and near-zero references from producing infinities;
/// the ceiling marks a point as carrying no usable digits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorClamp {
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for ErrorClamp {
    fn default() -> Self {
        ErrorClamp {
            floor: 1e-80,
            ceiling: 1.0,
        }
    }
}

impl ErrorClamp {
    pub fn clamp_log10(&self, relative_error: f64) -> f64 {
        relative_error.clamp(self.floor, self.ceiling).log10()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Duplicate reference row at r = {re}, i = {im}.")]
    DuplicateReference { re: f64, im: f64 },
    #[error("Duplicate candidate row at r = {re}, i = {im}.")]
    DuplicateCandidate { re: f64, im: f64 },
    #[error("No reference value at r = {re}, i = {im}.")]
    MissingReference { re: f64, im: f64 },
    #[error("Candidate row at r = {re}, i = {im} has neither a value nor an error.")]
    EmptyCandidate { re: f64, im: f64 },
    #[error("Bad value text at r = {re}, i = {im}.")]
    BadValue {
        re: f64,
        im: f64,
        #[source]
        source: ValueParseError,
    },
    #[error("Point r = {re}, i = {im} is off the grid axes.")]
    OffGrid { re: f64, im: f64 },
    #[error("Axes need at least two distinct values per direction.")]
    DegenerateAxes,
}

/// |candidate - reference| / |reference|, computed in the comparison
/// precision so errors far below f64 resolution still register. A
/// reference below the clamp floor classifies at the ceiling outright; an
/// exact textual match classifies as exactly zero.
pub fn relative_error(
    reference: &Complex,
    candidate: &Complex,
    clamp: &ErrorClamp,
    precision: Precision,
) -> f64 {
    let prec = precision.bits();
    let reference_sq = norm_sq(prec, reference);
    let floor = Float::with_val(prec, clamp.floor);
    let floor_sq = Float::with_val(prec, &floor * &floor);
    if reference_sq < floor_sq {
        return clamp.ceiling;
    }
    if reference == candidate {
        return 0.0;
    }
    let diff = Complex::with_val(prec, candidate - reference);
    let diff_sq = norm_sq(prec, &diff);
    let mut ratio = Float::with_val(prec, &diff_sq / &reference_sq);
    ratio.sqrt_mut();
    ratio.to_f64()
}

/// Relative error of one candidate row after the join.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedPoint {
    pub re: f64,
    pub im: f64,
    pub relative_error: f64,
}

fn grid_key(re: f64, im: f64) -> (u64, u64) {
    (re.to_bits(), im.to_bits())
}

/// Joins candidate rows onto the reference by grid coordinates and scores
/// each one. Rows carrying a precomputed error pass it through unchanged;
/// rows carrying value text are parsed into the comparison precision and
/// measured against the reference text.
pub fn classify(
    reference: &[ReferenceRow],
    candidate: &[CandidateRow],
    clamp: &ErrorClamp,
    precision: Precision,
    format: &DigitFormat,
) -> Result<Vec<ClassifiedPoint>, ClassifyError> {
    let mut table: HashMap<(u64, u64), &str> = HashMap::with_capacity(reference.len());
    for row in reference {
        let replaced = table.insert(grid_key(row.re, row.im), row.value.as_str());
        if replaced.is_some() {
            return Err(ClassifyError::DuplicateReference {
                re: row.re,
                im: row.im,
            });
        }
    }
    let mut seen: HashSet<(u64, u64)> = HashSet::with_capacity(candidate.len());
    let mut points = Vec::with_capacity(candidate.len());
    for row in candidate {
        let key = grid_key(row.re, row.im);
        if !seen.insert(key) {
            return Err(ClassifyError::DuplicateCandidate {
                re: row.re,
                im: row.im,
            });
        }
        let scored = if let Some(error) = row.relative_error {
            error
        } else if let Some(value_text) = row.value.as_deref() {
            let Some(reference_text) = table.get(&key).copied() else {
                return Err(ClassifyError::MissingReference {
                    re: row.re,
                    im: row.im,
                });
            };
            let reference_value =
                format
                    .parse_complex(reference_text, precision)
                    .map_err(|source| ClassifyError::BadValue {
                        re: row.re,
                        im: row.im,
                        source,
                    })?;
            let candidate_value =
                format
                    .parse_complex(value_text, precision)
                    .map_err(|source| ClassifyError::BadValue {
                        re: row.re,
                        im: row.im,
                        source,
                    })?;
            relative_error(&reference_value, &candidate_value, clamp, precision)
        } else {
            return Err(ClassifyError::EmptyCandidate {
                re: row.re,
                im: row.im,
            });
        };
        points.push(ClassifiedPoint {
            re: row.re,
            im: row.im,
            relative_error: scored,
        });
    }
    Ok(points)
}

/// Log10 relative errors arranged on the dense sweep grid, rows indexed by
/// the imaginary axis and columns by the real axis. Cells no classified
/// point landed on saturate at the ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorField {
    pub re_axis: Vec<f64>,
    pub im_axis: Vec<f64>,
    pub log_errors: DMatrix<f64>,
}

impl ErrorField {
    pub fn build(
        points: &[ClassifiedPoint],
        re_axis: &[f64],
        im_axis: &[f64],
        clamp: &ErrorClamp,
    ) -> Result<ErrorField, ClassifyError> {
        if re_axis.len() < 2 || im_axis.len() < 2 {
            return Err(ClassifyError::DegenerateAxes);
        }
        let re_index: HashMap<u64, usize> = re_axis
            .iter()
            .enumerate()
            .map(|(index, value)| (value.to_bits(), index))
            .collect();
        let im_index: HashMap<u64, usize> = im_axis
            .iter()
            .enumerate()
            .map(|(index, value)| (value.to_bits(), index))
            .collect();
        if re_index.len() != re_axis.len() || im_index.len() != im_axis.len() {
            return Err(ClassifyError::DegenerateAxes);
        }
        let ceiling_log = clamp.clamp_log10(clamp.ceiling);
        let mut log_errors = DMatrix::from_element(im_axis.len(), re_axis.len(), ceiling_log);
        for point in points {
            let column = re_index.get(&point.re.to_bits());
            let row = im_index.get(&point.im.to_bits());
            let (Some(&column), Some(&row)) = (column, row) else {
                return Err(ClassifyError::OffGrid {
                    re: point.re,
                    im: point.im,
                });
            };
            log_errors[(row, column)] = clamp.clamp_log10(point.relative_error);
        }
        Ok(ErrorField {
            re_axis: re_axis.to_vec(),
            im_axis: im_axis.to_vec(),
            log_errors,
        })
    }
}
