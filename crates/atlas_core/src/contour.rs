use crate::classifier::ErrorField;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourSet {
    pub level: f64,
    pub points: Vec<f64>,
    pub segments: Vec<u32>,
}

impl ContourSet {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len() / 2
    }

    pub fn segment(&self, index: usize) -> ((f64, f64), (f64, f64)) {
        let a = self.segments[index * 2] as usize;
        let b = self.segments[index * 2 + 1] as usize;
        (
            (self.points[a * 2], self.points[a * 2 + 1]),
            (self.points[b * 2], self.points[b * 2 + 1]),
        )
    }
}

pub fn extract_contour(field: &ErrorField, level: f64) -> Result<ContourSet> {
    if !level.is_finite() {
        bail!("Contour level must be finite.");
    }
    validate_axis(&field.re_axis, "real")?;
    validate_axis(&field.im_axis, "imaginary")?;
    if field.log_errors.nrows() != field.im_axis.len()
        || field.log_errors.ncols() != field.re_axis.len()
    {
        bail!(
            "Field shape {}x{} does not match the {}x{} axes.",
            field.log_errors.nrows(),
            field.log_errors.ncols(),
            field.im_axis.len(),
            field.re_axis.len()
        );
    }

    let mut points = Vec::new();
    let mut segments = Vec::new();
    let mut point_count = 0u32;
    for iy in 0..field.im_axis.len() - 1 {
        let y0 = field.im_axis[iy];
        let y1 = field.im_axis[iy + 1];
        for ix in 0..field.re_axis.len() - 1 {
            let x0 = field.re_axis[ix];
            let x1 = field.re_axis[ix + 1];
            let v0 = field.log_errors[(iy, ix)] - level;
            let v1 = field.log_errors[(iy, ix + 1)] - level;
            let v2 = field.log_errors[(iy + 1, ix + 1)] - level;
            let v3 = field.log_errors[(iy + 1, ix)] - level;

            let mut case_index = 0u8;
            if v0 >= 0.0 {
                case_index |= 1;
            }
            if v1 >= 0.0 {
                case_index |= 2;
            }
            if v2 >= 0.0 {
                case_index |= 4;
            }
            if v3 >= 0.0 {
                case_index |= 8;
            }
            let edge_pairs = marching_squares_edge_pairs(case_index);
            if edge_pairs.is_empty() {
                continue;
            }

            for (edge_a, edge_b) in edge_pairs {
                let (ax, ay) = interpolate_square_edge(*edge_a, x0, x1, y0, y1, v0, v1, v2, v3);
                let (bx, by) = interpolate_square_edge(*edge_b, x0, x1, y0, y1, v0, v1, v2, v3);
                points.push(ax);
                points.push(ay);
                points.push(bx);
                points.push(by);
                segments.push(point_count);
                segments.push(point_count + 1);
                point_count += 2;
            }
        }
    }

    Ok(ContourSet {
        level,
        points,
        segments,
    })
}

pub fn extract_contours(field: &ErrorField, levels: &[f64]) -> Result<Vec<ContourSet>> {
    levels
        .iter()
        .map(|&level| extract_contour(field, level))
        .collect()
}

fn validate_axis(axis: &[f64], name: &str) -> Result<()> {
    if axis.len() < 2 {
        bail!("The {name} axis needs at least two values.");
    }
    for value in axis {
        if !value.is_finite() {
            bail!("The {name} axis contains a non-finite value.");
        }
    }
    for window in axis.windows(2) {
        if window[1] <= window[0] {
            bail!("The {name} axis must be strictly increasing.");
        }
    }
    Ok(())
}

fn marching_squares_edge_pairs(case_index: u8) -> &'static [(u8, u8)] {
    match case_index {
        0 | 15 => &[],
        1 => &[(3, 0)],
        2 => &[(0, 1)],
        3 => &[(3, 1)],
        4 => &[(1, 2)],
        5 => &[(3, 2), (0, 1)],
        6 => &[(0, 2)],
        7 => &[(3, 2)],
        8 => &[(2, 3)],
        9 => &[(0, 2)],
        10 => &[(0, 3), (1, 2)],
        11 => &[(1, 2)],
        12 => &[(1, 3)],
        13 => &[(0, 1)],
        14 => &[(3, 0)],
        _ => &[],
    }
}

fn interpolate_square_edge(
    edge: u8,
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
    v0: f64,
    v1: f64,
    v2: f64,
    v3: f64,
) -> (f64, f64) {
    match edge {
        0 => {
            let t = interpolate_factor(v0, v1);
            (x0 + (x1 - x0) * t, y0)
        }
        1 => {
            let t = interpolate_factor(v1, v2);
            (x1, y0 + (y1 - y0) * t)
        }
        2 => {
            let t = interpolate_factor(v2, v3);
            (x1 + (x0 - x1) * t, y1)
        }
        3 => {
            let t = interpolate_factor(v3, v0);
            (x0, y1 + (y0 - y1) * t)
        }
        _ => (x0, y0),
    }
}

fn interpolate_factor(v0: f64, v1: f64) -> f64 {
    let denominator = v0 - v1;
    if denominator.abs() <= 1e-12 {
        0.5
    } else {
        (v0 / denominator).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_contour, extract_contours};
    use crate::classifier::ErrorField;
    use nalgebra::DMatrix;

    fn radial_field() -> ErrorField {
        let axis: Vec<f64> = (-15..=15).map(f64::from).collect();
        let re_axis = axis.clone();
        let im_axis = axis;
        let log_errors = DMatrix::from_fn(im_axis.len(), re_axis.len(), |row, col| {
            re_axis[col].hypot(im_axis[row])
        });
        ErrorField {
            re_axis,
            im_axis,
            log_errors,
        }
    }

    #[test]
    fn radial_field_contour_traces_the_circle() {
        let field = radial_field();
        let contour = extract_contour(&field, 10.0).expect("the contour should extract");
        assert!(!contour.is_empty());
        assert!(contour.segment_count() > 20);
        for index in 0..contour.segment_count() {
            let ((ax, ay), (bx, by)) = contour.segment(index);
            assert!((ax.hypot(ay) - 10.0).abs() < 0.2, "vertex off the circle");
            assert!((bx.hypot(by) - 10.0).abs() < 0.2, "vertex off the circle");
        }
    }

    #[test]
    fn contours_at_increasing_levels_nest() {
        let field = radial_field();
        let contours = extract_contours(&field, &[5.0, 10.0]).expect("both levels");
        assert_eq!(contours.len(), 2);
        let radius = |contour: &super::ContourSet| -> (f64, f64) {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for index in 0..contour.segment_count() {
                let ((ax, ay), (bx, by)) = contour.segment(index);
                for r in [ax.hypot(ay), bx.hypot(by)] {
                    min = min.min(r);
                    max = max.max(r);
                }
            }
            (min, max)
        };
        let (_, inner_max) = radius(&contours[0]);
        let (outer_min, _) = radius(&contours[1]);
        assert!(inner_max < outer_min);
    }

    #[test]
    fn flat_field_has_no_contour() {
        let field = ErrorField {
            re_axis: vec![0.0, 1.0, 2.0, 3.0],
            im_axis: vec![0.0, 1.0, 2.0, 3.0],
            log_errors: DMatrix::from_element(4, 4, -30.0),
        };
        assert!(extract_contour(&field, -10.0)
            .expect("the contour should extract")
            .is_empty());
        // A field exactly on the level has every corner on the same side.
        assert!(extract_contour(&field, -30.0)
            .expect("the contour should extract")
            .is_empty());
    }

    #[test]
    fn vertical_transition_lands_between_the_columns() {
        let field = ErrorField {
            re_axis: vec![0.0, 1.0],
            im_axis: vec![0.0, 1.0],
            log_errors: DMatrix::from_fn(2, 2, |_, col| if col == 0 { -1.0 } else { 1.0 }),
        };
        let contour = extract_contour(&field, 0.0).expect("the contour should extract");
        assert_eq!(contour.segment_count(), 1);
        let ((ax, _), (bx, _)) = contour.segment(0);
        assert!((ax - 0.5).abs() < 1e-12);
        assert!((bx - 0.5).abs() < 1e-12);
    }

    #[test]
    fn bad_axes_and_levels_are_rejected() {
        let field = ErrorField {
            re_axis: vec![0.0, 2.0, 1.0],
            im_axis: vec![0.0, 1.0, 2.0],
            log_errors: DMatrix::from_element(3, 3, -30.0),
        };
        let error = extract_contour(&field, 0.0).expect_err("an unsorted axis should fail");
        assert!(error.to_string().contains("strictly increasing"));

        let field = ErrorField {
            re_axis: vec![0.0, 1.0],
            im_axis: vec![0.0, 1.0],
            log_errors: DMatrix::from_element(3, 2, -30.0),
        };
        let error = extract_contour(&field, 0.0).expect_err("a shape mismatch should fail");
        assert!(error.to_string().contains("does not match"));

        let field = radial_field();
        let error = extract_contour(&field, f64::NAN).expect_err("a NaN level should fail");
        assert!(error.to_string().contains("must be finite"));
    }
}
