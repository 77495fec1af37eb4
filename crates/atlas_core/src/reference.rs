use crate::bessel::{BesselFamily, EvaluationFailure, MpEvaluator};
use crate::sweep::{coordinate_text, order_tag, SweepDefinition, SweepKind, SweepUnit};
use anyhow::{bail, Context, Result};
use num_complex::Complex64;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// A point whose evaluation failed. Its row is omitted and the reason kept,
/// so a sweep never dies halfway through a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPoint {
    pub nu: f64,
    pub z: Complex64,
    pub reason: EvaluationFailure,
}

/// Tally of what one family of one sweep produced.
#[derive(Debug, Clone, Serialize)]
pub struct SweepOutcome {
    pub label: String,
    pub family: BesselFamily,
    pub files_written: usize,
    pub records_written: usize,
    pub skipped: Vec<SkippedPoint>,
}

/// Writes reference tables for sweep definitions under a fixed output root,
/// one directory per family, one file per sweep unit.
pub struct ReferenceGenerator {
    output_root: PathBuf,
}

impl ReferenceGenerator {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        ReferenceGenerator {
            output_root: output_root.into(),
        }
    }

    /// Runs every family of the sweep and reports a tally per family.
    pub fn run(&self, sweep: &SweepDefinition) -> Result<Vec<SweepOutcome>> {
        validate(sweep)?;
        sweep
            .families
            .iter()
            .map(|&family| self.run_family(sweep, family))
            .collect()
    }

    fn run_family(&self, sweep: &SweepDefinition, family: BesselFamily) -> Result<SweepOutcome> {
        let directory = self.output_root.join(sweep.directory(family));
        fs::create_dir_all(&directory)
            .with_context(|| format!("creating {}", directory.display()))?;
        let evaluator = MpEvaluator::new(sweep.precision);
        let mut outcome = SweepOutcome {
            label: sweep.label.clone(),
            family,
            files_written: 0,
            records_written: 0,
            skipped: Vec::new(),
        };
        let mut literal = if sweep.literal_dump() {
            let path = directory.join(sweep.literal_dump_file_name(family));
            let file =
                File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            outcome.files_written += 1;
            Some(BufWriter::new(file))
        } else {
            None
        };
        for unit in sweep.units(family) {
            let path = directory.join(sweep.unit_file_name(family, unit));
            let file =
                File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            let mut file = BufWriter::new(file);
            outcome.files_written += 1;
            if sweep.has_header() {
                writeln!(file, "r,i,z")?;
            }
            if let (Some(literal), SweepUnit::Order(nu)) = (literal.as_mut(), unit) {
                writeln!(literal, "ddouble[] nu{}_expecteds = {{", order_tag(nu))?;
            }
            for point in sweep.unit_points(family, unit) {
                let value = match evaluator.evaluate(family, point.nu, point.z) {
                    Ok(value) => value,
                    Err(reason) => {
                        outcome.skipped.push(SkippedPoint {
                            nu: point.nu,
                            z: point.z,
                            reason,
                        });
                        continue;
                    }
                };
                if sweep.has_header() {
                    writeln!(
                        file,
                        "{},{},{}",
                        coordinate_text(point.z.re),
                        coordinate_text(point.z.im),
                        sweep.format.format_complex(&value)
                    )?;
                } else {
                    let text = sweep.format.format_float(value.real());
                    writeln!(file, "{text}")?;
                    if let Some(literal) = literal.as_mut() {
                        writeln!(literal, "    \"{text}\",")?;
                    }
                }
                outcome.records_written += 1;
            }
            if let (Some(literal), SweepUnit::Order(_)) = (literal.as_mut(), unit) {
                writeln!(literal, "}};")?;
            }
            file.flush()
                .with_context(|| format!("flushing {}", path.display()))?;
        }
        if let Some(mut literal) = literal {
            literal.flush().context("flushing the literal dump")?;
        }
        Ok(outcome)
    }
}

fn validate(sweep: &SweepDefinition) -> Result<()> {
    if sweep.families.is_empty() {
        bail!("Sweep '{}' lists no families.", sweep.label);
    }
    if sweep.orders.is_empty() {
        bail!("Sweep '{}' lists no orders.", sweep.label);
    }
    if sweep.orders.iter().any(|nu| !nu.is_finite()) {
        bail!("Sweep '{}' contains a non-finite order.", sweep.label);
    }
    let domain = match &sweep.kind {
        SweepKind::ComplexGrid { axis } => axis,
        SweepKind::RealByArgument { arguments } | SweepKind::RealByOrder { arguments, .. } => {
            arguments
        }
    };
    if domain.is_empty() {
        bail!("Sweep '{}' has an empty argument domain.", sweep.label);
    }
    if domain.iter().any(|value| !value.is_finite()) {
        bail!("Sweep '{}' contains a non-finite argument.", sweep.label);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ReferenceGenerator, SweepOutcome};
    use crate::bessel::BesselFamily;
    use crate::precision::Precision;
    use crate::serializer::DigitFormat;
    use crate::sweep::{SweepDefinition, SweepKind};
    use std::fs;
    use std::path::PathBuf;

    fn temp_root(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("atlas_reference_{tag}_{}", std::process::id()))
    }

    fn assert_err_contains(result: anyhow::Result<Vec<SweepOutcome>>, needle: &str) {
        let error = result.expect_err("validation should fail");
        assert!(
            error.to_string().contains(needle),
            "unexpected error: {error}"
        );
    }

    fn tiny_grid() -> SweepDefinition {
        SweepDefinition {
            label: "tiny_grid".to_owned(),
            precision: Precision::from_decimal_digits(40),
            format: DigitFormat::survey(),
            families: vec![BesselFamily::FirstKind],
            orders: vec![1.5],
            kind: SweepKind::ComplexGrid {
                axis: vec![2.0, 3.0],
            },
            dir_tag: "_tiny".to_owned(),
            file_tag: String::new(),
        }
    }

    #[test]
    fn complex_grid_file_has_header_and_triplet_rows() {
        let root = temp_root("grid");
        let sweep = tiny_grid();
        let outcomes = ReferenceGenerator::new(&root)
            .run(&sweep)
            .expect("the tiny grid should generate");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].files_written, 1);
        assert_eq!(outcomes[0].records_written, 4);
        assert!(outcomes[0].skipped.is_empty());

        let path = root.join("besselj_tiny").join("besselj_nu1.5.csv");
        let content = fs::read_to_string(&path).expect("the unit file should exist");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "r,i,z");
        assert!(lines[1].starts_with("2,2,"));
        assert!(lines[2].starts_with("2,3,"));
        assert!(lines[4].starts_with("3,3,"));
        for line in &lines[1..] {
            assert!(!line.contains(char::is_whitespace));
            let value_text = line.splitn(3, ',').nth(2).expect("a value column");
            sweep
                .format
                .parse_complex(value_text, sweep.precision)
                .expect("the value column should parse back");
            let body = value_text.strip_suffix('i').expect("an imaginary suffix");
            let split = crate::serializer::imaginary_split(body).expect("a complex pair");
            for part in [&body[..split], &body[split..]] {
                let mantissa = part.split(['e', 'E']).next().expect("a mantissa");
                let digits = mantissa.chars().filter(char::is_ascii_digit).count();
                assert_eq!(digits, 40, "mantissa '{mantissa}' is not 40 digits wide");
            }
        }
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn generation_is_reproducible_byte_for_byte() {
        let first_root = temp_root("repro_a");
        let second_root = temp_root("repro_b");
        let sweep = tiny_grid();
        ReferenceGenerator::new(&first_root)
            .run(&sweep)
            .expect("first run");
        ReferenceGenerator::new(&second_root)
            .run(&sweep)
            .expect("second run");
        let relative = PathBuf::from("besselj_tiny").join("besselj_nu1.5.csv");
        let first = fs::read(first_root.join(&relative)).expect("first file");
        let second = fs::read(second_root.join(&relative)).expect("second file");
        assert_eq!(first, second);
        fs::remove_dir_all(&first_root).ok();
        fs::remove_dir_all(&second_root).ok();
    }

    #[test]
    fn real_rows_are_value_only_and_skip_unsupported_orders() {
        let root = temp_root("real");
        let sweep = SweepDefinition {
            label: "tiny_real".to_owned(),
            precision: Precision::from_decimal_digits(30),
            format: DigitFormat::survey(),
            families: vec![BesselFamily::ModifiedSecondKind],
            orders: vec![-1.0, 0.5, 1.0],
            kind: SweepKind::RealByArgument {
                arguments: vec![2.0],
            },
            dir_tag: "_real_tiny".to_owned(),
            file_tag: "_real".to_owned(),
        };
        let outcomes = ReferenceGenerator::new(&root)
            .run(&sweep)
            .expect("the real sweep should generate");
        assert_eq!(outcomes[0].records_written, 2);

        let path = root.join("besselk_real_tiny").join("besselk_real_x2.csv");
        let content = fs::read_to_string(&path).expect("the unit file should exist");
        let lines: Vec<&str> = content.lines().collect();
        // Orders 0.5 and 1, the negative order is not supported by K.
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert!(!line.contains(','));
            sweep
                .format
                .parse_float(line, sweep.precision)
                .expect("rows should hold one parsable value");
        }
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn literal_dump_wraps_rows_in_array_blocks() {
        let root = temp_root("literal");
        let sweep = SweepDefinition {
            label: "tiny_literal".to_owned(),
            precision: Precision::from_decimal_digits(30),
            format: DigitFormat::survey(),
            families: vec![BesselFamily::FirstKind],
            orders: vec![0.5],
            kind: SweepKind::RealByOrder {
                arguments: vec![1.0, 2.0],
                literal_dump: true,
            },
            dir_tag: "_lit".to_owned(),
            file_tag: "_lit".to_owned(),
        };
        let outcomes = ReferenceGenerator::new(&root)
            .run(&sweep)
            .expect("the literal sweep should generate");
        assert_eq!(outcomes[0].files_written, 2);
        assert_eq!(outcomes[0].records_written, 2);

        let directory = root.join("besselj_lit");
        let rows = fs::read_to_string(directory.join("besselj_lit_nu0.5.csv"))
            .expect("the unit file should exist");
        let row_lines: Vec<&str> = rows.lines().collect();
        assert_eq!(row_lines.len(), 2);

        let dump = fs::read_to_string(directory.join("besselj_real.txt"))
            .expect("the literal dump should exist");
        let expected = format!(
            "ddouble[] nu0p5_expecteds = {{\n    \"{}\",\n    \"{}\",\n}};\n",
            row_lines[0], row_lines[1]
        );
        assert_eq!(dump, expected);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn validation_rejects_degenerate_sweeps() {
        let root = temp_root("invalid");
        let generator = ReferenceGenerator::new(&root);

        let mut sweep = tiny_grid();
        sweep.families.clear();
        assert_err_contains(generator.run(&sweep), "lists no families");

        let mut sweep = tiny_grid();
        sweep.orders.clear();
        assert_err_contains(generator.run(&sweep), "lists no orders");

        let mut sweep = tiny_grid();
        sweep.kind = SweepKind::ComplexGrid { axis: Vec::new() };
        assert_err_contains(generator.run(&sweep), "empty argument domain");

        let mut sweep = tiny_grid();
        sweep.orders = vec![f64::NAN];
        assert_err_contains(generator.run(&sweep), "non-finite order");
        fs::remove_dir_all(&root).ok();
    }
}
