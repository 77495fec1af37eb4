use crate::bessel::BesselFamily;
use crate::precision::Precision;
use crate::serializer::DigitFormat;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Decimal text of a sweep coordinate as it appears in file names and grid
/// columns. Uses the shortest round-trip form, so 16.0 prints as "16".
pub fn coordinate_text(value: f64) -> String {
    format!("{value}")
}

/// Coordinate text made safe for identifiers: "." becomes "p" and the sign
/// becomes "m", so -16.25 turns into "m16p25".
pub fn order_tag(nu: f64) -> String {
    coordinate_text(nu).replace('.', "p").replace('-', "m")
}

/// One evaluation site of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub nu: f64,
    pub z: Complex64,
}

/// Why a grid point is left out of every sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainExclusion {
    /// Values below the real axis follow from conjugate symmetry.
    ConjugateHalfPlane,
    /// Branch cuts and poles sit on the non-positive real axis.
    NonPositiveRealAxis,
}

pub fn exclusion(z: Complex64) -> Option<DomainExclusion> {
    if z.im < 0.0 {
        Some(DomainExclusion::ConjugateHalfPlane)
    } else if z.re <= 0.0 && z.im == 0.0 {
        Some(DomainExclusion::NonPositiveRealAxis)
    } else {
        None
    }
}

/// How a sweep walks its argument domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SweepKind {
    /// One file per order; rows walk axis x axis with the real part outermost.
    ComplexGrid { axis: Vec<f64> },
    /// One file per argument; rows walk the orders.
    RealByArgument { arguments: Vec<f64> },
    /// One file per order; rows walk the arguments.
    RealByOrder {
        arguments: Vec<f64>,
        literal_dump: bool,
    },
}

/// A full sweep: which families and orders to evaluate, over which argument
/// domain, at which precision, and how to name the output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepDefinition {
    pub label: String,
    pub precision: Precision,
    pub format: DigitFormat,
    pub families: Vec<BesselFamily>,
    pub orders: Vec<f64>,
    pub kind: SweepKind,
    pub dir_tag: String,
    pub file_tag: String,
}

/// A single output file of a sweep, keyed by the coordinate that is fixed
/// within it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SweepUnit {
    Order(f64),
    Argument(f64),
}

impl SweepDefinition {
    /// Orders 0, 1/4, -1/4, ... up to 16, over a complex grid whose axes
    /// mirror octaves from 1/8 to 256 around zero. 256 decimal digits.
    pub fn low_order_complex() -> Self {
        let mut orders = vec![0.0];
        for k in 1..=64 {
            orders.push(k as f64 / 4.0);
            orders.push(-(k as f64) / 4.0);
        }
        SweepDefinition {
            label: "low_order_complex".to_owned(),
            precision: Precision::from_decimal_digits(256),
            format: DigitFormat::survey(),
            families: BesselFamily::ALL.to_vec(),
            orders,
            kind: SweepKind::ComplexGrid {
                axis: mirrored_octave_axis(),
            },
            dir_tag: "_plusi".to_owned(),
            file_tag: String::new(),
        }
    }

    /// Orders -16 to 16 in quarter steps over positive real arguments from
    /// 1/256 to 64, one file per argument. 128 decimal digits.
    pub fn low_order_real() -> Self {
        let orders = (-64..=64).map(|k| f64::from(k) / 4.0).collect();
        let arguments = vec![
            0.00390625, 0.0078125, 0.015625, 0.03125, 0.0625, 0.125, 0.25, 0.5, 1.0, 2.0,
            3.0, 4.0, 6.0, 8.0, 12.0, 16.0, 24.0, 32.0, 38.625, 38.75, 38.875, 64.0,
        ];
        SweepDefinition {
            label: "low_order_real".to_owned(),
            precision: Precision::from_decimal_digits(128),
            format: DigitFormat::survey(),
            families: BesselFamily::ALL.to_vec(),
            orders,
            kind: SweepKind::RealByArgument { arguments },
            dir_tag: "_real".to_owned(),
            file_tag: "_real".to_owned(),
        }
    }

    /// Orders clustered past 16 up to 256, positive block then negative
    /// block, over the non-negative octave grid. 128 decimal digits.
    pub fn large_order_complex() -> Self {
        SweepDefinition {
            label: "large_order_complex".to_owned(),
            precision: Precision::from_decimal_digits(128),
            format: DigitFormat::survey(),
            families: BesselFamily::ALL.to_vec(),
            orders: large_orders(),
            kind: SweepKind::ComplexGrid {
                axis: octave_axis(),
            },
            dir_tag: "_complex_nuplus16".to_owned(),
            file_tag: "_complex_nuplus16".to_owned(),
        }
    }

    /// The large orders over positive real arguments, one file per order,
    /// with a verbatim array-literal dump alongside. 512 decimal digits.
    pub fn large_order_real() -> Self {
        let arguments = vec![
            0.125, 0.25, 0.5, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0, 16.0, 24.0, 32.0, 64.0,
            128.0, 256.0,
        ];
        SweepDefinition {
            label: "large_order_real".to_owned(),
            precision: Precision::from_decimal_digits(512),
            format: DigitFormat::survey(),
            families: BesselFamily::ALL.to_vec(),
            orders: large_orders(),
            kind: SweepKind::RealByOrder {
                arguments,
                literal_dump: true,
            },
            dir_tag: "_real_nuplus16".to_owned(),
            file_tag: "_real_nuplus16".to_owned(),
        }
    }

    /// K only, selected low orders over a dense half-step grid to 64 on
    /// both axes, written in plain positional notation at 64 digits.
    pub fn modified_second_kind_grid() -> Self {
        let axis = (0..=128).map(|k| f64::from(k) / 2.0).collect();
        SweepDefinition {
            label: "modified_second_kind_grid".to_owned(),
            precision: Precision::from_decimal_digits(64),
            format: DigitFormat::plain(64),
            families: vec![BesselFamily::ModifiedSecondKind],
            orders: vec![
                0.0, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0, 16.0, 0.5, 1.5, 0.25, 15.75, 15.5,
            ],
            kind: SweepKind::ComplexGrid { axis },
            dir_tag: String::new(),
            file_tag: String::new(),
        }
    }

    pub fn all_presets() -> Vec<SweepDefinition> {
        vec![
            SweepDefinition::low_order_complex(),
            SweepDefinition::low_order_real(),
            SweepDefinition::large_order_complex(),
            SweepDefinition::large_order_real(),
            SweepDefinition::modified_second_kind_grid(),
        ]
    }

    /// The sweep's orders with the ones the family does not support removed.
    pub fn effective_orders(&self, family: BesselFamily) -> Vec<f64> {
        self.orders
            .iter()
            .copied()
            .filter(|&nu| family.supports_order(nu))
            .collect()
    }

    pub fn directory(&self, family: BesselFamily) -> String {
        format!("{}{}", family.name(), self.dir_tag)
    }

    /// Output files for one family, in generation order.
    pub fn units(&self, family: BesselFamily) -> Vec<SweepUnit> {
        match &self.kind {
            SweepKind::ComplexGrid { .. } | SweepKind::RealByOrder { .. } => self
                .effective_orders(family)
                .into_iter()
                .map(SweepUnit::Order)
                .collect(),
            SweepKind::RealByArgument { arguments } => {
                arguments.iter().copied().map(SweepUnit::Argument).collect()
            }
        }
    }

    pub fn unit_file_name(&self, family: BesselFamily, unit: SweepUnit) -> String {
        match unit {
            SweepUnit::Order(nu) => format!(
                "{}{}_nu{}.csv",
                family.name(),
                self.file_tag,
                coordinate_text(nu)
            ),
            SweepUnit::Argument(x) => format!(
                "{}{}_x{}.csv",
                family.name(),
                self.file_tag,
                coordinate_text(x)
            ),
        }
    }

    /// Complex-grid files carry a "r,i,z" header line; real files do not.
    pub fn has_header(&self) -> bool {
        matches!(self.kind, SweepKind::ComplexGrid { .. })
    }

    pub fn literal_dump(&self) -> bool {
        matches!(
            self.kind,
            SweepKind::RealByOrder {
                literal_dump: true,
                ..
            }
        )
    }

    pub fn literal_dump_file_name(&self, family: BesselFamily) -> String {
        format!("{}_real.txt", family.name())
    }

    /// Points of one unit in row order, domain exclusions already applied.
    pub fn unit_points(&self, family: BesselFamily, unit: SweepUnit) -> UnitPoints<'_> {
        let row_orders = match self.kind {
            SweepKind::RealByArgument { .. } => self.effective_orders(family),
            _ => Vec::new(),
        };
        UnitPoints {
            definition: self,
            unit,
            row_orders,
            outer: 0,
            inner: 0,
        }
    }

    /// Every point of the sweep for one family, in unit order.
    pub fn sample_points(
        &self,
        family: BesselFamily,
    ) -> impl Iterator<Item = SamplePoint> + '_ {
        self.units(family)
            .into_iter()
            .flat_map(move |unit| self.unit_points(family, unit))
    }
}

pub struct UnitPoints<'a> {
    definition: &'a SweepDefinition,
    unit: SweepUnit,
    row_orders: Vec<f64>,
    outer: usize,
    inner: usize,
}

impl Iterator for UnitPoints<'_> {
    type Item = SamplePoint;

    fn next(&mut self) -> Option<SamplePoint> {
        match (&self.definition.kind, self.unit) {
            (SweepKind::ComplexGrid { axis }, SweepUnit::Order(nu)) => {
                while self.outer < axis.len() {
                    while self.inner < axis.len() {
                        let z = Complex64::new(axis[self.outer], axis[self.inner]);
                        self.inner += 1;
                        if exclusion(z).is_none() {
                            return Some(SamplePoint { nu, z });
                        }
                    }
                    self.inner = 0;
                    self.outer += 1;
                }
                None
            }
            (SweepKind::RealByArgument { .. }, SweepUnit::Argument(x)) => {
                while self.outer < self.row_orders.len() {
                    let nu = self.row_orders[self.outer];
                    self.outer += 1;
                    let z = Complex64::new(x, 0.0);
                    if exclusion(z).is_none() {
                        return Some(SamplePoint { nu, z });
                    }
                }
                None
            }
            (SweepKind::RealByOrder { arguments, .. }, SweepUnit::Order(nu)) => {
                while self.outer < arguments.len() {
                    let z = Complex64::new(arguments[self.outer], 0.0);
                    self.outer += 1;
                    if exclusion(z).is_none() {
                        return Some(SamplePoint { nu, z });
                    }
                }
                None
            }
            _ => None,
        }
    }
}

fn octave_axis() -> Vec<f64> {
    let mut axis = vec![0.0];
    let mut magnitude = 0.125;
    while magnitude <= 256.0 {
        axis.push(magnitude);
        magnitude *= 2.0;
    }
    axis
}

fn mirrored_octave_axis() -> Vec<f64> {
    let mut axis = octave_axis();
    let negatives: Vec<f64> = axis[1..].iter().map(|value| -value).collect();
    axis.extend(negatives);
    axis
}

fn large_orders() -> Vec<f64> {
    let mut orders = vec![
        16.25, 16.5, 16.75, 17.0, 17.25, 17.5, 17.75, 18.0, 18.25, 18.5, 18.75, 19.0, 19.5,
        20.0, 20.25, 20.5, 20.75, 21.0, 63.75, 64.0, 127.75, 128.0, 255.5, 255.75, 256.0,
    ];
    let negatives: Vec<f64> = orders.iter().map(|nu| -nu).collect();
    orders.extend(negatives);
    orders
}
