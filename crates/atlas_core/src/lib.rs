pub mod bessel;
pub mod classifier;
pub mod contour;
pub mod dataset;
pub mod precision;
pub mod reference;
pub mod report;
pub mod serializer;
/// The `atlas_core` crate generates arbitrary-precision Bessel function
/// reference tables and maps out where finite-precision methods stay
/// accurate. It evaluates J, Y, I and K over sweeps of order and complex
/// argument, serializes values digit-stable, scores candidate
/// implementations by relative error and extracts iso-error contours.
///
/// Key components:
/// - **Evaluator**: MPFR/MPC ascending series with reflections for Y and K.
/// - **Sweeps**: preset order/argument grids and their file layout.
/// - **Classifier**: reference/candidate joins and clamped log10 error fields.
/// - **Contours**: marching-squares extraction plus SVG and JSON reports.
pub mod sweep;
