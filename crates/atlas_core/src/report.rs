use crate::contour::ContourSet;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Iso-error levels of the survey plots, in log10 relative error.
pub const CONVERGED_LEVEL: f64 = -36.5;
pub const USABLE_LEVEL: f64 = -31.5;
pub const DDOUBLE_CONVERGED_LEVEL: f64 = -29.5;

/// Band edges bracketing the double-double convergence level, for shaded
/// accuracy maps.
pub const ACCURACY_BAND_LEVELS: [f64; 10] = [
    -80.0, -29.5, -29.0, -28.5, -28.0, -27.5, -27.0, -26.5, -26.0, 0.0,
];

/// Page geometry of a rendered plot. The view is the square
/// [0, view_max] x [0, view_max] in argument coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStyle {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub view_max: f64,
    pub x_label: String,
    pub y_label: String,
}

impl ReportStyle {
    pub fn convergence_view(view_max: f64) -> Self {
        ReportStyle {
            width: 600,
            height: 600,
            margin: 60,
            view_max,
            x_label: "Re z".to_owned(),
            y_label: "Im z".to_owned(),
        }
    }
}

/// One iso-error contour with its plot styling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContourTrace {
    pub label: String,
    pub color: String,
    pub dashed: bool,
    pub contour: ContourSet,
}

/// A plain polyline drawn over the contours, argument coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLine {
    pub color: String,
    pub points: Vec<(f64, f64)>,
}

/// Fitted frontier radius r(nu, im) under which the ascending series keeps
/// double-double convergence. Even in the order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundaryModel {
    pub base: f64,
    pub order_linear: f64,
    pub order_quadratic: f64,
    pub imag_linear: f64,
    pub imag_order_cross: f64,
}

impl BoundaryModel {
    pub fn power_series_frontier() -> Self {
        BoundaryModel {
            base: 7.5,
            order_linear: 3.57e-1,
            order_quadratic: 5.23e-3,
            imag_linear: 4.67e-1,
            imag_order_cross: -1.51e-2,
        }
    }

    pub fn radius(&self, nu: f64, im: f64) -> f64 {
        let order = nu.abs();
        self.base
            + order * (self.order_linear + order * self.order_quadratic)
            + im * (self.imag_linear + order * self.imag_order_cross)
    }

    /// Frontier polyline sampled at unit imaginary steps through the view.
    pub fn overlay(&self, nu: f64, view_max: f64, color: &str) -> OverlayLine {
        let mut points = Vec::new();
        let mut im = 0.0;
        while im <= view_max {
            points.push((self.radius(nu, im), im));
            im += 1.0;
        }
        OverlayLine {
            color: color.to_owned(),
            points,
        }
    }
}

pub fn render_svg(style: &ReportStyle, traces: &[ContourTrace], overlays: &[OverlayLine]) -> String {
    let margin = f64::from(style.margin);
    let chart_width = f64::from(style.width) - 2.0 * margin;
    let chart_height = f64::from(style.height) - 2.0 * margin;
    let scale_x = |x: f64| margin + x / style.view_max * chart_width;
    let scale_y = |y: f64| margin + chart_height - y / style.view_max * chart_height;

    let mut ticks = String::new();
    let frame_bottom = f64::from(style.height) - margin;
    for tick in 0..=4 {
        let value = style.view_max * f64::from(tick) / 4.0;
        let x = scale_x(value);
        let y = scale_y(value);
        ticks.push_str(&format!(
            r##"<line x1="{x:.1}" y1="{frame_bottom}" x2="{x:.1}" y2="{}" stroke="#9ca3af" stroke-width="1"/>"##,
            frame_bottom + 6.0,
        ));
        ticks.push_str(&format!(
            r##"<text x="{x:.1}" y="{}" text-anchor="middle" font-size="11" fill="#6b7280">{value}</text>"##,
            frame_bottom + 20.0,
        ));
        ticks.push_str(&format!(
            r##"<line x1="{}" y1="{y:.1}" x2="{margin}" y2="{y:.1}" stroke="#9ca3af" stroke-width="1"/>"##,
            margin - 6.0,
        ));
        ticks.push_str(&format!(
            r##"<text x="{}" y="{}" text-anchor="end" font-size="11" fill="#6b7280">{value}</text>"##,
            margin - 10.0,
            y + 4.0,
        ));
    }

    let mut lines = String::new();
    for trace in traces {
        let dash = if trace.dashed {
            r#" stroke-dasharray="6 4""#
        } else {
            ""
        };
        for index in 0..trace.contour.segment_count() {
            let ((ax, ay), (bx, by)) = trace.contour.segment(index);
            lines.push_str(&format!(
                r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="1.5"{}/>"##,
                scale_x(ax),
                scale_y(ay),
                scale_x(bx),
                scale_y(by),
                trace.color,
                dash,
            ));
        }
    }

    let mut polylines = String::new();
    for overlay in overlays {
        let mut path = String::new();
        for (index, (x, y)) in overlay.points.iter().enumerate() {
            if index > 0 {
                path.push(' ');
            }
            path.push_str(&format!("{:.1},{:.1}", scale_x(*x), scale_y(*y)));
        }
        polylines.push_str(&format!(
            r##"<polyline points="{}" fill="none" stroke="{}" stroke-width="1.5"/>"##,
            path, overlay.color,
        ));
    }

    let mut legend = String::new();
    let legend_x = f64::from(style.width) - margin - 150.0;
    let mut legend_y = margin + 16.0;
    for trace in traces {
        if trace.label.is_empty() {
            continue;
        }
        let dash = if trace.dashed {
            r#" stroke-dasharray="6 4""#
        } else {
            ""
        };
        legend.push_str(&format!(
            r##"<line x1="{legend_x:.1}" y1="{legend_y:.1}" x2="{:.1}" y2="{legend_y:.1}" stroke="{}" stroke-width="1.5"{}/>"##,
            legend_x + 24.0,
            trace.color,
            dash,
        ));
        legend.push_str(&format!(
            r##"<text x="{:.1}" y="{:.1}" font-size="11" fill="#374151">{}</text>"##,
            legend_x + 30.0,
            legend_y + 4.0,
            trace.label,
        ));
        legend_y += 18.0;
    }

    format!(
        r##"<svg width="{}" height="{}" style="background:white">
  <rect x="{margin}" y="{margin}" width="{chart_width}" height="{chart_height}" fill="none" stroke="#9ca3af" stroke-width="1"/>
  <text x="{}" y="{}" text-anchor="middle" font-size="12" fill="#6b7280">{}</text>
  <text x="15" y="{}" text-anchor="middle" font-size="12" fill="#6b7280" transform="rotate(-90, 15, {})">{}</text>
  {ticks}
  {lines}
  {polylines}
  {legend}
</svg>"##,
        style.width,
        style.height,
        f64::from(style.width) / 2.0,
        f64::from(style.height) - margin + 40.0,
        style.x_label,
        f64::from(style.height) / 2.0,
        f64::from(style.height) / 2.0,
        style.y_label,
    )
}

pub fn write_svg(
    path: &Path,
    style: &ReportStyle,
    traces: &[ContourTrace],
    overlays: &[OverlayLine],
) -> Result<()> {
    let svg = render_svg(style, traces, overlays);
    fs::write(path, svg).with_context(|| format!("writing {}", path.display()))
}

/// Dumps the traces with their contour geometry as pretty JSON.
pub fn write_contour_json(path: &Path, traces: &[ContourTrace]) -> Result<()> {
    let json = serde_json::to_string_pretty(traces).context("serializing contour traces")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
