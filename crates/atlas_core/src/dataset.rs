use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// One row of a reference table: grid coordinates plus the value text
/// exactly as generated, digits untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRow {
    pub re: f64,
    pub im: f64,
    pub value: String,
}

/// One row of a candidate table. A candidate either carries its own value
/// text to compare against the reference, or a precomputed relative error,
/// or neither when the file only lists grid coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    pub re: f64,
    pub im: f64,
    pub value: Option<String>,
    pub relative_error: Option<f64>,
}

pub fn read_reference_rows(path: &Path) -> Result<Vec<ReferenceRow>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_reference_rows(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Reference tables are fixed-shape: a "r,i,z" header, then one row per
/// grid point with the value in the last column.
pub fn parse_reference_rows(content: &str) -> Result<Vec<ReferenceRow>> {
    let mut lines = content.lines();
    let Some(header) = lines.next() else {
        bail!("The table is empty.");
    };
    if header.trim() != "r,i,z" {
        bail!("Expected a 'r,i,z' header, found '{header}'.");
    }
    let mut rows = Vec::new();
    for (index, line) in lines.enumerate() {
        let line_number = index + 2;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, ',');
        let (Some(re), Some(im), Some(value)) = (fields.next(), fields.next(), fields.next())
        else {
            bail!("Line {line_number} has fewer than three columns.");
        };
        rows.push(ReferenceRow {
            re: parse_grid_coordinate(re, line_number)?,
            im: parse_grid_coordinate(im, line_number)?,
            value: value.trim().to_owned(),
        });
    }
    Ok(rows)
}

pub fn read_candidate_rows(path: &Path) -> Result<Vec<CandidateRow>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_candidate_rows(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Candidate tables name their columns in the header. "r" and "i" are
/// required; "z" and "relerr" are picked up when present and any other
/// column is ignored.
pub fn parse_candidate_rows(content: &str) -> Result<Vec<CandidateRow>> {
    let mut lines = content.lines();
    let Some(header) = lines.next() else {
        bail!("The table is empty.");
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let position = |name: &str| columns.iter().position(|column| *column == name);
    let (Some(re_column), Some(im_column)) = (position("r"), position("i")) else {
        bail!("Expected 'r' and 'i' columns, found '{header}'.");
    };
    let value_column = position("z");
    let relerr_column = position("relerr");
    let mut rows = Vec::new();
    for (index, line) in lines.enumerate() {
        let line_number = index + 2;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        let re = parse_grid_coordinate(column(&fields, re_column, line_number)?, line_number)?;
        let im = parse_grid_coordinate(column(&fields, im_column, line_number)?, line_number)?;
        let value = match value_column {
            Some(index) => {
                let text = column(&fields, index, line_number)?;
                (!text.is_empty()).then(|| text.to_owned())
            }
            None => None,
        };
        let relative_error = match relerr_column {
            Some(index) => {
                let text = column(&fields, index, line_number)?;
                if text.is_empty() {
                    None
                } else {
                    let parsed: f64 = text.parse().with_context(|| {
                        format!("line {line_number}: bad relative error '{text}'")
                    })?;
                    Some(parsed)
                }
            }
            None => None,
        };
        rows.push(CandidateRow {
            re,
            im,
            value,
            relative_error,
        });
    }
    Ok(rows)
}

fn column<'a>(fields: &[&'a str], column: usize, line_number: usize) -> Result<&'a str> {
    match fields.get(column) {
        Some(text) => Ok(text.trim()),
        None => bail!("Line {line_number} has no column {column}."),
    }
}

fn parse_grid_coordinate(text: &str, line_number: usize) -> Result<f64> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .with_context(|| format!("line {line_number}: bad grid coordinate '{trimmed}'"))?;
    if !value.is_finite() {
        bail!("Line {line_number}: non-finite grid coordinate '{trimmed}'.");
    }
    Ok(value)
}
