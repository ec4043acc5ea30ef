//! Plain-text pattern files and result exports
//!
//! Patterns are stored one point per line as `x,y` or `x,y,mark`. Fields may
//! be separated by commas or whitespace, lines starting with `#` are comments
//! and the first record may be a header if neither coordinate field is a
//! number. Marks become numeric when every mark parses as a finite number and
//! categorical otherwise.

use crate::algorithm::energy::EnergyReport;
use crate::algorithm::result::ReconstructionResult;
use crate::io::error::{AlgorithmError, Result, file_system_error, invalid_parameter};
use crate::spatial::pattern::Pattern;
use crate::spatial::point::{Marks, Point};
use crate::spatial::window::{Rectangle, Window};
use log::debug;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Points and optional marks read from a pattern file
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecords {
    /// Point locations in file order
    pub points: Vec<Point>,
    /// Marks of the points, if the file has a third column
    pub marks: Option<Marks>,
}

fn parse_error(path: &Path, line: usize, reason: impl Into<String>) -> AlgorithmError {
    AlgorithmError::PatternParse {
        path: path.to_path_buf(),
        line,
        reason: reason.into(),
    }
}

fn fields(line: &str) -> Vec<&str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|field| !field.is_empty())
        .collect()
}

fn coordinate(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parse pattern records from text; `source` only labels errors
///
/// # Errors
///
/// Returns `PatternParse` for records with a wrong field count or unparsable
/// coordinates; only a first record without any numeric coordinate field is
/// skipped as a header
pub fn parse_points(text: &str, source: &Path) -> Result<PointRecords> {
    let mut points = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut columns: Option<usize> = None;
    let mut seen_record = false;

    for (offset, raw) in text.lines().enumerate() {
        let line_number = offset + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record = fields(line);
        let first_record = !seen_record;
        seen_record = true;

        let parsed = match record.as_slice() {
            [x, y] | [x, y, _] => coordinate(x).zip(coordinate(y)),
            _ => {
                return Err(parse_error(
                    source,
                    line_number,
                    format!("expected 2 or 3 fields, found {}", record.len()),
                ));
            }
        };
        let Some((x, y)) = parsed else {
            let numeric_fields = record
                .iter()
                .take(2)
                .filter(|field| field.parse::<f64>().is_ok())
                .count();
            if first_record && numeric_fields == 0 {
                debug!("Skipping header '{line}' of {}", source.display());
                continue;
            }
            return Err(parse_error(
                source,
                line_number,
                format!("coordinates '{line}' are not finite numbers"),
            ));
        };

        match columns {
            Some(expected) if expected != record.len() => {
                return Err(parse_error(
                    source,
                    line_number,
                    format!("expected {expected} fields like earlier records, found {}", record.len()),
                ));
            }
            Some(_) => {}
            None => columns = Some(record.len()),
        }

        points.push(Point::new(x, y));
        if let Some(mark) = record.get(2) {
            labels.push((*mark).to_string());
        }
    }

    let marks = (columns == Some(3)).then(|| marks_from_labels(&labels));
    Ok(PointRecords { points, marks })
}

fn marks_from_labels(labels: &[String]) -> Marks {
    let numeric: Option<Vec<f64>> = labels.iter().map(|label| coordinate(label)).collect();
    numeric.map_or_else(|| Marks::categorical(labels), Marks::Numeric)
}

/// Read pattern records from a file
///
/// # Errors
///
/// Returns `FileSystem` if the file cannot be read and `PatternParse` for
/// malformed records
pub fn read_points(path: &Path) -> Result<PointRecords> {
    let text = fs::read_to_string(path).map_err(|e| file_system_error(path, "read", e))?;
    parse_points(&text, path)
}

/// Read a pattern, observed in `window` or in the bounding box of its points
///
/// # Errors
///
/// Returns file and parse errors, and pattern validation errors if a point
/// lies outside the window
pub fn read_pattern(path: &Path, window: Option<Arc<Window>>) -> Result<Pattern> {
    let records = read_points(path)?;
    let window = match window {
        Some(window) => window,
        None => Arc::new(Window::Rectangle(Rectangle::enclosing(&records.points)?)),
    };
    let pattern = Pattern::new(window, records.points)?;
    match records.marks {
        Some(marks) => pattern.with_marks(marks),
        None => Ok(pattern),
    }
}

/// Read a polygon window from a file of vertices; a third column is ignored
///
/// # Errors
///
/// Returns file and parse errors, and polygon validation errors
pub fn read_polygon(path: &Path) -> Result<Window> {
    Window::polygon(read_points(path)?.points)
}

/// Parse a rectangle given as `xmin,xmax,ymin,ymax`
///
/// # Errors
///
/// Returns `InvalidParameter` unless there are exactly four finite numbers
/// forming a non-degenerate rectangle
pub fn parse_window(text: &str) -> Result<Window> {
    let bounds: Option<Vec<f64>> = fields(text).into_iter().map(coordinate).collect();
    match bounds.as_deref() {
        Some(&[x_min, x_max, y_min, y_max]) => Window::rectangle(x_min, x_max, y_min, y_max),
        _ => Err(invalid_parameter(
            "window",
            &text,
            &"expected four numbers xmin,xmax,ymin,ymax",
        )),
    }
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| file_system_error(parent, "create directory", e))?;
    }
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content).map_err(|e| file_system_error(path, "write", e))
}

/// Write a pattern with a header row, including marks if present
///
/// # Errors
///
/// Returns `FileSystem` if the file cannot be written
pub fn write_pattern(path: &Path, pattern: &Pattern) -> Result<()> {
    let marks = pattern.marks();
    let header = if marks.is_some() { "x,y,mark" } else { "x,y" };
    let lines: Vec<String> = std::iter::once(header.to_string())
        .chain(pattern.points().iter().enumerate().map(|(i, point)| {
            match marks.and_then(|m| m.label(i)) {
                Some(mark) => format!("{},{},{mark}", point.x, point.y),
                None => format!("{},{}", point.x, point.y),
            }
        }))
        .collect();
    write_lines(path, &lines)
}

/// Write every recorded energy trajectory as `name,iteration,energy` rows
///
/// # Errors
///
/// Returns `FileSystem` if the file cannot be written
pub fn write_trajectories(path: &Path, result: &ReconstructionResult) -> Result<()> {
    let mut lines = vec!["name,iteration,energy".to_string()];
    for (name, reconstruction) in result.names().iter().zip(result.reconstructions()) {
        lines.extend(
            reconstruction
                .trajectory
                .iter()
                .map(|sample| format!("{name},{},{}", sample.iteration, sample.energy)),
        );
    }
    write_lines(path, &lines)
}

/// Write an energy report as `name,energy` rows
///
/// # Errors
///
/// Returns `FileSystem` if the file cannot be written
pub fn write_energy_report(path: &Path, report: &EnergyReport) -> Result<()> {
    let mut lines = vec!["name,energy".to_string()];
    match report {
        EnergyReport::PerReconstruction(energies) => lines.extend(
            energies
                .iter()
                .map(|named| format!("{},{}", named.name, named.energy)),
        ),
        EnergyReport::Mean(mean) => lines.push(format!("mean,{mean}")),
    }
    write_lines(path, &lines)
}
