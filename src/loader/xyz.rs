//! Plain-text XYZ rows (`.xyz`, `.txt`, `.csv`, `.pts`)
//!
//! One point per line, whitespace or comma separated, extra columns ignored.
//! `#` and `//` lines are comments. A single leading header line is skipped
//! when it is a bare point count (Leica `.pts`) or holds no numbers at all
//! (a CSV column row such as `x,y,z`).

use std::path::Path;

use crate::core::{LoadError, Point3D};

/// Read and parse an XYZ file
pub fn read(path: &Path) -> Result<Vec<Point3D>, LoadError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            return Err(LoadError::Unsupported {
                path: path.to_path_buf(),
                reason: "not a text file".into(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    parse(&text)
}

/// Parse XYZ rows from already-read text
pub fn parse(text: &str) -> Result<Vec<Point3D>, LoadError> {
    let mut points = Vec::new();
    let mut fields = Vec::new();
    let mut first_row = true;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        fields.clear();
        fields.extend(split_fields(line));

        if std::mem::take(&mut first_row) && is_header(&fields) {
            log::trace!("Skipping header line {}: {}", idx + 1, line);
            continue;
        }
        points.push(point_from_fields(&fields, idx + 1)?);
    }

    Ok(points)
}

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|s| !s.is_empty())
}

/// A point-count line or a row of column names
fn is_header(fields: &[&str]) -> bool {
    match fields {
        [count] => count.parse::<u64>().is_ok(),
        _ => fields.iter().all(|f| f.parse::<f32>().is_err()),
    }
}

fn point_from_fields(fields: &[&str], line: usize) -> Result<Point3D, LoadError> {
    let mut xyz = [0.0f32; 3];
    for (axis, out) in xyz.iter_mut().enumerate() {
        let token = fields.get(axis).ok_or_else(|| LoadError::Malformed {
            line,
            reason: format!("expected at least 3 columns, found {}", fields.len()),
        })?;
        *out = token.parse::<f32>().map_err(|_| LoadError::Malformed {
            line,
            reason: format!("{} coordinate '{}' is not a number", ["x", "y", "z"][axis], token),
        })?;
    }
    Ok(Point3D::from_array(xyz))
}
