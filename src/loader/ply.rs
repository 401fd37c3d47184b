//! Stanford PLY via `ply-rs`: ascii, binary little endian and binary big endian.
//!
//! Only the `x`, `y`, `z` properties of the `vertex` element are read. Any
//! scalar property type is accepted and widened or narrowed to `f32`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Ply, Property};

use crate::core::{LoadError, Point3D};

/// Read the vertices of a PLY file
pub fn read(path: &Path) -> Result<Vec<Point3D>, LoadError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_from(&mut reader, path)
}

/// Read the vertices of PLY data from any buffered reader. `path` is only
/// used in error messages.
pub fn read_from<R: BufRead>(reader: &mut R, path: &Path) -> Result<Vec<Point3D>, LoadError> {
    let parser = Parser::<DefaultElement>::new();
    let ply: Ply<DefaultElement> = parser
        .read_ply(reader)
        .map_err(|e| decode_error(path, e.to_string()))?;

    let Some(vertices) = ply.payload.get("vertex") else {
        return Err(decode_error(path, "no 'vertex' element"));
    };

    let mut points = Vec::with_capacity(vertices.len());
    for (index, vertex) in vertices.iter().enumerate() {
        let x = get_f32(vertex, "x").map_err(|reason| decode_error(path, format!("vertex {}: {}", index, reason)))?;
        let y = get_f32(vertex, "y").map_err(|reason| decode_error(path, format!("vertex {}: {}", index, reason)))?;
        let z = get_f32(vertex, "z").map_err(|reason| decode_error(path, format!("vertex {}: {}", index, reason)))?;
        points.push(Point3D::new(x, y, z));
    }

    Ok(points)
}

fn get_f32(el: &DefaultElement, key: &str) -> Result<f32, String> {
    match el.get(key) {
        Some(Property::Float(v)) => Ok(*v),
        Some(Property::Double(v)) => Ok(*v as f32),
        Some(Property::Char(v)) => Ok(*v as f32),
        Some(Property::UChar(v)) => Ok(*v as f32),
        Some(Property::Short(v)) => Ok(*v as f32),
        Some(Property::UShort(v)) => Ok(*v as f32),
        Some(Property::Int(v)) => Ok(*v as f32),
        Some(Property::UInt(v)) => Ok(*v as f32),
        Some(_) => Err(format!("property '{}' is a list", key)),
        None => Err(format!("missing property '{}'", key)),
    }
}

fn decode_error(path: &Path, reason: impl Into<String>) -> LoadError {
    LoadError::Decode {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
