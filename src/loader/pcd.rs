//! PCL point cloud data via `pcd-rs`: `DATA ascii` and `DATA binary`.
//!
//! Positions come from the fields named `x`, `y` and `z` wherever they sit in
//! the record. Other fields (rgb, normals, intensity) are skipped.

use std::path::Path;

use pcd_rs::{DynReader, DynRecord, Field};

use crate::core::{LoadError, Point3D};

/// Read the points of a PCD file
pub fn read(path: &Path) -> Result<Vec<Point3D>, LoadError> {
    let reader = DynReader::open(path).map_err(|e| decode_error(path, e.to_string()))?;

    let columns = {
        let names: Vec<&str> = reader.meta().field_defs.iter().map(|def| def.name.as_str()).collect();
        xyz_columns(&names).ok_or_else(|| decode_error(path, "fields lack x, y or z"))?
    };
    let expected = reader.meta().num_points as usize;

    let mut points = Vec::with_capacity(expected);
    for (index, record) in reader.enumerate() {
        let record = record.map_err(|e| decode_error(path, format!("point {}: {}", index, e)))?;
        points.push(point_from_record(&record, columns).map_err(|reason| decode_error(path, format!("point {}: {}", index, reason)))?);
    }

    if points.len() != expected {
        return Err(decode_error(path, format!("POINTS declares {} but {} were read", expected, points.len())));
    }

    Ok(points)
}

/// Indices of the x, y and z fields in a record
fn xyz_columns(names: &[&str]) -> Option<[usize; 3]> {
    let find = |axis: &str| names.iter().position(|n| *n == axis);
    Some([find("x")?, find("y")?, find("z")?])
}

fn point_from_record(record: &DynRecord, columns: [usize; 3]) -> Result<Point3D, String> {
    let mut xyz = [0.0f32; 3];
    for (out, col) in xyz.iter_mut().zip(columns) {
        let field = record.0.get(col).ok_or_else(|| format!("record has no field {}", col))?;
        *out = first_as_f32(field).ok_or_else(|| format!("field {} is empty", col))?;
    }
    Ok(Point3D::from_array(xyz))
}

fn first_as_f32(field: &Field) -> Option<f32> {
    match field {
        Field::F32(v) => v.first().copied(),
        Field::F64(v) => v.first().map(|v| *v as f32),
        Field::I8(v) => v.first().map(|v| *v as f32),
        Field::I16(v) => v.first().map(|v| *v as f32),
        Field::I32(v) => v.first().map(|v| *v as f32),
        Field::U8(v) => v.first().map(|v| *v as f32),
        Field::U16(v) => v.first().map(|v| *v as f32),
        Field::U32(v) => v.first().map(|v| *v as f32),
    }
}

fn decode_error(path: &Path, reason: impl Into<String>) -> LoadError {
    LoadError::Decode {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
