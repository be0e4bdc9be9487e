//! FreeSurfer binary surface formats.
//!
//! Readers for the three big-endian FreeSurfer file kinds the pipeline
//! consumes:
//!
//! | Kind | Typical file | Contents |
//! |------|--------------|----------|
//! | Geometry | `lh.white` | vertex coordinates + triangle indices |
//! | Morph data | `lh.sulc`, `lh.curv`, `lh.thickness` | one f32 per vertex |
//! | Annotation | `lh.*.annot` | (vertex, label) pairs |
//!
//! Only the current ("new") format variants are supported; the legacy
//! 3-byte-count morph encoding is rejected with a load error.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};
use nalgebra::Point3;

use crate::error::{Result, SpectralError};

/// Magic number of triangle geometry files (-2 as a 3-byte integer).
const TRIANGLE_MAGIC: u32 = 0xFF_FF_FE;
/// Magic number of new-format morph data files (-1 as a 3-byte integer).
const MORPH_MAGIC: u32 = 0xFF_FF_FF;

/// Load a triangle geometry file: vertex positions and face index triples.
pub fn read_geometry<P: AsRef<Path>>(path: P) -> Result<(Vec<Point3<f64>>, Vec<[usize; 3]>)> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    parse_geometry(&mut reader).map_err(|e| load_error(path, e))
}

/// Load a morph data file (sulcal depth, curvature, thickness).
pub fn read_morph_data<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    parse_morph_data(&mut reader).map_err(|e| load_error(path, e))
}

/// Load an annotation file as one raw label per vertex.
///
/// `num_vertices` comes from the geometry; vertices absent from the file
/// are labelled -1 (unknown), matching the convention that unknown labels
/// are coerced to zero before rebasing.
pub fn read_annot<P: AsRef<Path>>(path: P, num_vertices: usize) -> Result<Vec<i64>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    parse_annot(&mut reader, num_vertices).map_err(|e| load_error(path, e))
}

fn load_error(path: &Path, e: SpectralError) -> SpectralError {
    let message = match e {
        SpectralError::LoadError { message, .. } => message,
        other => other.to_string(),
    };
    SpectralError::LoadError {
        path: path.to_path_buf(),
        message,
    }
}

fn parse_geometry<R: Read>(r: &mut R) -> Result<(Vec<Point3<f64>>, Vec<[usize; 3]>)> {
    let magic = read_u24(r)?;
    if magic != TRIANGLE_MAGIC {
        return Err(format_error(format!(
            "bad geometry magic 0x{:06X}",
            magic
        )));
    }

    // The creation comment ends with a blank line.
    skip_comment(r)?;

    let num_vertices = r.read_i32::<BigEndian>()? as usize;
    let num_faces = r.read_i32::<BigEndian>()? as usize;

    let mut coords = Vec::with_capacity(num_vertices);
    for _ in 0..num_vertices {
        let x = r.read_f32::<BigEndian>()? as f64;
        let y = r.read_f32::<BigEndian>()? as f64;
        let z = r.read_f32::<BigEndian>()? as f64;
        coords.push(Point3::new(x, y, z));
    }

    let mut faces = Vec::with_capacity(num_faces);
    for _ in 0..num_faces {
        let mut face = [0usize; 3];
        for v in &mut face {
            let idx = r.read_i32::<BigEndian>()?;
            if idx < 0 || idx as usize >= num_vertices {
                return Err(format_error(format!("face index {} out of range", idx)));
            }
            *v = idx as usize;
        }
        faces.push(face);
    }

    Ok((coords, faces))
}

fn parse_morph_data<R: Read>(r: &mut R) -> Result<Vec<f64>> {
    let magic = read_u24(r)?;
    if magic != MORPH_MAGIC {
        return Err(format_error(format!(
            "unsupported morph format (magic 0x{:06X}); only the new format is readable",
            magic
        )));
    }

    let num_vertices = r.read_i32::<BigEndian>()? as usize;
    let _num_faces = r.read_i32::<BigEndian>()?;
    let vals_per_vertex = r.read_i32::<BigEndian>()?;
    if vals_per_vertex != 1 {
        return Err(format_error(format!(
            "expected 1 value per vertex, found {}",
            vals_per_vertex
        )));
    }

    let mut values = Vec::with_capacity(num_vertices);
    for _ in 0..num_vertices {
        values.push(r.read_f32::<BigEndian>()? as f64);
    }
    Ok(values)
}

fn parse_annot<R: Read>(r: &mut R, num_vertices: usize) -> Result<Vec<i64>> {
    let count = r.read_i32::<BigEndian>()? as usize;

    let mut labels = vec![-1i64; num_vertices];
    for _ in 0..count {
        let vertex = r.read_i32::<BigEndian>()?;
        let label = r.read_i32::<BigEndian>()?;
        if vertex < 0 || vertex as usize >= num_vertices {
            return Err(format_error(format!(
                "annotation vertex {} out of range",
                vertex
            )));
        }
        labels[vertex as usize] = label as i64;
    }
    Ok(labels)
}

/// Read a FreeSurfer 3-byte big-endian integer.
fn read_u24<R: Read>(r: &mut R) -> Result<u32> {
    let mut bytes = [0u8; 3];
    r.read_exact(&mut bytes)?;
    Ok(((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32)
}

/// Consume the creation comment, which is terminated by "\n\n".
fn skip_comment<R: Read>(r: &mut R) -> Result<()> {
    let mut prev = 0u8;
    loop {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte)?;
        if prev == b'\n' && byte[0] == b'\n' {
            return Ok(());
        }
        prev = byte[0];
    }
}

fn format_error(message: String) -> SpectralError {
    SpectralError::LoadError {
        path: Default::default(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn push_u24(buf: &mut Vec<u8>, value: u32) {
        buf.push((value >> 16) as u8);
        buf.push((value >> 8) as u8);
        buf.push(value as u8);
    }

    fn geometry_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        push_u24(&mut buf, TRIANGLE_MAGIC);
        buf.extend_from_slice(b"created by sulcus tests\n\n");
        buf.write_i32::<BigEndian>(3).unwrap(); // vertices
        buf.write_i32::<BigEndian>(1).unwrap(); // faces
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]] {
            for c in v {
                buf.write_f32::<BigEndian>(c).unwrap();
            }
        }
        for idx in [0i32, 1, 2] {
            buf.write_i32::<BigEndian>(idx).unwrap();
        }
        buf
    }

    #[test]
    fn test_parse_geometry() {
        let bytes = geometry_bytes();
        let (coords, faces) = parse_geometry(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(coords.len(), 3);
        assert_eq!(faces, vec![[0, 1, 2]]);
        assert!((coords[2].y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_geometry_bad_magic() {
        let mut bytes = geometry_bytes();
        bytes[0] = 0x00;
        assert!(parse_geometry(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_parse_geometry_face_out_of_range() {
        let mut buf = Vec::new();
        push_u24(&mut buf, TRIANGLE_MAGIC);
        buf.extend_from_slice(b"c\n\n");
        buf.write_i32::<BigEndian>(2).unwrap();
        buf.write_i32::<BigEndian>(1).unwrap();
        for _ in 0..6 {
            buf.write_f32::<BigEndian>(0.0).unwrap();
        }
        for idx in [0i32, 1, 5] {
            buf.write_i32::<BigEndian>(idx).unwrap();
        }
        assert!(parse_geometry(&mut Cursor::new(buf)).is_err());
    }

    #[test]
    fn test_parse_morph_data() {
        let mut buf = Vec::new();
        push_u24(&mut buf, MORPH_MAGIC);
        buf.write_i32::<BigEndian>(4).unwrap(); // vertices
        buf.write_i32::<BigEndian>(2).unwrap(); // faces (ignored)
        buf.write_i32::<BigEndian>(1).unwrap(); // values per vertex
        for v in [0.5f32, -1.25, 3.0, 0.0] {
            buf.write_f32::<BigEndian>(v).unwrap();
        }

        let values = parse_morph_data(&mut Cursor::new(buf)).unwrap();
        assert_eq!(values, vec![0.5, -1.25, 3.0, 0.0]);
    }

    #[test]
    fn test_parse_morph_rejects_old_format() {
        let mut buf = Vec::new();
        push_u24(&mut buf, 0x000003); // a legacy vertex count, not the magic
        buf.write_i32::<BigEndian>(0).unwrap();
        assert!(parse_morph_data(&mut Cursor::new(buf)).is_err());
    }

    #[test]
    fn test_parse_annot_fills_unlisted_with_unknown() {
        let mut buf = Vec::new();
        buf.write_i32::<BigEndian>(2).unwrap(); // entries
        buf.write_i32::<BigEndian>(0).unwrap(); // vertex 0
        buf.write_i32::<BigEndian>(1005).unwrap();
        buf.write_i32::<BigEndian>(2).unwrap(); // vertex 2
        buf.write_i32::<BigEndian>(17).unwrap();

        let labels = parse_annot(&mut Cursor::new(buf), 4).unwrap();
        assert_eq!(labels, vec![1005, -1, 17, -1]);
    }
}
