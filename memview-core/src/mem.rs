/// Reader and writer for the binary `.mem` assembly container
///
/// Layout (all little-endian):
///
/// ```text
/// magic "MEM\0" | version u16 | flags u16
/// u32 part count, per part:
///   "PART" | vertices (u32 len, 3 f32 each) | indices (u32 len, u32 each)
///   face starts (u32 len, u32 each) | edge starts (u32 len, u32 each)
///   faces (u32 start, u32 count) | edges (u32 start, u32 count)
///   bounds (min xyz, max xyz as f32)
/// u32 component count, per component:
///   "COMP" | part index u32 | 16 f32 matrix, column-major
/// ```
use std::fs;
use std::path::Path;

use nalgebra::{Matrix4, Point3};
use nom::{
    bytes::complete::tag,
    error::{Error as NomError, ErrorKind},
    multi::count,
    number::complete::{le_f32, le_u16, le_u32},
    sequence::tuple,
    IResult,
};
use tracing::info;

use crate::error::{MemError, MemResult};
use crate::geometry::{Assembly, BoundingBox, Component, IndexRange, Part};

pub const MAGIC: &[u8; 4] = b"MEM\0";
pub const VERSION: u16 = 1;
pub const EXTENSION: &str = "mem";

const PART_TAG: &[u8; 4] = b"PART";
const COMP_TAG: &[u8; 4] = b"COMP";

/// Tag, four length prefixes, two ranges and the bounds.
const PART_MIN_LEN: usize = 4 + 4 * 4 + 2 * 8 + 6 * 4;
/// Tag, part index and sixteen matrix entries.
const COMP_LEN: usize = 4 + 4 + 16 * 4;

type ParseResult<'a, O> = IResult<&'a [u8], O>;

/// Serialize an assembly.
pub fn encode(assembly: &Assembly) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    put_u32(&mut out, assembly.parts().len() as u32);
    for part in assembly.parts() {
        out.extend_from_slice(PART_TAG);
        put_u32(&mut out, part.vertices.len() as u32);
        for v in &part.vertices {
            put_point(&mut out, v);
        }
        for list in [&part.indices, &part.face_starts, &part.edge_starts] {
            put_u32(&mut out, list.len() as u32);
            for &i in list.iter() {
                put_u32(&mut out, i);
            }
        }
        for range in [part.faces, part.edges] {
            put_u32(&mut out, range.start);
            put_u32(&mut out, range.count);
        }
        put_point(&mut out, &part.bounds.min);
        put_point(&mut out, &part.bounds.max);
    }

    put_u32(&mut out, assembly.components().len() as u32);
    for component in assembly.components() {
        out.extend_from_slice(COMP_TAG);
        put_u32(&mut out, component.part_index as u32);
        for v in component.matrix.as_slice() {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    out
}

/// Parse and validate an assembly.
pub fn decode(data: &[u8]) -> MemResult<Assembly> {
    let Some(input) = data.strip_prefix(MAGIC.as_slice()) else {
        return Err(MemError::BadMagic);
    };

    let (input, (version, _flags)) =
        tuple((le_u16, le_u16))(input).map_err(|e| malformed(data, e))?;
    if version != VERSION {
        return Err(MemError::UnsupportedVersion(version));
    }

    let (rest, (parts, components)) =
        tuple((array(PART_MIN_LEN, part), array(COMP_LEN, component)))(input)
            .map_err(|e| malformed(data, e))?;
    if !rest.is_empty() {
        return Err(MemError::TrailingBytes(rest.len()));
    }

    Ok(Assembly::new(parts, components)?)
}

/// Read a `.mem` file.
pub fn load(path: &Path) -> MemResult<Assembly> {
    let data = fs::read(path).map_err(|source| MemError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let assembly = decode(&data)?;
    info!(
        path = %path.display(),
        bytes = data.len(),
        parts = assembly.parts().len(),
        components = assembly.components().len(),
        "loaded assembly"
    );
    Ok(assembly)
}

/// Write a `.mem` file.
pub fn save(path: &Path, assembly: &Assembly) -> MemResult<()> {
    let data = encode(assembly);
    fs::write(path, &data).map_err(|source| MemError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = data.len(), "saved assembly");
    Ok(())
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_point(out: &mut Vec<u8>, p: &Point3<f32>) {
    for v in p.iter() {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn malformed(data: &[u8], err: nom::Err<NomError<&[u8]>>) -> MemError {
    let offset = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => data.len() - e.input.len(),
        nom::Err::Incomplete(_) => data.len(),
    };
    MemError::Malformed { offset }
}

/// A `u32` length followed by that many elements of at least `elem_len` bytes.
///
/// Lengths that cannot fit in the remaining input fail before allocating.
fn array<'a, O>(
    elem_len: usize,
    mut elem: impl FnMut(&'a [u8]) -> ParseResult<'a, O>,
) -> impl FnMut(&'a [u8]) -> ParseResult<'a, Vec<O>> {
    move |input| {
        let (input, len) = le_u32(input)?;
        let len = len as usize;
        if len.saturating_mul(elem_len) > input.len() {
            return Err(nom::Err::Failure(NomError::new(input, ErrorKind::Eof)));
        }
        count(&mut elem, len)(input)
    }
}

fn point(input: &[u8]) -> ParseResult<'_, Point3<f32>> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Point3::new(x, y, z)))
}

fn range(input: &[u8]) -> ParseResult<'_, IndexRange> {
    let (input, (start, count)) = tuple((le_u32, le_u32))(input)?;
    Ok((input, IndexRange::new(start, count)))
}

fn part(input: &[u8]) -> ParseResult<'_, Part> {
    let (input, _) = tag(PART_TAG.as_slice())(input)?;
    let (input, vertices) = array(12, point)(input)?;
    let (input, indices) = array(4, le_u32)(input)?;
    let (input, face_starts) = array(4, le_u32)(input)?;
    let (input, edge_starts) = array(4, le_u32)(input)?;
    let (input, faces) = range(input)?;
    let (input, edges) = range(input)?;
    let (input, min) = point(input)?;
    let (input, max) = point(input)?;

    Ok((
        input,
        Part {
            vertices,
            indices,
            face_starts,
            edge_starts,
            faces,
            edges,
            bounds: BoundingBox::new(min, max),
        },
    ))
}

fn component(input: &[u8]) -> ParseResult<'_, Component> {
    let (input, _) = tag(COMP_TAG.as_slice())(input)?;
    let (input, part_index) = le_u32(input)?;
    let (input, values) = count(le_f32, 16)(input)?;
    Ok((
        input,
        Component::new(part_index as usize, Matrix4::from_column_slice(&values)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;
    use nalgebra::Vector3;

    fn sample() -> Assembly {
        let tri = Part::from_triangles(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0), Point3::new(0.0, 3.0, 0.5)],
            vec![0, 1, 2],
        )
        .unwrap();
        let turned = Matrix4::new_rotation(Vector3::new(0.0, 0.3, 0.0))
            * Matrix4::new_translation(&Vector3::new(4.0, -1.0, 2.5));
        Assembly::new(
            vec![Part::cube(1.5), tri],
            vec![Component::identity(0), Component::new(1, turned), Component::identity(1)],
        )
        .unwrap()
    }

    #[test]
    fn test_encode_decode() {
        let asm = sample();
        let bytes = encode(&asm);
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(decode(&bytes).unwrap(), asm);
    }

    #[test]
    fn test_matrix_is_column_major() {
        let asm = Assembly::new(
            vec![Part::cube(1.0)],
            vec![Component::new(0, Matrix4::new_translation(&Vector3::new(7.0, 8.0, 9.0)))],
        )
        .unwrap();
        let bytes = encode(&asm);
        // The last 16 floats are the matrix; translation sits in entries 12..15.
        let matrix = &bytes[bytes.len() - 64..];
        let tx = f32::from_le_bytes(matrix[48..52].try_into().unwrap());
        assert_eq!(tx, 7.0);
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(decode(b"STL solid"), Err(MemError::BadMagic)));
        assert!(matches!(decode(b""), Err(MemError::BadMagic)));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = encode(&Assembly::default_cube());
        bytes[4..6].copy_from_slice(&7u16.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(MemError::UnsupportedVersion(7))));
    }

    #[test]
    fn test_truncated_input() {
        let bytes = encode(&Assembly::default_cube());
        let cut = &bytes[..bytes.len() - 10];
        assert!(matches!(decode(cut), Err(MemError::Malformed { .. })));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = encode(&Assembly::default_cube());
        bytes.extend_from_slice(&[0, 0, 0]);
        assert!(matches!(decode(&bytes), Err(MemError::TrailingBytes(3))));
    }

    #[test]
    fn test_oversized_length_prefix_fails_fast() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(MemError::Malformed { offset: 12 })));
    }

    #[test]
    fn test_wrong_record_tag() {
        let mut bytes = encode(&Assembly::default_cube());
        // First part tag follows the 8-byte header and the part count.
        bytes[12..16].copy_from_slice(b"COMP");
        assert!(matches!(decode(&bytes), Err(MemError::Malformed { offset: 12 })));
    }

    #[test]
    fn test_dangling_part_index_is_rejected() {
        let mut bytes = encode(&Assembly::default_cube());
        let at = bytes.len() - 64 - 4;
        bytes[at..at + 4].copy_from_slice(&5u32.to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(MemError::Geometry(GeometryError::InvalidPartIndex { part_index: 5, .. }))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.mem");
        let asm = sample();
        save(&path, &asm).unwrap();
        assert_eq!(load(&path).unwrap(), asm);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.mem");
        match load(&path) {
            Err(MemError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected I/O error, got {other:?}"),
        }
    }
}
