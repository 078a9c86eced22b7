//! ASCII PLY surface loader
//!
//! Reads the `vertex` (x, y, z) and `face` (vertex_indices list) elements of
//! an ASCII PLY file, as exported by FreeSurfer/MNE tooling. Other elements
//! and properties are skipped. Polygons are fan-triangulated.

use std::path::Path;

use crate::error::{Result, ViewerError};
use crate::geometry::{Point3, Triangle};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlyMesh {
    pub vertices: Vec<Point3>,
    pub faces: Vec<Triangle>,
}

#[derive(Debug)]
enum Property {
    Scalar(String),
    List(String),
}

impl Property {
    fn name(&self) -> &str {
        match self {
            Property::Scalar(n) | Property::List(n) => n,
        }
    }
}

#[derive(Debug)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

/// Load an ASCII PLY file from disk
pub fn load_ascii(path: &Path) -> Result<PlyMesh> {
    let text = std::fs::read_to_string(path)?;
    let mesh = parse_ascii(&text)?;
    tracing::info!(
        "Loaded PLY {:?}: {} vertices, {} faces",
        path,
        mesh.vertices.len(),
        mesh.faces.len()
    );
    Ok(mesh)
}

pub fn parse_ascii(text: &str) -> Result<PlyMesh> {
    let mut lines = text.lines().enumerate();

    match lines.next() {
        Some((_, magic)) if magic.trim() == "ply" => {}
        _ => return Err(ViewerError::Parse("missing 'ply' magic line".into())),
    }

    let elements = parse_header(&mut lines)?;

    let mut body = lines
        .map(|(n, l)| (n + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let mut mesh = PlyMesh::default();

    for element in &elements {
        for _ in 0..element.count {
            let (line_no, line) = body.next().ok_or_else(|| {
                ViewerError::Parse(format!("unexpected end of data in element '{}'", element.name))
            })?;
            let values = parse_row(element, line, line_no)?;

            match element.name.as_str() {
                "vertex" => mesh.vertices.push(read_vertex(element, &values, line_no)?),
                "face" => read_face(element, &values, line_no, &mut mesh.faces)?,
                _ => {}
            }
        }
    }

    Ok(mesh)
}

fn parse_header<'a>(lines: &mut impl Iterator<Item = (usize, &'a str)>) -> Result<Vec<Element>> {
    let mut elements: Vec<Element> = Vec::new();

    for (n, raw) in lines.by_ref() {
        let line_no = n + 1;
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        match tokens.as_slice() {
            ["format", "ascii", _] => {}
            ["format", other, _] => {
                return Err(ViewerError::UnsupportedFormat(format!("PLY format '{}'", other)));
            }
            ["comment", ..] | ["obj_info", ..] | [] => {}
            ["element", name, count] => {
                let count = count.parse().map_err(|_| {
                    ViewerError::Parse(format!("line {}: bad element count '{}'", line_no, count))
                })?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            ["property", "list", _, _, name] => current(&mut elements, line_no)?
                .properties
                .push(Property::List(name.to_string())),
            ["property", _, name] => current(&mut elements, line_no)?
                .properties
                .push(Property::Scalar(name.to_string())),
            ["end_header"] => return Ok(elements),
            _ => {
                return Err(ViewerError::Parse(format!(
                    "line {}: unrecognized header line '{}'",
                    line_no, raw
                )));
            }
        }
    }

    Err(ViewerError::Parse("header has no end_header".into()))
}

fn current(elements: &mut [Element], line_no: usize) -> Result<&mut Element> {
    elements
        .last_mut()
        .ok_or_else(|| ViewerError::Parse(format!("line {}: property before any element", line_no)))
}

/// One row split per property: scalars yield one value, lists yield theirs
fn parse_row(element: &Element, line: &str, line_no: usize) -> Result<Vec<Vec<f64>>> {
    let mut tokens = line.split_whitespace();
    let mut row = Vec::with_capacity(element.properties.len());

    for prop in &element.properties {
        match prop {
            Property::Scalar(name) => {
                let tok = next_token(&mut tokens, name, line_no)?;
                row.push(vec![parse_number(tok, line_no)?]);
            }
            Property::List(name) => {
                let tok = next_token(&mut tokens, name, line_no)?;
                let len = tok.parse::<usize>().map_err(|_| {
                    ViewerError::Parse(format!("line {}: bad list length '{}'", line_no, tok))
                })?;
                let mut list = Vec::new();
                for _ in 0..len {
                    list.push(parse_number(next_token(&mut tokens, name, line_no)?, line_no)?);
                }
                row.push(list);
            }
        }
    }
    Ok(row)
}

fn next_token<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &str,
    line_no: usize,
) -> Result<&'a str> {
    tokens
        .next()
        .ok_or_else(|| ViewerError::Parse(format!("line {}: missing {}", line_no, what)))
}

fn parse_number(tok: &str, line_no: usize) -> Result<f64> {
    tok.parse::<f64>()
        .map_err(|_| ViewerError::Parse(format!("line {}: bad number '{}'", line_no, tok)))
}

fn read_vertex(element: &Element, values: &[Vec<f64>], line_no: usize) -> Result<Point3> {
    let mut point = [0.0f32; 3];
    for (axis, name) in ["x", "y", "z"].iter().enumerate() {
        let idx = element
            .properties
            .iter()
            .position(|p| p.name() == *name)
            .ok_or_else(|| ViewerError::Parse(format!("vertex element has no '{}' property", name)))?;
        point[axis] = values[idx]
            .first()
            .copied()
            .ok_or_else(|| ViewerError::Parse(format!("line {}: empty '{}'", line_no, name)))?
            as f32;
    }
    Ok(point)
}

fn read_face(
    element: &Element,
    values: &[Vec<f64>],
    line_no: usize,
    faces: &mut Vec<Triangle>,
) -> Result<()> {
    let idx = element
        .properties
        .iter()
        .position(|p| matches!(p, Property::List(n) if n == "vertex_indices" || n == "vertex_index"))
        .ok_or_else(|| ViewerError::Parse("face element has no vertex_indices list".into()))?;

    let polygon = values[idx]
        .iter()
        .map(|&v| {
            if v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&v) {
                Ok(v as u32)
            } else {
                Err(ViewerError::Parse(format!("line {}: bad vertex index {}", line_no, v)))
            }
        })
        .collect::<Result<Vec<u32>>>()?;
    if polygon.len() < 3 {
        return Err(ViewerError::Parse(format!(
            "line {}: face with {} vertices",
            line_no,
            polygon.len()
        )));
    }

    for i in 1..polygon.len() - 1 {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "ply
format ascii 1.0
comment unit square
element vertex 4
property float x
property float y
property float z
property uchar red
element face 1
property list uchar int vertex_indices
end_header
0 0 0 255
1 0 0 255
1 1 0 255
0 1 0 255
4 0 1 2 3
";

    #[test]
    fn test_parse_quad_fan_triangulates() {
        let mesh = parse_ascii(QUAD).unwrap();

        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.vertices[2], [1.0, 1.0, 0.0]);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_binary_rejected() {
        let text = "ply\nformat binary_little_endian 1.0\nend_header\n";
        assert!(matches!(parse_ascii(text), Err(ViewerError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_magic() {
        assert!(matches!(parse_ascii("format ascii 1.0\n"), Err(ViewerError::Parse(_))));
    }

    #[test]
    fn test_truncated_body() {
        let text = QUAD.replace("4 0 1 2 3\n", "");
        assert!(matches!(parse_ascii(&text), Err(ViewerError::Parse(_))));
    }

    #[test]
    fn test_negative_face_index_rejected() {
        let text = QUAD.replace("4 0 1 2 3", "3 0 1 -1");
        assert!(matches!(parse_ascii(&text), Err(ViewerError::Parse(_))));
    }

    #[test]
    fn test_fractional_face_index_rejected() {
        let text = QUAD.replace("4 0 1 2 3", "3 0 1.9 2");
        assert!(matches!(parse_ascii(&text), Err(ViewerError::Parse(_))));
    }

    #[test]
    fn test_fractional_list_length_rejected() {
        let text = QUAD.replace("4 0 1 2 3", "3.5 0 1 2");
        assert!(matches!(parse_ascii(&text), Err(ViewerError::Parse(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.ply");
        std::fs::write(&path, QUAD).unwrap();

        let mesh = load_ascii(&path).unwrap();
        assert_eq!(mesh.faces.len(), 2);
    }
}
