//! PLY (Stanford polygon) format support.
//!
//! Meshes are read with their anatomical tag scalar, attached either to the
//! `vertex` or to the `face` element. Polygons are fan-triangulated; a face tag
//! is copied to every triangle of its polygon. Coordinate submeshes are written
//! as ASCII PLY with `alpha`, `beta` and `original_index` vertex properties.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::artifact::CoordinateSubmesh;
use crate::error::{Result, UacError};
use crate::mesh::{build_from_triangles, AnatomicalTags, HalfEdgeMesh, TagAssociation};

/// Which scalar to read as anatomical tags.
#[derive(Debug, Clone, Copy)]
pub struct TagProperty<'a> {
    /// Property name.
    pub name: &'a str,
    /// Element the property belongs to.
    pub association: TagAssociation,
}

/// Load an untagged mesh from a PLY file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    read(&mut BufReader::new(File::open(path)?), path, None)
}

/// Load a mesh and its anatomical tags from a PLY file.
///
/// ```no_run
/// use atrium::io::ply::{self, TagProperty};
/// use atrium::mesh::TagAssociation;
///
/// let tags = TagProperty { name: "anatomical_tags", association: TagAssociation::Face };
/// let mesh = ply::load_tagged("atrium.ply", tags).unwrap();
/// assert!(mesh.tags().is_some());
/// ```
pub fn load_tagged<P: AsRef<Path>>(path: P, tags: TagProperty<'_>) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    read(&mut BufReader::new(File::open(path)?), path, Some(tags))
}

/// Read a mesh from any PLY source. `origin` labels errors.
pub fn read<R: Read>(source: &mut R, origin: &Path, tags: Option<TagProperty<'_>>) -> Result<HalfEdgeMesh> {
    let fail = |message: String| UacError::LoadError {
        path: origin.to_path_buf(),
        message,
    };

    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(source).map_err(|e| fail(e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| fail("PLY file has no vertex element".to_string()))?;
    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| fail("PLY file has no face element".to_string()))?;

    let mut vertices = Vec::with_capacity(vertex_element.len());
    for (i, vertex) in vertex_element.iter().enumerate() {
        let coord = |axis: &str| {
            float_property(vertex, axis).ok_or_else(|| fail(format!("vertex {i} has no {axis} coordinate")))
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
    }

    let face_tag_name = tags.filter(|t| t.association == TagAssociation::Face).map(|t| t.name);
    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
    let mut face_tags = Vec::new();
    for (i, face) in face_element.iter().enumerate() {
        let indices = list_property(face, "vertex_indices")
            .or_else(|| list_property(face, "vertex_index"))
            .ok_or_else(|| fail(format!("face {i} has no vertex_indices property")))?;
        if indices.len() < 3 {
            return Err(fail(format!("face {i} has only {} vertices", indices.len())));
        }
        let tag = match face_tag_name {
            Some(name) => Some(
                tag_property(face, name).ok_or_else(|| fail(format!("face {i} has no tag property '{name}'")))?,
            ),
            None => None,
        };
        for k in 1..indices.len() - 1 {
            faces.push([indices[0], indices[k], indices[k + 1]]);
            face_tags.extend(tag);
        }
    }

    let mesh = build_from_triangles(&vertices, &faces)?;
    log::debug!(
        "read {} vertices and {} triangles from {}",
        mesh.num_vertices(),
        mesh.num_faces(),
        origin.display()
    );

    match tags {
        None => Ok(mesh),
        Some(TagProperty {
            association: TagAssociation::Face,
            ..
        }) => mesh.with_tags(AnatomicalTags::new(TagAssociation::Face, face_tags)),
        Some(TagProperty {
            name,
            association: TagAssociation::Vertex,
        }) => {
            let values = vertex_element
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    tag_property(v, name).ok_or_else(|| fail(format!("vertex {i} has no tag property '{name}'")))
                })
                .collect::<Result<Vec<_>>>()?;
            mesh.with_tags(AnatomicalTags::new(TagAssociation::Vertex, values))
        }
    }
}

fn float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

/// Integer tags; floating point tags are rounded.
fn tag_property(element: &DefaultElement, name: &str) -> Option<i32> {
    match element.get(name)? {
        Property::Int(v) => Some(*v),
        Property::UInt(v) => i32::try_from(*v).ok(),
        Property::Short(v) => Some(*v as i32),
        Property::UShort(v) => Some(*v as i32),
        Property::Char(v) => Some(*v as i32),
        Property::UChar(v) => Some(*v as i32),
        Property::Float(v) => Some(v.round() as i32),
        Property::Double(v) => Some(v.round() as i32),
        _ => None,
    }
}

fn list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Write a coordinate submesh as ASCII PLY.
pub fn write_coordinate_submesh<W: Write>(
    writer: &mut W,
    mesh: &HalfEdgeMesh,
    result: &CoordinateSubmesh,
) -> Result<()> {
    let submesh = &result.submesh;

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by atrium")?;
    writeln!(writer, "element vertex {}", submesh.vertices.len())?;
    for axis in ["x", "y", "z"] {
        writeln!(writer, "property double {axis}")?;
    }
    writeln!(writer, "property double alpha")?;
    writeln!(writer, "property double beta")?;
    writeln!(writer, "property int original_index")?;
    writeln!(writer, "element face {}", submesh.faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "property int original_index")?;
    writeln!(writer, "end_header")?;

    for (local, &v) in submesh.vertices.iter().enumerate() {
        let p = mesh.position(v);
        writeln!(
            writer,
            "{} {} {} {} {} {}",
            p.x,
            p.y,
            p.z,
            result.alpha[local],
            result.beta[local],
            v.index()
        )?;
    }
    for (f, global) in submesh.faces.iter().zip(&submesh.face_indices) {
        writeln!(writer, "3 {} {} {} {}", f[0], f[1], f[2], global.index())?;
    }
    Ok(())
}

/// Save a coordinate submesh to a PLY file.
pub fn save_coordinate_submesh<P: AsRef<Path>>(
    mesh: &HalfEdgeMesh,
    result: &CoordinateSubmesh,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_coordinate_submesh(&mut writer, mesh, result)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::region::submesh_from_faces;
    use crate::mesh::FaceId;

    /// A unit square split into one quad (tag 7) and, on the vertex
    /// element, per-vertex tags.
    const SQUARE: &str = "ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
property int region
element face 1
property list uchar int vertex_indices
property uchar region
end_header
0 0 0 1
1 0 0 1
1 1 0 2
0 1 0 2
4 0 1 2 3 7
";

    fn read_square(tags: Option<TagProperty<'_>>) -> Result<HalfEdgeMesh> {
        read(&mut SQUARE.as_bytes(), Path::new("square.ply"), tags)
    }

    #[test]
    fn test_quad_is_fan_triangulated_with_face_tags() {
        let mesh = read_square(Some(TagProperty {
            name: "region",
            association: TagAssociation::Face,
        }))
        .unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        let tags = mesh.tags().unwrap();
        assert_eq!(tags.values(), &[7, 7]);
        assert_eq!(tags.association(), TagAssociation::Face);
    }

    #[test]
    fn test_vertex_tags() {
        let mesh = read_square(Some(TagProperty {
            name: "region",
            association: TagAssociation::Vertex,
        }))
        .unwrap();
        assert_eq!(mesh.tags().unwrap().values(), &[1, 1, 2, 2]);
    }

    #[test]
    fn test_missing_tag_property() {
        let err = read_square(Some(TagProperty {
            name: "anatomical_tags",
            association: TagAssociation::Vertex,
        }))
        .unwrap_err();
        assert!(matches!(err, UacError::LoadError { .. }));
        assert!(err.to_string().contains("anatomical_tags"));
    }

    #[test]
    fn test_untagged() {
        let mesh = read_square(None).unwrap();
        assert!(mesh.tags().is_none());
    }

    #[test]
    fn test_write_coordinate_submesh() {
        let mesh = read_square(None).unwrap();
        let submesh = submesh_from_faces(&mesh, vec![FaceId::new(1)]);
        let result = CoordinateSubmesh {
            alpha: vec![0.0, 0.5, 1.0],
            beta: vec![1.0, 0.5, 0.0],
            submesh,
        };

        let mut out = Vec::new();
        write_coordinate_submesh(&mut out, &mesh, &result).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("element vertex 3\n"));
        assert!(text.contains("property double alpha\n"));
        // Second fan triangle is 0 2 3; its local faces reference 0 1 2.
        assert!(text.ends_with("3 0 1 2 1\n"));
        assert!(text.contains("1 1 0 0.5 0.5 2\n"));
    }
}
