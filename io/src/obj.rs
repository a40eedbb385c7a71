//! A minimal Wavefront OBJ loader (spec §4.9): positions (`v`), normals
//! (`vn`), texture coordinates (`vt`), and triangular faces (`f`). Faces with
//! more than three vertices are fan-triangulated; missing normals are filled
//! in afterward as the (unnormalized-then-normalized) area-weighted average
//! of each vertex's incident face normals, missing UVs default to `(0, 0)`.

use std::sync::Arc;

use core::error::AssetError;
use core::mesh::TriangleMesh;
use core::vec::{Point2f, Vec3f};

pub fn parse(name: &str, source: &str) -> Result<Arc<TriangleMesh>, AssetError> {
    let mut positions: Vec<Vec3f> = Vec::new();
    let mut raw_normals: Vec<Vec3f> = Vec::new();
    let mut raw_uvs: Vec<Point2f> = Vec::new();
    let mut indices: Vec<[u32; 3]> = Vec::new();
    let mut has_normals = false;

    // Per-vertex (position-indexed) normal/uv, filled in from the first face
    // corner that references that position — OBJ indices are per-attribute,
    // but `core::mesh::TriangleMesh` uses one shared index per corner, so we
    // flatten to "one attribute set per position" on first sight.
    let mut vertex_normal: Vec<Option<Vec3f>> = Vec::new();
    let mut vertex_uv: Vec<Option<Point2f>> = Vec::new();

    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut it = line.split_whitespace();
        let Some(tag) = it.next() else { continue };
        let rest: Vec<&str> = it.collect();
        match tag {
            "v" => {
                let p = parse_vec3(name, &rest)?;
                positions.push(p);
                vertex_normal.push(None);
                vertex_uv.push(None);
            }
            "vn" => {
                raw_normals.push(parse_vec3(name, &rest)?);
                has_normals = true;
            }
            "vt" => {
                if rest.len() < 2 {
                    return Err(malformed(name, "vt needs at least 2 components"));
                }
                raw_uvs.push(Point2f::new(parse_f32(name, rest[0])?, parse_f32(name, rest[1])?));
            }
            "f" => {
                let corners: Result<Vec<(u32, Option<u32>, Option<u32>)>, AssetError> =
                    rest.iter().map(|tok| parse_face_corner(name, tok)).collect();
                let corners = corners?;
                if corners.len() < 3 {
                    return Err(malformed(name, "face needs at least 3 vertices"));
                }
                for corner in &corners {
                    let (pi, ui, ni) = *corner;
                    if vertex_uv[pi as usize].is_none() {
                        vertex_uv[pi as usize] = ui.map(|i| raw_uvs[i as usize]);
                    }
                    if vertex_normal[pi as usize].is_none() {
                        vertex_normal[pi as usize] = ni.map(|i| raw_normals[i as usize]);
                    }
                }
                for i in 1..corners.len() - 1 {
                    indices.push([corners[0].0, corners[i].0, corners[i + 1].0]);
                }
            }
            _ => {}
        }
    }

    if positions.is_empty() || indices.is_empty() {
        return Err(malformed(name, "mesh has no geometry"));
    }

    let mut accum_normal = vec![Vec3f::splat(0.0); positions.len()];
    if !has_normals {
        for face in &indices {
            let [p0, p1, p2] = [positions[face[0] as usize], positions[face[1] as usize], positions[face[2] as usize]];
            let n = (p1 - p0).cross(p2 - p0);
            for &vi in face {
                accum_normal[vi as usize] += n;
            }
        }
    }

    let normals: Vec<Vec3f> = (0..positions.len())
        .map(|i| match vertex_normal[i] {
            Some(n) => n.normalize(),
            None => {
                let n = accum_normal[i];
                if n.length() > 0.0 {
                    n.normalize()
                } else {
                    Vec3f::new(0.0, 0.0, 1.0)
                }
            }
        })
        .collect();

    let uvs: Vec<Point2f> = (0..positions.len()).map(|i| vertex_uv[i].unwrap_or(Point2f::new(0.0, 0.0))).collect();

    Ok(Arc::new(TriangleMesh::new(positions, normals, uvs, indices)))
}

fn parse_vec3(name: &str, rest: &[&str]) -> Result<Vec3f, AssetError> {
    if rest.len() < 3 {
        return Err(malformed(name, "expected 3 components"));
    }
    Ok(Vec3f::new(parse_f32(name, rest[0])?, parse_f32(name, rest[1])?, parse_f32(name, rest[2])?))
}

fn parse_f32(name: &str, tok: &str) -> Result<f32, AssetError> {
    tok.parse::<f32>().map_err(|_| malformed(name, &format!("`{tok}` is not a number")))
}

/// Parses one `f` token of the form `p`, `p/t`, `p//n`, or `p/t/n` (1-based,
/// negative indices meaning "relative to the end" are not supported).
fn parse_face_corner(name: &str, tok: &str) -> Result<(u32, Option<u32>, Option<u32>), AssetError> {
    let mut parts = tok.split('/');
    let p = parts
        .next()
        .ok_or_else(|| malformed(name, "empty face corner"))?
        .parse::<u32>()
        .map_err(|_| malformed(name, &format!("`{tok}` has a non-numeric position index")))?;
    let t = parts.next().filter(|s| !s.is_empty()).map(|s| s.parse::<u32>()).transpose().map_err(|_| malformed(name, &format!("`{tok}` has a non-numeric uv index")))?;
    let n = parts.next().filter(|s| !s.is_empty()).map(|s| s.parse::<u32>()).transpose().map_err(|_| malformed(name, &format!("`{tok}` has a non-numeric normal index")))?;
    Ok((p - 1, t.map(|i| i - 1), n.map(|i| i - 1)))
}

fn malformed(name: &str, reason: &str) -> AssetError {
    AssetError::MeshParse {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_triangle_with_explicit_normals() {
        let src = "v -1 -1 0\nv 1 -1 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let mesh = parse("tri", src).expect("should parse");
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_vertices(), 3);
        assert!((mesh.normal(0) - Vec3f::new(0.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn fan_triangulates_a_quad() {
        let src = "v -1 -1 0\nv 1 -1 0\nv 1 1 0\nv -1 1 0\nf 1 2 3 4\n";
        let mesh = parse("quad", src).expect("should parse");
        assert_eq!(mesh.num_faces(), 2);
    }

    #[test]
    fn derives_a_normal_when_none_is_given() {
        let src = "v -1 -1 0\nv 1 -1 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = parse("tri", src).expect("should parse");
        assert!((mesh.normal(0) - Vec3f::new(0.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn rejects_a_mesh_with_no_faces() {
        let src = "v 0 0 0\n";
        assert!(parse("empty", src).is_err());
    }
}
