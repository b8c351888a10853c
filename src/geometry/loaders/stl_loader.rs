//! STL 文件加载器
//!
//! 自动识别 ASCII 与二进制格式。STL 没有对象划分，结果总是单网格。
//! 每个三角面片产生三个独立的顶点（不合并共享位置的顶点），
//! 面片法线写入这三个顶点的法线。

use super::MeshLoader;
use crate::core::error::{LoadError, Result};
use crate::geometry::document::GeometryDocument;
use crate::geometry::mesh::MeshData;
use crate::geometry::vertex::Vertex;
use std::path::Path;
use tracing::info;

/// 二进制 STL 头部长度
const HEADER_LEN: usize = 80;

/// 二进制 STL 每个三角形记录的长度
const RECORD_LEN: usize = 50;

/// STL 格式加载器
pub struct StlLoader;

impl MeshLoader for StlLoader {
    fn load_from_file(path: &Path) -> Result<GeometryDocument> {
        if !path.exists() {
            return Err(LoadError::FileNotFound(path.to_path_buf()).into());
        }

        let data = std::fs::read(path).map_err(|e| LoadError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut mesh = parse_stl(path, &data)?;
        mesh.name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string);

        info!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "STL file loaded"
        );

        Ok(GeometryDocument::Mesh(mesh))
    }

    fn load_from_memory(data: &[u8]) -> Result<GeometryDocument> {
        parse_stl(Path::new("<memory>"), data).map(GeometryDocument::Mesh)
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["stl"]
    }
}

fn parse_stl(path: &Path, data: &[u8]) -> Result<MeshData> {
    let mut mesh = if is_binary(data) {
        parse_binary(data)
    } else if is_ascii(data) {
        parse_ascii(path, data)?
    } else {
        return Err(LoadError::ParseError {
            path: path.to_path_buf(),
            reason: "neither a binary nor an ASCII STL file".to_string(),
        }
        .into());
    };

    mesh.set_single_subset(None);
    Ok(mesh)
}

/// 文件长度与头部声明的三角形数量一致时视为二进制格式
///
/// 部分二进制文件的头部也以 "solid" 开头，所以先检查长度。
fn is_binary(data: &[u8]) -> bool {
    if data.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = triangle_count(data) as usize;
    data.len() == HEADER_LEN + 4 + count * RECORD_LEN
}

fn is_ascii(data: &[u8]) -> bool {
    let text = String::from_utf8_lossy(&data[..data.len().min(HEADER_LEN)]);
    text.trim_start().starts_with("solid")
}

fn triangle_count(data: &[u8]) -> u32 {
    u32::from_le_bytes([
        data[HEADER_LEN],
        data[HEADER_LEN + 1],
        data[HEADER_LEN + 2],
        data[HEADER_LEN + 3],
    ])
}

/// 读取三个小端 f32
fn read_vec3(bytes: &[u8]) -> [f32; 3] {
    let mut out = [0.0; 3];
    for (dst, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        *dst = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    out
}

fn parse_binary(data: &[u8]) -> MeshData {
    let count = triangle_count(data) as usize;
    let mut mesh = MeshData::with_capacity(count * 3, count * 3);
    let mut all_normals = count > 0;

    for record in data[HEADER_LEN + 4..].chunks_exact(RECORD_LEN) {
        let normal = read_vec3(&record[0..12]);
        all_normals &= normal != [0.0, 0.0, 0.0];

        for corner in 0..3 {
            let offset = 12 + corner * 12;
            let position = read_vec3(&record[offset..offset + 12]);
            mesh.indices.push(mesh.vertices.len() as u32);
            mesh.vertices.push(Vertex::new(position, normal, [0.0, 0.0]));
        }
    }

    mesh.has_normals = all_normals;
    mesh
}

fn parse_ascii(path: &Path, data: &[u8]) -> Result<MeshData> {
    let text = String::from_utf8_lossy(data);
    let mut mesh = MeshData::new();
    let mut normal = [0.0; 3];
    let mut facet: Vec<[f32; 3]> = Vec::with_capacity(3);
    let mut all_normals = true;

    let error = |line: usize, reason: &str| LoadError::ParseError {
        path: path.to_path_buf(),
        reason: format!("line {}: {}", line + 1, reason),
    };

    for (line_no, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("facet") => {
                // facet normal nx ny nz
                let values: Vec<&str> = parts.skip(1).collect();
                normal = parse_triplet(&values).ok_or_else(|| error(line_no, "invalid facet normal"))?;
                facet.clear();
            }
            Some("vertex") => {
                let values: Vec<&str> = parts.collect();
                let position =
                    parse_triplet(&values).ok_or_else(|| error(line_no, "invalid vertex"))?;
                facet.push(position);
            }
            Some("endfacet") => {
                if facet.len() != 3 {
                    return Err(error(
                        line_no,
                        &format!("facet has {} vertices, expected 3", facet.len()),
                    )
                    .into());
                }
                all_normals &= normal != [0.0, 0.0, 0.0];
                for position in facet.drain(..) {
                    mesh.indices.push(mesh.vertices.len() as u32);
                    mesh.vertices.push(Vertex::new(position, normal, [0.0, 0.0]));
                }
            }
            _ => {}
        }
    }

    mesh.has_normals = all_normals && !mesh.vertices.is_empty();
    Ok(mesh)
}

fn parse_triplet(values: &[&str]) -> Option<[f32; 3]> {
    if values.len() < 3 {
        return None;
    }
    Some([
        values[0].parse().ok()?,
        values[1].parse().ok()?,
        values[2].parse().ok()?,
    ])
}
