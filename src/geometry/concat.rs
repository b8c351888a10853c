//! 网格合并
//!
//! 将多个网格的顶点和索引缓冲区拼接成一个网格，并把每个来源网格的
//! 面索引偏移到合并后的顶点空间。每个来源子网格保留自己的材质绑定，
//! 同一个材质（同一个 `Arc`）在结果中只保存一份。
//!
//! # 属性合并规则
//!
//! - 纹理坐标：任一来源带 UV 即保留 UV，不带 UV 的来源填充 `[0, 0]`
//! - 法线：只有所有非空来源都带法线时才保留，否则整体丢弃（不重新计算）

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::error::ConcatenationError;

use super::material::Material;
use super::mesh::{MeshData, Subset};

/// 合并多个网格
///
/// 输入顺序即输出顺序：第 k 个网格的面索引偏移量为前 k 个网格的顶点总数。
///
/// # 错误
///
/// - `Empty`：没有输入网格
/// - `InvalidMesh`：某个输入网格未通过校验
/// - `IndexOverflow`：合并后的顶点数超出 32 位索引范围
pub fn concatenate(meshes: Vec<MeshData>) -> Result<MeshData, ConcatenationError> {
    if meshes.is_empty() {
        return Err(ConcatenationError::Empty);
    }

    for mesh in &meshes {
        mesh.validate()
            .map_err(|reason| ConcatenationError::InvalidMesh {
                name: mesh.display_name().to_string(),
                reason,
            })?;
    }

    let total_vertices: usize = meshes.iter().map(MeshData::vertex_count).sum();
    let total_indices: usize = meshes.iter().map(MeshData::index_count).sum();
    if total_vertices > u32::MAX as usize {
        return Err(ConcatenationError::IndexOverflow {
            vertex_count: total_vertices,
        });
    }

    let has_texcoords = meshes.iter().any(|m| m.has_texcoords);
    let mut non_empty = meshes.iter().filter(|m| m.vertex_count() > 0).peekable();
    let has_normals = non_empty.peek().is_some() && non_empty.all(|m| m.has_normals);

    if !has_normals && meshes.iter().any(|m| m.has_normals) {
        warn!("Not every mesh carries normals, dropping normals from the combined mesh");
    }

    let mut combined = MeshData::with_capacity(total_vertices, total_indices);
    combined.has_texcoords = has_texcoords;
    combined.has_normals = has_normals;

    for mesh in meshes {
        append(&mut combined, mesh);
    }

    debug!(
        vertices = combined.vertex_count(),
        triangles = combined.triangle_count(),
        subsets = combined.subsets.len(),
        materials = combined.materials.len(),
        "Meshes concatenated"
    );

    Ok(combined)
}

/// 将一个网格追加到合并结果末尾
fn append(combined: &mut MeshData, mesh: MeshData) {
    let vertex_offset = combined.vertex_count() as u32;
    let face_offset = combined.triangle_count() as u32;

    let material_remap: Vec<usize> = mesh
        .materials
        .iter()
        .map(|material| intern_material(&mut combined.materials, material))
        .collect();

    let subsets = if mesh.subsets.is_empty() && mesh.triangle_count() > 0 {
        vec![Subset::new(
            None,
            0,
            mesh.vertex_count() as u32,
            0,
            mesh.triangle_count() as u32,
        )]
    } else {
        mesh.subsets
    };

    combined.subsets.extend(subsets.into_iter().map(|subset| Subset {
        material: subset.material.map(|i| material_remap[i]),
        vertex_start: subset.vertex_start + vertex_offset,
        face_start: subset.face_start + face_offset,
        ..subset
    }));

    let pad_texcoords = combined.has_texcoords && !mesh.has_texcoords;
    combined.vertices.extend(mesh.vertices.into_iter().map(|mut vertex| {
        if pad_texcoords {
            vertex.texcoord = [0.0, 0.0];
        }
        vertex
    }));

    combined
        .indices
        .extend(mesh.indices.iter().map(|&index| index + vertex_offset));
}

/// 返回材质在合并列表中的位置，不存在时追加
fn intern_material(materials: &mut Vec<Arc<Material>>, material: &Arc<Material>) -> usize {
    match materials.iter().position(|m| Arc::ptr_eq(m, material)) {
        Some(index) => index,
        None => {
            materials.push(Arc::clone(material));
            materials.len() - 1
        }
    }
}
