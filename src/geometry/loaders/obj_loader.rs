//! OBJ 文件加载器
//!
//! 使用 tobj crate 加载 Wavefront OBJ 格式的3D模型及其 MTL 材质和纹理。

use super::MeshLoader;
use crate::core::error::{LoadError, Result};
use crate::geometry::document::{GeometryDocument, Scene};
use crate::geometry::material::{Material, Texture};
use crate::geometry::mesh::MeshData;
use crate::geometry::vertex::Vertex;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// OBJ 格式加载器
///
/// # 特性
///
/// - 多边形按扇形三角化
/// - 每个唯一的 `v/vt/vn` 组合成为一个顶点，不做额外的顶点合并
/// - UV 坐标原样保留（不翻转 V 轴）；同一对象中缺少 `vt` 的面顶点填充 `[0, 0]`
/// - 缺失的法线不会被重建；只有部分面顶点带法线时丢弃该对象的法线
/// - 每个对象 / 材质分组成为场景中的一个网格
///
/// # 使用示例
///
/// ```rust,no_run
/// use mesh_concat::geometry::loaders::{MeshLoader, ObjLoader};
/// use std::path::Path;
///
/// let document = ObjLoader::load_from_file(Path::new("model.obj"))?;
/// println!("加载了 {} 个网格", document.mesh_count());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ObjLoader;

impl ObjLoader {
    fn load_options() -> tobj::LoadOptions {
        tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        }
    }
}

impl MeshLoader for ObjLoader {
    fn load_from_file(path: &Path) -> Result<GeometryDocument> {
        if !path.exists() {
            return Err(LoadError::FileNotFound(path.to_path_buf()).into());
        }

        let source = std::fs::read(path).map_err(|e| LoadError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let tagged = tag_missing_attributes(&String::from_utf8_lossy(&source));

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let (models, materials) = tobj::load_obj_buf(
            &mut Cursor::new(tagged.as_bytes()),
            &Self::load_options(),
            |mtl_path| tobj::load_mtl(base_dir.join(mtl_path)),
        )
        .map_err(|e| LoadError::ParseError {
            path: path.to_path_buf(),
            reason: format!("tobj: {}", e),
        })?;

        let materials = match materials {
            Ok(materials) => materials
                .iter()
                .map(|m| Arc::new(convert_material(m, base_dir)))
                .collect(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load material library, continuing without materials");
                Vec::new()
            }
        };

        let fallback_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unnamed");

        let document = build_document(path, models, &materials, fallback_name)?;

        info!(
            path = %path.display(),
            kind = document.kind(),
            meshes = document.mesh_count(),
            materials = materials.len(),
            "OBJ file loaded"
        );

        Ok(document)
    }

    fn load_from_memory(data: &[u8]) -> Result<GeometryDocument> {
        let source = Path::new("<memory>");
        let tagged = tag_missing_attributes(&String::from_utf8_lossy(data));
        let mut reader = Cursor::new(tagged.as_bytes());

        // 内存数据没有所在目录，材质库无法解析
        let (models, materials) = tobj::load_obj_buf(&mut reader, &Self::load_options(), |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .map_err(|e| LoadError::ParseError {
            path: source.to_path_buf(),
            reason: format!("tobj: {}", e),
        })?;

        if materials.is_err() {
            debug!("Material library referenced from in-memory OBJ is ignored");
        }

        build_document(source, models, &[], "Unnamed")
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["obj"]
    }
}

/// 根据模型数量决定文档形态
///
/// 恰好一个模型时为单网格，否则为场景（零个模型得到空场景）。
fn build_document(
    path: &Path,
    mut models: Vec<tobj::Model>,
    materials: &[Arc<Material>],
    fallback_name: &str,
) -> Result<GeometryDocument> {
    if models.len() == 1 {
        if let Some(model) = models.pop() {
            let mesh = convert_model(path, model, materials, fallback_name)?;
            return Ok(GeometryDocument::Mesh(mesh));
        }
    }

    let mut scene = Scene::new();
    for model in models {
        let mesh = convert_model(path, model, materials, fallback_name)?;
        let name = mesh.display_name().to_string();
        scene.insert(name, mesh);
    }

    Ok(GeometryDocument::Scene(scene))
}

/// 将 tobj 的模型转换为 `MeshData`
fn convert_model(
    path: &Path,
    model: tobj::Model,
    materials: &[Arc<Material>],
    fallback_name: &str,
) -> Result<MeshData> {
    let name = if model.name.trim().is_empty() {
        fallback_name.to_string()
    } else {
        model.name
    };
    let mesh = model.mesh;

    let invalid = |reason: String| LoadError::ParseError {
        path: path.to_path_buf(),
        reason: format!("object '{}': {}", name, reason),
    };

    if mesh.positions.len() % 3 != 0 {
        return Err(invalid(format!(
            "incomplete position data: {} floats",
            mesh.positions.len()
        ))
        .into());
    }

    let vertex_count = mesh.positions.len() / 3;
    let texcoord_at = |i: usize| -> Option<[f32; 2]> {
        let uv = mesh.texcoords.get(i * 2..i * 2 + 2)?;
        (!uv[0].is_nan() && !uv[1].is_nan()).then(|| [uv[0], uv[1]])
    };
    let normal_at = |i: usize| -> Option<[f32; 3]> {
        let n = mesh.normals.get(i * 3..i * 3 + 3)?;
        n.iter().all(|c| !c.is_nan()).then(|| [n[0], n[1], n[2]])
    };

    let texcoord_count = (0..vertex_count).filter(|&i| texcoord_at(i).is_some()).count();
    let normal_count = (0..vertex_count).filter(|&i| normal_at(i).is_some()).count();
    let has_texcoords = texcoord_count > 0;
    let has_normals = vertex_count > 0 && normal_count == vertex_count;

    if has_texcoords && texcoord_count < vertex_count {
        warn!(
            object = %name,
            authored = texcoord_count,
            vertices = vertex_count,
            "Some faces have no texture coordinates, padding them with [0, 0]"
        );
    }
    if normal_count > 0 && !has_normals {
        warn!(
            object = %name,
            authored = normal_count,
            vertices = vertex_count,
            "Some faces have no normals, dropping normals for this object"
        );
    }

    let mut data = MeshData::with_name(name.clone());
    data.has_normals = has_normals;
    data.has_texcoords = has_texcoords;
    data.vertices = (0..vertex_count)
        .map(|i| {
            let position = [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ];
            let normal = if has_normals {
                normal_at(i).unwrap_or_default()
            } else {
                [0.0, 0.0, 0.0]
            };
            let texcoord = texcoord_at(i).unwrap_or_default();

            Vertex::new(position, normal, texcoord)
        })
        .collect();
    data.indices = mesh.indices;

    let material = mesh
        .material_id
        .and_then(|id| materials.get(id))
        .cloned();
    data.set_single_subset(material);

    data.validate().map_err(invalid)?;

    debug!(
        name = %name,
        vertices = data.vertex_count(),
        triangles = data.triangle_count(),
        normals = has_normals,
        texcoords = has_texcoords,
        "OBJ object converted"
    );

    Ok(data)
}

/// 缺失纹理坐标的面顶点引用的占位记录
const MISSING_TEXCOORD: &str = "vt NaN NaN";

/// 缺失法线的面顶点引用的占位记录
const MISSING_NORMAL: &str = "vn NaN NaN NaN";

/// 让每个面顶点都带上 `vt` 和 `vn` 引用
///
/// tobj 在单索引模式下只为带 `vt` 的顶点写纹理坐标，同一对象中部分面
/// 缺少 `vt` 时纹理坐标数组会与顶点错位。这里在文件开头插入 NaN 占位
/// 记录，把缺失的引用指向占位记录，已有的正索引后移一位（相对索引不变），
/// 转换时再把 NaN 识别为“未提供”。
fn tag_missing_attributes(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + source.len() / 4 + 32);
    out.push_str(MISSING_TEXCOORD);
    out.push('\n');
    out.push_str(MISSING_NORMAL);
    out.push('\n');

    for line in source.lines() {
        let mut words = line.split_whitespace();
        match words.next() {
            Some(keyword @ ("f" | "l")) => {
                out.push_str(keyword);
                for corner in words {
                    out.push(' ');
                    out.push_str(&tag_corner(corner));
                }
            }
            _ => out.push_str(line),
        }
        out.push('\n');
    }

    out
}

/// `v`、`v/vt`、`v//vn`、`v/vt/vn` 统一改写为 `v/vt/vn`
fn tag_corner(corner: &str) -> String {
    let mut parts = corner.split('/');
    let position = parts.next().unwrap_or_default();
    let texcoord = shift_index(parts.next());
    let normal = shift_index(parts.next());
    format!("{}/{}/{}", position, texcoord, normal)
}

fn shift_index(index: Option<&str>) -> String {
    match index.filter(|s| !s.is_empty()) {
        None => "1".to_string(),
        Some(s) => match s.parse::<i64>() {
            Ok(i) if i > 0 => (i + 1).to_string(),
            _ => s.to_string(),
        },
    }
}

/// 将 tobj 的材质转换为 `Material`，并解码漫反射纹理
///
/// 纹理无法读取时记录警告并丢弃纹理，材质本身保留。
fn convert_material(material: &tobj::Material, base_dir: &Path) -> Material {
    let diffuse_texture = material
        .diffuse_texture
        .as_deref()
        .and_then(|spec| resolve_texture_path(base_dir, spec))
        .and_then(|texture_path| match Texture::load(&texture_path) {
            Ok(texture) => {
                debug!(
                    material = %material.name,
                    path = %texture_path.display(),
                    width = texture.width(),
                    height = texture.height(),
                    "Texture loaded"
                );
                Some(texture)
            }
            Err(e) => {
                warn!(
                    material = %material.name,
                    path = %texture_path.display(),
                    error = %e,
                    "Failed to load texture, material kept without it"
                );
                None
            }
        });

    Material {
        name: material.name.clone(),
        ambient: material.ambient,
        diffuse: material.diffuse,
        specular: material.specular,
        shininess: material.shininess,
        dissolve: material.dissolve,
        diffuse_texture,
    }
}

/// 解析 `map_Kd` 中的纹理路径
///
/// 选项（如 `-s 1 1 1`）位于文件名之前，文件名取最后一个字段。
fn resolve_texture_path(base_dir: &Path, spec: &str) -> Option<PathBuf> {
    let file = spec.split_whitespace().last()?;
    let file = file.replace('\\', "/");
    Some(base_dir.join(file))
}
