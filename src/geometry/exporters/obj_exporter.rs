//! Wavefront OBJ 导出器
//!
//! 写出 `v` / `vt` / `vn` / `f` 记录，每个带材质的子网格前写 `usemtl`。
//! 网格有材质时在 OBJ 旁写出 `<stem>.mtl`，带纹理的材质写出
//! `<texture_prefix>_<k>.png`（k 为纹理序号，从 0 开始）。

use super::{MeshExporter, StagedFiles};
use crate::core::config::ExportConfig;
use crate::core::error::{ExportError, Result};
use crate::geometry::material::{Material, Texture};
use crate::geometry::mesh::MeshData;
use image::{DynamicImage, ImageFormat};
use std::borrow::Cow;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// 没有材质的面与有材质的面混合时使用的材质名
const DEFAULT_MATERIAL: &str = "default";

/// OBJ 格式导出器
pub struct ObjExporter;

/// MTL 中的一条材质记录
struct MtlEntry<'a> {
    name: String,
    material: Option<&'a Material>,
    texture_file: Option<String>,
}

impl MeshExporter for ObjExporter {
    fn export_to_file(mesh: &MeshData, path: &Path, config: &ExportConfig) -> Result<Vec<PathBuf>> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ExportError::UnsupportedFormat(format!("{} has no file name", path.display()))
            })?;
        let directory = path.parent().unwrap_or_else(|| Path::new(""));

        let face_materials = face_material_slots(mesh);
        let uses_materials = face_materials.iter().any(Option::is_some);
        let needs_default = uses_materials && face_materials.iter().any(Option::is_none);

        let mut staged = StagedFiles::new();
        let obj_writer = staged.create(path)?;

        let mut mtl_entries = Vec::new();
        let mut mtl_file = None;
        if uses_materials {
            let textures = write_textures(mesh, directory, &config.texture_prefix, &mut staged)?;
            mtl_entries = material_entries(mesh, textures, needs_default);

            let mtl_name = format!("{}.mtl", stem);
            let mtl_path = directory.join(&mtl_name);
            let mut w = staged.create(&mtl_path)?;
            write_mtl(&mut w, &mtl_entries)
                .and_then(|_| w.flush())
                .map_err(|e| ExportError::io(&mtl_path, e))?;
            mtl_file = Some(mtl_name);
        }

        let write_normals = mesh.has_normals && config.write_normals;
        let mut w = obj_writer;
        write_obj(
            &mut w,
            mesh,
            mtl_file.as_deref(),
            &face_materials,
            &mtl_entries,
            write_normals,
        )
        .and_then(|_| w.flush())
        .map_err(|e| ExportError::io(path, e))?;
        drop(w);

        let written = staged.commit()?;

        info!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            materials = mesh.materials.len(),
            files = written.len(),
            "OBJ file exported"
        );

        Ok(written)
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["obj"]
    }
}

/// 每个三角形对应的 MTL 条目下标
///
/// 子网格的材质下标与 `mesh.materials` 一致；不被任何子网格覆盖的面为 `None`。
fn face_material_slots(mesh: &MeshData) -> Vec<Option<usize>> {
    let mut slots = vec![None; mesh.triangle_count()];
    for subset in &mesh.subsets {
        let start = subset.face_start as usize;
        let end = (start + subset.face_count as usize).min(slots.len());
        for slot in &mut slots[start..end] {
            *slot = subset.material;
        }
    }
    slots
}

/// 写出纹理图像，返回每个材质对应的纹理文件名
///
/// 共享同一图像的材质只写一次。
fn write_textures(
    mesh: &MeshData,
    directory: &Path,
    prefix: &str,
    staged: &mut StagedFiles,
) -> std::result::Result<Vec<Option<String>>, ExportError> {
    let mut written: Vec<(Arc<DynamicImage>, String)> = Vec::new();
    let mut files = Vec::with_capacity(mesh.materials.len());

    for material in &mesh.materials {
        let Some(texture) = material.diffuse_texture.as_ref() else {
            files.push(None);
            continue;
        };

        if let Some((_, name)) = written.iter().find(|(image, _)| Arc::ptr_eq(image, &texture.image)) {
            files.push(Some(name.clone()));
            continue;
        }

        let file_name = format!("{}_{}.png", prefix, written.len());
        let target = directory.join(&file_name);
        let temp = staged.stage(&target);
        save_png(texture, &temp).map_err(|reason| ExportError::Texture {
            path: target.clone(),
            reason,
        })?;

        written.push((Arc::clone(&texture.image), file_name.clone()));
        files.push(Some(file_name));
    }

    Ok(files)
}

/// 以 PNG 编码保存纹理，浮点图像先转换为 8 位 RGBA
fn save_png(texture: &Texture, path: &Path) -> std::result::Result<(), String> {
    let image: Cow<'_, DynamicImage> = match &*texture.image {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            Cow::Owned(DynamicImage::ImageRgba8(texture.image.to_rgba8()))
        }
        other => Cow::Borrowed(other),
    };

    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| e.to_string())
}

/// 为 MTL 生成唯一的材质名
fn material_entries(
    mesh: &MeshData,
    textures: Vec<Option<String>>,
    needs_default: bool,
) -> Vec<MtlEntry<'_>> {
    let mut entries: Vec<MtlEntry<'_>> = Vec::with_capacity(mesh.materials.len() + 1);

    for (index, (material, texture_file)) in mesh.materials.iter().zip(textures).enumerate() {
        let base = sanitize_name(&material.name).unwrap_or_else(|| format!("material_{}", index));
        let name = unique_name(&entries, base);
        entries.push(MtlEntry {
            name,
            material: Some(material.as_ref()),
            texture_file,
        });
    }

    if needs_default {
        let name = unique_name(&entries, DEFAULT_MATERIAL.to_string());
        entries.push(MtlEntry {
            name,
            material: None,
            texture_file: None,
        });
    }

    entries
}

fn sanitize_name(name: &str) -> Option<String> {
    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("_"))
    }
}

fn unique_name(entries: &[MtlEntry<'_>], base: String) -> String {
    let taken = |candidate: &str| entries.iter().any(|e| e.name == candidate);
    if !taken(base.as_str()) {
        return base;
    }

    let mut suffix = 1;
    loop {
        let candidate = format!("{}_{}", base, suffix);
        if !taken(candidate.as_str()) {
            return candidate;
        }
        suffix += 1;
    }
}

fn write_mtl<W: Write>(w: &mut W, entries: &[MtlEntry<'_>]) -> io::Result<()> {
    writeln!(w, "# mesh_concat material library")?;
    for entry in entries {
        writeln!(w)?;
        writeln!(w, "newmtl {}", entry.name)?;

        match entry.material {
            Some(material) => {
                if let Some([r, g, b]) = material.ambient {
                    writeln!(w, "Ka {} {} {}", r, g, b)?;
                }
                if let Some([r, g, b]) = material.diffuse {
                    writeln!(w, "Kd {} {} {}", r, g, b)?;
                }
                if let Some([r, g, b]) = material.specular {
                    writeln!(w, "Ks {} {} {}", r, g, b)?;
                }
                if let Some(ns) = material.shininess {
                    writeln!(w, "Ns {}", ns)?;
                }
                if let Some(d) = material.dissolve {
                    writeln!(w, "d {}", d)?;
                }
            }
            None => writeln!(w, "Kd 0.8 0.8 0.8")?,
        }

        if let Some(texture) = &entry.texture_file {
            writeln!(w, "map_Kd {}", texture)?;
        }
    }
    Ok(())
}

fn write_obj<W: Write>(
    w: &mut W,
    mesh: &MeshData,
    mtl_file: Option<&str>,
    face_materials: &[Option<usize>],
    entries: &[MtlEntry<'_>],
    write_normals: bool,
) -> io::Result<()> {
    writeln!(w, "# mesh_concat")?;
    writeln!(
        w,
        "# {} vertices, {} faces",
        mesh.vertex_count(),
        mesh.triangle_count()
    )?;

    if let Some(mtl_file) = mtl_file {
        writeln!(w, "mtllib {}", mtl_file)?;
    }

    if let Some(name) = mesh.name.as_deref().and_then(sanitize_name) {
        writeln!(w, "o {}", name)?;
    }

    for v in &mesh.vertices {
        let [x, y, z] = v.position;
        writeln!(w, "v {} {} {}", x, y, z)?;
    }

    if mesh.has_texcoords {
        for v in &mesh.vertices {
            let [u, t] = v.texcoord;
            writeln!(w, "vt {} {}", u, t)?;
        }
    }

    if write_normals {
        for v in &mesh.vertices {
            let [x, y, z] = v.normal;
            writeln!(w, "vn {} {} {}", x, y, z)?;
        }
    }

    // 没有材质的面使用最后一个条目（默认材质）
    let default_entry = entries.len().checked_sub(1);
    let mut current: Option<usize> = None;

    for (face, tri) in mesh.indices.chunks_exact(3).enumerate() {
        if mtl_file.is_some() {
            let entry = face_materials[face].or(default_entry);
            if entry != current {
                if let Some(e) = entry.and_then(|i| entries.get(i)) {
                    writeln!(w, "usemtl {}", e.name)?;
                }
                current = entry;
            }
        }

        // OBJ 索引从 1 开始
        let [a, b, c] = [tri[0] + 1, tri[1] + 1, tri[2] + 1];
        match (mesh.has_texcoords, write_normals) {
            (true, true) => writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?,
            (true, false) => writeln!(w, "f {a}/{a} {b}/{b} {c}/{c}")?,
            (false, true) => writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}")?,
            (false, false) => writeln!(w, "f {a} {b} {c}")?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::document::GeometryDocument;
    use crate::geometry::loaders::{MeshLoader, ObjLoader};
    use crate::geometry::vertex::Vertex;
    use image::{Rgba, RgbaImage};
    use std::fs;

    fn quad(material: Option<Arc<Material>>) -> MeshData {
        let mut mesh = MeshData::with_name("quad");
        mesh.vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.25]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.75]),
        ];
        mesh.indices = vec![0, 1, 2, 0, 2, 3];
        mesh.has_normals = true;
        mesh.has_texcoords = true;
        mesh.set_single_subset(material);
        mesh
    }

    fn textured_material(name: &str) -> Arc<Material> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255])));
        let mut material = Material::new(name);
        material.diffuse = Some([1.0, 1.0, 1.0]);
        material.diffuse_texture = Some(Texture::from_image("source.png", image));
        Arc::new(material)
    }

    #[test]
    fn test_plain_mesh_writes_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.obj");

        let written = ObjExporter::export_to_file(&quad(None), &path, &ExportConfig::default()).unwrap();
        assert_eq!(written, vec![path.clone()]);

        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("mtllib"));
        assert!(text.contains("vt 1 0.25"));
        assert!(text.contains("f 1/1/1 2/2/2 3/3/3"));
        assert!(text.contains("f 1/1/1 3/3/3 4/4/4"));
    }

    #[test]
    fn test_write_normals_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.obj");
        let config = ExportConfig {
            write_normals: false,
            ..Default::default()
        };

        ObjExporter::export_to_file(&quad(None), &path, &config).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("vn "));
        assert!(text.contains("f 1/1 2/2 3/3"));
    }

    #[test]
    fn test_textured_mesh_writes_mtl_and_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.obj");

        let written = ObjExporter::export_to_file(
            &quad(Some(textured_material("skin"))),
            &path,
            &ExportConfig::default(),
        )
        .unwrap();

        assert_eq!(written[0], path);
        assert!(written.contains(&dir.path().join("model.mtl")));
        assert!(written.contains(&dir.path().join("material_0.png")));
        assert_eq!(written.len(), 3);

        let obj = fs::read_to_string(&path).unwrap();
        assert!(obj.contains("mtllib model.mtl"));
        assert!(obj.contains("usemtl skin"));

        let mtl = fs::read_to_string(dir.path().join("model.mtl")).unwrap();
        assert!(mtl.contains("newmtl skin"));
        assert!(mtl.contains("map_Kd material_0.png"));

        let png = image::open(dir.path().join("material_0.png")).unwrap();
        assert_eq!(png.width(), 2);
    }

    #[test]
    fn test_duplicate_material_names_are_made_unique() {
        let mut mesh = quad(Some(Arc::new(Material::new("paint"))));
        mesh.materials.push(Arc::new(Material::new("paint")));
        mesh.subsets[0].face_count = 1;
        mesh.subsets.push(crate::geometry::mesh::Subset::new(Some(1), 0, 4, 1, 1));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paint.obj");
        ObjExporter::export_to_file(&mesh, &path, &ExportConfig::default()).unwrap();

        let mtl = fs::read_to_string(dir.path().join("paint.mtl")).unwrap();
        assert!(mtl.contains("newmtl paint\n"));
        assert!(mtl.contains("newmtl paint_1\n"));

        let obj = fs::read_to_string(&path).unwrap();
        assert!(obj.contains("usemtl paint\n"));
        assert!(obj.contains("usemtl paint_1\n"));
    }

    #[test]
    fn test_faces_without_material_use_default() {
        let mut mesh = quad(Some(Arc::new(Material::new("paint"))));
        mesh.subsets[0].face_count = 1;
        mesh.subsets.push(crate::geometry::mesh::Subset::new(None, 0, 4, 1, 1));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.obj");
        ObjExporter::export_to_file(&mesh, &path, &ExportConfig::default()).unwrap();

        let obj = fs::read_to_string(&path).unwrap();
        assert!(obj.contains("usemtl default"));
        let mtl = fs::read_to_string(dir.path().join("mixed.mtl")).unwrap();
        assert!(mtl.contains("newmtl default"));
    }

    #[test]
    fn test_round_trip_preserves_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round.obj");
        let original = quad(Some(textured_material("skin")));

        ObjExporter::export_to_file(&original, &path, &ExportConfig::default()).unwrap();

        let GeometryDocument::Mesh(reloaded) = ObjLoader::load_from_file(&path).unwrap() else {
            panic!("expected a single mesh");
        };
        assert_eq!(reloaded.vertex_count(), original.vertex_count());
        assert_eq!(reloaded.triangle_count(), original.triangle_count());
        assert_eq!(reloaded.indices, original.indices);
        for (a, b) in reloaded.vertices.iter().zip(&original.vertices) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.texcoord, b.texcoord);
            assert_eq!(a.normal, b.normal);
        }

        let material = reloaded.subset_material(&reloaded.subsets[0]).unwrap();
        assert_eq!(material.name, "skin");
        assert!(material.has_texture());
    }
}
