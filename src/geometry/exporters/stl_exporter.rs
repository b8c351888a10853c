//! 二进制 STL 导出器
//!
//! 每个三角形写出一条 50 字节记录，法线由顶点位置重新计算。
//! STL 不支持材质和纹理坐标，这些信息会被忽略。

use super::{MeshExporter, StagedFiles};
use crate::core::config::ExportConfig;
use crate::core::error::{ExportError, Result};
use crate::geometry::mesh::MeshData;
use crate::math::face_normal;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HEADER_TAG: &[u8] = b"mesh_concat binary stl";

/// STL 格式导出器
pub struct StlExporter;

impl MeshExporter for StlExporter {
    fn export_to_file(mesh: &MeshData, path: &Path, _config: &ExportConfig) -> Result<Vec<PathBuf>> {
        if !mesh.materials.is_empty() || mesh.has_texcoords {
            debug!(
                materials = mesh.materials.len(),
                "STL output drops materials and texture coordinates"
            );
        }

        let triangle_count = u32::try_from(mesh.triangle_count()).map_err(|_| {
            ExportError::InvalidMesh(format!(
                "{} triangles do not fit in a binary STL",
                mesh.triangle_count()
            ))
        })?;

        let mut staged = StagedFiles::new();
        let mut w = staged.create(path)?;
        write_stl(&mut w, mesh, triangle_count)
            .and_then(|_| w.flush())
            .map_err(|e| ExportError::io(path, e))?;
        drop(w);

        let written = staged.commit()?;

        info!(
            path = %path.display(),
            triangles = triangle_count,
            "STL file exported"
        );

        Ok(written)
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["stl"]
    }
}

fn write_stl<W: Write>(w: &mut W, mesh: &MeshData, triangle_count: u32) -> io::Result<()> {
    // 80 字节头部
    let mut header = [0u8; 80];
    header[..HEADER_TAG.len()].copy_from_slice(HEADER_TAG);
    w.write_all(&header)?;

    w.write_all(&triangle_count.to_le_bytes())?;

    for tri in mesh.indices.chunks_exact(3) {
        let a = mesh.vertices[tri[0] as usize].position;
        let b = mesh.vertices[tri[1] as usize].position;
        let c = mesh.vertices[tri[2] as usize].position;
        let n = face_normal(a, b, c);

        for v in [n, a, b, c] {
            for component in v {
                w.write_all(&component.to_le_bytes())?;
            }
        }

        // 属性字节数
        w.write_all(&0u16.to_le_bytes())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::document::GeometryDocument;
    use crate::geometry::loaders::{MeshLoader, StlLoader};
    use crate::geometry::vertex::Vertex;

    fn quad() -> MeshData {
        let mut mesh = MeshData::with_name("quad");
        mesh.vertices = vec![
            Vertex::from_position([0.0, 0.0, 0.0]),
            Vertex::from_position([2.0, 0.0, 0.0]),
            Vertex::from_position([2.0, 2.0, 0.0]),
            Vertex::from_position([0.0, 2.0, 0.0]),
        ];
        mesh.indices = vec![0, 1, 2, 0, 2, 3];
        mesh.set_single_subset(None);
        mesh
    }

    #[test]
    fn test_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.stl");

        let written = StlExporter::export_to_file(&quad(), &path, &ExportConfig::default()).unwrap();
        assert_eq!(written, vec![path.clone()]);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 80 + 4 + 2 * 50);
        assert_eq!(&bytes[80..84], &2u32.to_le_bytes());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.stl");
        StlExporter::export_to_file(&quad(), &path, &ExportConfig::default()).unwrap();

        let GeometryDocument::Mesh(loaded) = StlLoader::load_from_file(&path).unwrap() else {
            panic!("expected a mesh");
        };

        assert_eq!(loaded.triangle_count(), 2);
        // STL 不共享顶点，每个三角形三个顶点
        assert_eq!(loaded.vertex_count(), 6);
        assert_eq!(loaded.vertices[2].position, [2.0, 2.0, 0.0]);
        assert_eq!(loaded.vertices[5].position, [0.0, 2.0, 0.0]);
        assert!(loaded.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }
}
