//! 网格转换流程
//!
//! 加载 → 展平 → 导出。每一步的错误原样向上传播。

use std::path::{Path, PathBuf};

use tracing::{info, info_span};

use crate::core::config::ExportConfig;
use crate::core::error::Result;
use crate::geometry::concat::concatenate;
use crate::geometry::document::GeometryDocument;
use crate::geometry::exporters::export_mesh;
use crate::geometry::loaders::load_document;
use crate::geometry::mesh::MeshData;
use crate::math::Bounds;

/// 网格转换器
///
/// # 示例
///
/// ```rust,no_run
/// use mesh_concat::converter::MeshConverter;
/// use mesh_concat::core::config::ExportConfig;
/// use std::path::Path;
///
/// let converter = MeshConverter::new(ExportConfig::default());
/// let written = converter.run(Path::new("scene.obj"), Path::new("combined.obj"))?;
/// println!("{} 个文件", written.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeshConverter {
    config: ExportConfig,
}

impl MeshConverter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// 加载输入文件
    pub fn load(&self, input: &Path) -> Result<GeometryDocument> {
        load_document(input)
    }

    /// 将文档展平为单个网格
    ///
    /// 场景按插入顺序合并；单网格原样返回。
    pub fn flatten(&self, document: GeometryDocument) -> Result<MeshData> {
        match document {
            GeometryDocument::Scene(scene) => Ok(concatenate(scene.into_meshes())?),
            GeometryDocument::Mesh(mesh) => Ok(mesh),
        }
    }

    /// 导出网格，返回写出的文件
    pub fn export(&self, mesh: &MeshData, output: &Path) -> Result<Vec<PathBuf>> {
        export_mesh(mesh, output, &self.config)
    }

    /// 完整转换流程
    pub fn run(&self, input: &Path, output: &Path) -> Result<Vec<PathBuf>> {
        let document = {
            let _span = info_span!("load", input = %input.display()).entered();
            let document = self.load(input)?;
            info!(
                kind = document.kind(),
                meshes = document.mesh_count(),
                "Input loaded"
            );
            document
        };

        let mesh = {
            let _span = info_span!("flatten").entered();
            let mesh = self.flatten(document)?;
            log_summary(&mesh);
            mesh
        };

        let _span = info_span!("export", output = %output.display()).entered();
        let written = self.export(&mesh, output)?;
        info!(files = written.len(), "Conversion finished");

        Ok(written)
    }
}

fn log_summary(mesh: &MeshData) {
    let extent = Bounds::from_points(mesh.vertices.iter().map(|v| &v.position))
        .map(|b| {
            let e = b.extent();
            [e.x, e.y, e.z]
        })
        .unwrap_or([0.0; 3]);

    info!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        subsets = mesh.subsets.len(),
        materials = mesh.materials.len(),
        textures = mesh.textured_material_count(),
        normals = mesh.has_normals,
        texcoords = mesh.has_texcoords,
        extent = ?extent,
        "Mesh ready"
    );
}
