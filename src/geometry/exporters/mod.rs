//! 模型导出器模块
//!
//! 根据输出文件扩展名选择导出格式：
//!
//! - **OBJ**: Wavefront OBJ + MTL 材质库 + PNG 纹理
//! - **STL**: 二进制 STL（不含材质）
//!
//! 所有输出文件先写到目标目录下的临时文件，全部写完后再重命名到位；
//! 任一步失败时临时文件会被删除，不会留下看似成功的残缺输出。

use crate::core::config::ExportConfig;
use crate::core::error::{ExportError, Result};
use crate::geometry::file_extension;
use crate::geometry::mesh::MeshData;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub mod obj_exporter;
pub mod stl_exporter;

pub use obj_exporter::ObjExporter;
pub use stl_exporter::StlExporter;

/// 网格导出器 trait
pub trait MeshExporter {
    /// 将网格写到 `path`，返回实际写出的所有文件（主文件在前）
    fn export_to_file(mesh: &MeshData, path: &Path, config: &ExportConfig) -> Result<Vec<PathBuf>>;

    /// 支持的文件扩展名列表（小写，不含点号）
    fn supported_extensions() -> &'static [&'static str];
}

/// 根据文件扩展名选择导出器
///
/// # 错误
///
/// - `ExportError::UnsupportedFormat`：无扩展名或扩展名未知（此时不会写任何文件）
/// - `ExportError::InvalidMesh`：网格未通过校验
/// - `ExportError::Io`：目标位置不可写
pub fn export_mesh(mesh: &MeshData, path: &Path, config: &ExportConfig) -> Result<Vec<PathBuf>> {
    let extension = file_extension(path).ok_or_else(|| {
        ExportError::UnsupportedFormat(format!(
            "cannot determine file extension of {}",
            path.display()
        ))
    })?;

    mesh.validate().map_err(ExportError::InvalidMesh)?;

    if ObjExporter::supported_extensions().contains(&extension.as_str()) {
        ObjExporter::export_to_file(mesh, path, config)
    } else if StlExporter::supported_extensions().contains(&extension.as_str()) {
        StlExporter::export_to_file(mesh, path, config)
    } else {
        Err(ExportError::UnsupportedFormat(format!(".{}", extension)).into())
    }
}

/// 暂存的输出文件集合
///
/// 每个目标文件对应同目录下的一个隐藏临时文件。`commit` 按登记的逆序
/// 重命名（主文件最后落地）；某次重命名失败时删除已经落地的目标文件。
/// 未提交就被丢弃时删除所有临时文件。
#[derive(Debug, Default)]
pub struct StagedFiles {
    entries: Vec<(PathBuf, PathBuf)>,
    committed: bool,
}

impl StagedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个目标文件，返回应写入的临时路径
    pub fn stage(&mut self, target: &Path) -> PathBuf {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let temp = target.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

        self.entries.push((temp.clone(), target.to_path_buf()));
        temp
    }

    /// 登记目标文件并创建其临时文件
    pub fn create(&mut self, target: &Path) -> std::result::Result<BufWriter<File>, ExportError> {
        let temp = self.stage(target);
        let file = File::create(&temp).map_err(|e| ExportError::io(target, e))?;
        Ok(BufWriter::new(file))
    }

    /// 将所有临时文件重命名为目标文件
    pub fn commit(mut self) -> std::result::Result<Vec<PathBuf>, ExportError> {
        let mut renamed: Vec<&Path> = Vec::with_capacity(self.entries.len());

        for (temp, target) in self.entries.iter().rev() {
            if let Err(e) = std::fs::rename(temp, target) {
                for path in renamed {
                    if let Err(e) = std::fs::remove_file(path) {
                        warn!(path = %path.display(), error = %e, "Failed to roll back output file");
                    }
                }
                return Err(ExportError::io(target, e));
            }
            debug!(path = %target.display(), "Output file written");
            renamed.push(target);
        }

        self.committed = true;
        Ok(self.entries.iter().map(|(_, target)| target.clone()).collect())
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        for (temp, _) in &self.entries {
            if temp.exists() {
                if let Err(e) = std::fs::remove_file(temp) {
                    warn!(path = %temp.display(), error = %e, "Failed to remove staged file");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::MeshConcatError;
    use crate::geometry::vertex::Vertex;
    use std::io::Write;

    fn triangle() -> MeshData {
        let mut mesh = MeshData::with_name("tri");
        mesh.vertices = vec![
            Vertex::from_position([0.0, 0.0, 0.0]),
            Vertex::from_position([1.0, 0.0, 0.0]),
            Vertex::from_position([0.0, 1.0, 0.0]),
        ];
        mesh.indices = vec![0, 1, 2];
        mesh.set_single_subset(None);
        mesh
    }

    #[test]
    fn test_supported_extensions() {
        assert!(ObjExporter::supported_extensions().contains(&"obj"));
        assert!(StlExporter::supported_extensions().contains(&"stl"));
    }

    #[test]
    fn test_unknown_extension_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fbx");

        let result = export_mesh(&triangle(), &path, &ExportConfig::default());
        assert!(matches!(
            result,
            Err(MeshConcatError::Export(ExportError::UnsupportedFormat(_)))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.obj");

        let result = export_mesh(&triangle(), &path, &ExportConfig::default());
        assert!(matches!(
            result,
            Err(MeshConcatError::Export(ExportError::Io { .. }))
        ));
    }

    #[test]
    fn test_invalid_mesh_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut mesh = triangle();
        mesh.indices = vec![0, 1, 9];

        let result = export_mesh(&mesh, &dir.path().join("out.obj"), &ExportConfig::default());
        assert!(matches!(
            result,
            Err(MeshConcatError::Export(ExportError::InvalidMesh(_)))
        ));
    }

    #[test]
    fn test_staged_files_commit() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.txt");

        let mut staged = StagedFiles::new();
        let mut w = staged.create(&target).unwrap();
        w.write_all(b"hello").unwrap();
        w.flush().unwrap();
        drop(w);
        assert!(!target.exists());

        let written = staged.commit().unwrap();
        assert_eq!(written, vec![target.clone()]);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_staged_files_dropped_without_commit() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.txt");

        {
            let mut staged = StagedFiles::new();
            let mut w = staged.create(&target).unwrap();
            w.write_all(b"partial").unwrap();
            w.flush().unwrap();
        }

        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_commit_rolls_back_renamed_files() {
        let dir = tempfile::tempdir().unwrap();
        // 主文件的位置被一个非空目录占据，重命名必然失败
        let primary = dir.path().join("model.obj");
        std::fs::create_dir(&primary).unwrap();
        std::fs::write(primary.join("keep"), b"x").unwrap();
        let companion = dir.path().join("model.mtl");

        let mut staged = StagedFiles::new();
        for target in [&primary, &companion] {
            let mut w = staged.create(target).unwrap();
            w.write_all(b"data").unwrap();
            w.flush().unwrap();
        }

        let result = staged.commit();
        assert!(matches!(result, Err(ExportError::Io { .. })));
        assert!(!companion.exists());

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("model.obj")]);
    }
}
