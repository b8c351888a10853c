//! 模型加载器模块
//!
//! 提供统一的加载接口和各种格式的具体实现。
//!
//! # 支持的格式
//!
//! - **OBJ**: Wavefront OBJ 格式（使用 tobj crate），包括 MTL 材质与纹理
//! - **STL**: ASCII / 二进制 STL
//!
//! 加载器不做任何几何后处理：不合并顶点、不重建法线、不翻转 UV。
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use mesh_concat::geometry::loaders::load_document;
//! use std::path::Path;
//!
//! let document = load_document(Path::new("model.obj"))?;
//! println!("{} 个网格", document.mesh_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
use crate::core::error::{LoadError, Result};
use crate::geometry::document::GeometryDocument;
use crate::geometry::file_extension;
use std::path::Path;

pub mod obj_loader;
pub mod stl_loader;

// 重新导出加载器
pub use obj_loader::ObjLoader;
pub use stl_loader::StlLoader;

/// 网格加载器 trait
///
/// 所有格式的加载器都实现此 trait。加载器是无状态的，
/// 返回 CPU 侧的 `GeometryDocument`。
pub trait MeshLoader {
    /// 从文件路径加载
    ///
    /// # 错误
    ///
    /// - 文件不存在或无法读取
    /// - 文件格式错误或损坏
    fn load_from_file(path: &Path) -> Result<GeometryDocument>;

    /// 从内存数据加载
    ///
    /// 内存中的数据没有所在目录，外部引用（材质库、纹理）不会被解析。
    fn load_from_memory(data: &[u8]) -> Result<GeometryDocument>;

    /// 支持的文件扩展名列表（小写，不含点号）
    fn supported_extensions() -> &'static [&'static str];
}

/// 根据文件扩展名选择合适的加载器
///
/// # 错误
///
/// - `LoadError::FileNotFound`：文件不存在
/// - `LoadError::UnsupportedFormat`：无扩展名或扩展名未知
/// - `LoadError::ParseError`：加载器解析失败
pub fn load_document(path: &Path) -> Result<GeometryDocument> {
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.to_path_buf()).into());
    }

    let extension = file_extension(path).ok_or_else(|| {
        LoadError::UnsupportedFormat(format!(
            "cannot determine file extension of {}",
            path.display()
        ))
    })?;

    if ObjLoader::supported_extensions().contains(&extension.as_str()) {
        ObjLoader::load_from_file(path)
    } else if StlLoader::supported_extensions().contains(&extension.as_str()) {
        StlLoader::load_from_file(path)
    } else {
        Err(LoadError::UnsupportedFormat(format!(".{}", extension)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::MeshConcatError;

    #[test]
    fn test_supported_extensions() {
        assert!(ObjLoader::supported_extensions().contains(&"obj"));
        assert!(StlLoader::supported_extensions().contains(&"stl"));
    }

    #[test]
    fn test_missing_file() {
        let result = load_document(Path::new("nonexistent.obj"));
        assert!(matches!(
            result,
            Err(MeshConcatError::Load(LoadError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.xyz");
        std::fs::write(&path, "not a mesh").unwrap();

        assert!(matches!(
            load_document(&path),
            Err(MeshConcatError::Load(LoadError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TRI.OBJ");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let document = load_document(&path).unwrap();
        assert_eq!(document.mesh_count(), 1);
    }
}
