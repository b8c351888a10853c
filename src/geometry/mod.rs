//! 几何数据模块
//!
//! 网格的加载、合并与导出。
//!
//! # 模块结构
//!
//! - `vertex`: 顶点数据结构定义
//! - `material`: 材质与纹理
//! - `mesh`: 网格数据和子网格结构
//! - `document`: 加载结果（场景或单网格）
//! - `concat`: 多网格合并
//! - `loaders`: 各种格式的模型加载器
//! - `exporters`: 各种格式的模型导出器
//!
//! # 数据流
//!
//! ```text
//! 文件 (OBJ/STL)
//!     ↓
//! Loader (ObjLoader/StlLoader)
//!     ↓
//! GeometryDocument (Scene / Mesh)
//!     ↓
//! concatenate
//!     ↓
//! MeshData
//!     ↓
//! Exporter (ObjExporter/StlExporter)
//! ```
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use mesh_concat::geometry::loaders::{MeshLoader, ObjLoader};
//! use std::path::Path;
//!
//! let document = ObjLoader::load_from_file(Path::new("model.obj"))?;
//! println!("网格数: {}", document.mesh_count());
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;

pub mod vertex;
pub mod material;
pub mod mesh;
pub mod document;
pub mod concat;
pub mod loaders;
pub mod exporters;

// 重新导出常用类型
pub use vertex::Vertex;
pub use material::{Material, Texture};
pub use mesh::{MeshData, Subset};
pub use document::{GeometryDocument, Scene};
pub use concat::concatenate;

/// 小写的文件扩展名（不含点号）
pub(crate) fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
