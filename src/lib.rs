//! mesh_concat - 网格合并工具
//!
//! 读取一个网格文件（OBJ / STL），若其中包含多个网格则合并为一个，
//! 再按输出文件扩展名写出。材质、纹理和纹理坐标在合并中保留。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（日志、配置、错误处理）
//! - `math`: 数学工具（基于 nalgebra）
//! - `geometry`: 几何数据模块（网格、材质、加载器、导出器、合并）
//! - `converter`: 加载 → 合并 → 导出的完整流程
//!
//! # 使用示例
//!
//! ```no_run
//! use mesh_concat::converter::MeshConverter;
//! use mesh_concat::core::Config;
//! use std::path::Path;
//!
//! let config = Config::default();
//! let converter = MeshConverter::new(config.export);
//! converter.run(Path::new("scene.obj"), Path::new("combined.obj"))?;
//! # Ok::<(), mesh_concat::core::MeshConcatError>(())
//! ```

pub mod core;
pub mod math;
pub mod geometry;
pub mod converter;
