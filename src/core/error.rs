//! 错误处理模块
//!
//! 定义了转换流程中使用的统一错误类型。
//!
//! # 错误分类
//!
//! - `LoadError`：输入文件不存在、不可读或无法解析
//! - `ConcatenationError`：场景中的网格为空或无法合并
//! - `ExportError`：输出格式不支持或目标位置不可写
//! - `ConfigError`：配置文件相关错误
//!
//! 流程中任何一步失败都会直接向上传播，不做本地恢复。

use std::fmt;
use std::path::PathBuf;

/// 统一的 Result 类型
pub type Result<T> = std::result::Result<T, MeshConcatError>;

/// 顶层错误类型
#[derive(Debug)]
pub enum MeshConcatError {
    /// 配置错误
    Config(ConfigError),

    /// 加载错误
    Load(LoadError),

    /// 合并错误
    Concatenation(ConcatenationError),

    /// 导出错误
    Export(ExportError),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 加载相关的错误
#[derive(Debug)]
pub enum LoadError {
    /// 文件不存在
    FileNotFound(PathBuf),

    /// 不支持的文件格式
    UnsupportedFormat(String),

    /// 文件不可读或解析失败
    ParseError { path: PathBuf, reason: String },
}

/// 网格合并相关的错误
#[derive(Debug)]
pub enum ConcatenationError {
    /// 没有可合并的网格
    Empty,

    /// 某个输入网格本身无效
    InvalidMesh { name: String, reason: String },

    /// 合并后的顶点数超出 u32 索引范围
    IndexOverflow { vertex_count: usize },
}

/// 导出相关的错误
#[derive(Debug)]
pub enum ExportError {
    /// 不支持的输出格式
    UnsupportedFormat(String),

    /// 写入失败
    Io { path: PathBuf, source: std::io::Error },

    /// 待导出的网格无效
    InvalidMesh(String),

    /// 纹理编码失败
    Texture { path: PathBuf, reason: String },
}

impl ExportError {
    /// 为 IO 错误附加路径信息
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for MeshConcatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshConcatError::Config(e) => write!(f, "Configuration error: {}", e),
            MeshConcatError::Load(e) => write!(f, "Load error: {}", e),
            MeshConcatError::Concatenation(e) => write!(f, "Concatenation error: {}", e),
            MeshConcatError::Export(e) => write!(f, "Export error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::FileNotFound(path) => write!(f, "Mesh file not found: {}", path.display()),
            LoadError::UnsupportedFormat(msg) => write!(f, "Unsupported mesh format: {}", msg),
            LoadError::ParseError { path, reason } => {
                write!(f, "Failed to parse {}: {}", path.display(), reason)
            }
        }
    }
}

impl fmt::Display for ConcatenationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcatenationError::Empty => write!(f, "Scene contains no meshes to concatenate"),
            ConcatenationError::InvalidMesh { name, reason } => {
                write!(f, "Mesh '{}' cannot be concatenated: {}", name, reason)
            }
            ConcatenationError::IndexOverflow { vertex_count } => write!(
                f,
                "Combined mesh has {} vertices, exceeding the 32-bit index range",
                vertex_count
            ),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::UnsupportedFormat(msg) => write!(f, "Unsupported export format: {}", msg),
            ExportError::Io { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            ExportError::InvalidMesh(msg) => write!(f, "Mesh cannot be exported: {}", msg),
            ExportError::Texture { path, reason } => {
                write!(f, "Failed to write texture {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for MeshConcatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeshConcatError::Export(e) => std::error::Error::source(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for LoadError {}
impl std::error::Error for ConcatenationError {}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// 实现 From trait 以便于错误转换
impl From<ConfigError> for MeshConcatError {
    fn from(err: ConfigError) -> Self {
        MeshConcatError::Config(err)
    }
}

impl From<LoadError> for MeshConcatError {
    fn from(err: LoadError) -> Self {
        MeshConcatError::Load(err)
    }
}

impl From<ConcatenationError> for MeshConcatError {
    fn from(err: ConcatenationError) -> Self {
        MeshConcatError::Concatenation(err)
    }
}

impl From<ExportError> for MeshConcatError {
    fn from(err: ExportError) -> Self {
        MeshConcatError::Export(err)
    }
}
