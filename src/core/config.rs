//! 配置管理模块
//!
//! 提供转换工具配置的加载、解析和校验。
//! 配置文件是可选的：工作目录下没有 `mesh_concat.toml` 时使用默认值，
//! 默认值下的行为即最朴素的 加载 → 合并 → 导出 流程。
//!
//! # 配置文件格式 (mesh_concat.toml)
//!
//! ```toml
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//! log_file = "mesh_concat.log"
//!
//! [export]
//! write_normals = true
//! texture_prefix = "material"
//! ```

use serde::Deserialize;
use std::path::Path;

use super::error::{ConfigError, Result};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "mesh_concat.toml";

/// 工具配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,

    /// 导出配置
    #[serde(default)]
    pub export: ExportConfig,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// 导出配置
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// 网格带法线时是否写出法线
    #[serde(default = "default_write_normals")]
    pub write_normals: bool,

    /// 导出纹理的文件名前缀，生成 `<prefix>_<k>.png`
    #[serde(default = "default_texture_prefix")]
    pub texture_prefix: String,
}

// 默认值函数
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "mesh_concat.log".to_string() }
fn default_write_normals() -> bool { true }
fn default_texture_prefix() -> String { "material".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            write_normals: default_write_normals(),
            texture_prefix: default_texture_prefix(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，文件不存在时使用默认配置
    ///
    /// 文件存在但无法解析时仍然返回错误，避免静默忽略用户的配置。
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.export.texture_prefix;
        if prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "export.texture_prefix".to_string(),
                reason: "Texture prefix must not be empty".to_string(),
            }.into());
        }

        if prefix.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                field: "export.texture_prefix".to_string(),
                reason: "Texture prefix must be a file name, not a path".to_string(),
            }.into());
        }

        if self.logging.file_output && self.logging.log_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.log_file".to_string(),
                reason: "Log file path is required when file_output is enabled".to_string(),
            }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(!config.logging.file_output);
        assert!(config.export.write_normals);
        assert_eq!(config.export.texture_prefix, "material");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.export.texture_prefix = "textures/material".to_string();
        assert!(config.validate().is_err());

        config.export.texture_prefix.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh_concat.toml");
        std::fs::write(&path, "[export]\nwrite_normals = false\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(!config.export.write_normals);
        assert_eq!(config.export.texture_prefix, "material");
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file_or_default(dir.path().join("absent.toml")).unwrap();
        assert!(config.export.write_normals);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh_concat.toml");
        std::fs::write(&path, "[logging\nlevel = ").unwrap();

        assert!(Config::from_file_or_default(&path).is_err());
    }

    #[test]
    fn test_log_level_names() {
        let config: Config = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);

        assert!(toml::from_str::<Config>("[logging]\nlevel = \"loud\"\n").is_err());
    }
}
