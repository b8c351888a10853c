//! mesh_concat - 网格合并工具
//!
//! 读取一个网格文件，把其中的所有网格合并为一个，再按输出扩展名导出。
//!
//! # 使用方法
//!
//! ```bash
//! # 合并 OBJ 场景，输出 OBJ + MTL + 纹理
//! mesh_concat scene.obj combined.obj
//!
//! # 输出二进制 STL
//! mesh_concat scene.obj combined.stl
//! ```
//!
//! 工作目录下的 `mesh_concat.toml`（可选）控制日志和导出选项；
//! 文件无法解析或取值无效时记录警告并使用默认配置。

use anyhow::{bail, Context};
use mesh_concat::converter::MeshConverter;
use mesh_concat::core::config::{Config, DEFAULT_CONFIG_FILE};
use mesh_concat::core::error::MeshConcatError;
use mesh_concat::core::log;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 应用程序入口点
///
/// # 流程
///
/// 1. 解析命令行参数（恰好两个位置参数）
/// 2. 加载并校验配置文件（失败时回退到默认配置）
/// 3. 初始化日志系统
/// 4. 执行 加载 → 合并 → 导出
fn main() -> anyhow::Result<()> {
    // 1. 解析参数
    let (input, output) = parse_args(std::env::args())?;

    // 2. 加载配置（在初始化日志之前）
    let (config, config_error) = load_config(Path::new(DEFAULT_CONFIG_FILE));

    // 3. 初始化日志系统
    let log_file = if config.logging.file_output {
        Some(config.logging.log_file.as_str())
    } else {
        None
    };
    log::init_logger(config.logging.level, config.logging.file_output, log_file);
    info!(version = env!("CARGO_PKG_VERSION"), "mesh_concat starting");
    if let Some(e) = config_error {
        warn!(file = DEFAULT_CONFIG_FILE, error = %e, "Ignoring configuration file, using defaults");
    }

    // 4. 转换
    let converter = MeshConverter::new(config.export);
    let written = converter
        .run(&input, &output)
        .with_context(|| format!("failed to convert {} to {}", input.display(), output.display()))?;

    for path in &written {
        info!(path = %path.display(), "Written");
    }

    Ok(())
}

/// 读取并校验配置，失败时返回默认配置和失败原因
fn load_config(path: &Path) -> (Config, Option<MeshConcatError>) {
    let loaded = Config::from_file_or_default(path).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    match loaded {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<(PathBuf, PathBuf)> {
    let program = args.next().unwrap_or_else(|| "mesh_concat".to_string());
    let rest: Vec<String> = args.collect();

    match rest.as_slice() {
        [input, output] => Ok((PathBuf::from(input), PathBuf::from(output))),
        _ => bail!(
            "expected 2 arguments, got {}\nusage: {} <input_path> <output_path>",
            rest.len(),
            program
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_two_arguments() {
        let (input, output) = parse_args(args(&["mesh_concat", "in.obj", "out.stl"])).unwrap();
        assert_eq!(input, PathBuf::from("in.obj"));
        assert_eq!(output, PathBuf::from("out.stl"));
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh_concat.toml");
        std::fs::write(&path, "[export\nwrite_normals = ").unwrap();

        let (config, error) = load_config(&path);
        assert!(error.is_some());
        assert!(config.export.write_normals);
        assert_eq!(config.export.texture_prefix, "material");
    }

    #[test]
    fn test_invalid_config_value_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh_concat.toml");
        std::fs::write(&path, "[export]\ntexture_prefix = \"a/b\"\n").unwrap();

        let (config, error) = load_config(&path);
        assert!(error.is_some());
        assert_eq!(config.export.texture_prefix, "material");
    }

    #[test]
    fn test_valid_config_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh_concat.toml");
        std::fs::write(&path, "[export]\nwrite_normals = false\n").unwrap();

        let (config, error) = load_config(&path);
        assert!(error.is_none());
        assert!(!config.export.write_normals);
    }

    #[test]
    fn test_wrong_argument_count() {
        let err = parse_args(args(&["mesh_concat", "in.obj"])).unwrap_err();
        assert!(err.to_string().contains("usage"));
        assert!(parse_args(args(&["mesh_concat", "a", "b", "c"])).is_err());
    }
}
