//! 材质与纹理
//!
//! 材质通过 `Arc` 在多个网格之间共享：同一个 MTL 材质被多个对象引用时，
//! 合并后的网格只保存一份。纹理在加载时即解码为 `image::DynamicImage`，
//! 导出时重新编码，不依赖源文件是否仍然存在。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;

/// 已解码的纹理图像
#[derive(Debug, Clone)]
pub struct Texture {
    /// 纹理源文件路径（已相对模型目录解析）
    pub source: PathBuf,

    /// 解码后的图像
    pub image: Arc<DynamicImage>,
}

impl Texture {
    /// 从文件读取并解码纹理
    pub fn load(path: &Path) -> Result<Self, image::ImageError> {
        let image = image::open(path)?;
        Ok(Self::from_image(path, image))
    }

    /// 从内存中的图像创建纹理
    pub fn from_image(source: impl Into<PathBuf>, image: DynamicImage) -> Self {
        Self {
            source: source.into(),
            image: Arc::new(image),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// 表面材质
#[derive(Debug, Clone, Default)]
pub struct Material {
    /// 材质名称
    pub name: String,

    /// 环境光颜色 (Ka)
    pub ambient: Option<[f32; 3]>,

    /// 漫反射颜色 (Kd)
    pub diffuse: Option<[f32; 3]>,

    /// 高光颜色 (Ks)
    pub specular: Option<[f32; 3]>,

    /// 高光指数 (Ns)
    pub shininess: Option<f32>,

    /// 不透明度 (d)
    pub dissolve: Option<f32>,

    /// 漫反射纹理 (map_Kd)
    pub diffuse_texture: Option<Texture>,
}

impl Material {
    /// 创建一个只有名称的材质
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 是否带有纹理
    #[inline]
    pub fn has_texture(&self) -> bool {
        self.diffuse_texture.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_material_without_texture() {
        let material = Material::new("plain");
        assert_eq!(material.name, "plain");
        assert!(!material.has_texture());
        assert!(material.diffuse.is_none());
    }

    #[test]
    fn test_texture_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        RgbaImage::from_pixel(4, 2, Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let texture = Texture::load(&path).unwrap();
        assert_eq!(texture.width(), 4);
        assert_eq!(texture.height(), 2);
        assert_eq!(texture.source, path);
    }

    #[test]
    fn test_texture_load_missing_file() {
        assert!(Texture::load(Path::new("does/not/exist.png")).is_err());
    }
}
