//! 几何文档
//!
//! 加载结果有两种形态：包含多个具名网格的场景，或单个网格。
//! 唯一随形态变化的操作是“给出待合并的网格列表”，因此用枚举表达。

use super::mesh::MeshData;

/// 加载得到的几何文档
#[derive(Debug, Clone)]
pub enum GeometryDocument {
    /// 多个具名网格
    Scene(Scene),

    /// 单个网格
    Mesh(MeshData),
}

impl GeometryDocument {
    /// 是否为场景形态
    #[inline]
    pub fn is_scene(&self) -> bool {
        matches!(self, GeometryDocument::Scene(_))
    }

    /// 文档包含的网格数量
    pub fn mesh_count(&self) -> usize {
        match self {
            GeometryDocument::Scene(scene) => scene.len(),
            GeometryDocument::Mesh(_) => 1,
        }
    }

    /// 形态名称，用于日志
    pub fn kind(&self) -> &'static str {
        match self {
            GeometryDocument::Scene(_) => "scene",
            GeometryDocument::Mesh(_) => "mesh",
        }
    }
}

/// 场景：名称到网格的有序映射
///
/// 迭代顺序即插入顺序（文件中出现的顺序）。名称重复时自动追加
/// `_1`、`_2` 等后缀，保证每个名称唯一。
#[derive(Debug, Clone, Default)]
pub struct Scene {
    geometry: Vec<(String, MeshData)>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入网格，返回实际使用的（唯一）名称
    pub fn insert(&mut self, name: impl Into<String>, mesh: MeshData) -> String {
        let name = self.unique_name(name.into());
        self.geometry.push((name.clone(), mesh));
        name
    }

    fn unique_name(&self, base: String) -> String {
        if !self.contains(&base) {
            return base;
        }

        let mut suffix = 1;
        loop {
            let candidate = format!("{}_{}", base, suffix);
            if !self.contains(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// 是否包含指定名称
    pub fn contains(&self, name: &str) -> bool {
        self.geometry.iter().any(|(n, _)| n == name)
    }

    /// 按名称查找网格
    pub fn get(&self, name: &str) -> Option<&MeshData> {
        self.geometry
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, mesh)| mesh)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    /// 按插入顺序返回名称
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.geometry.iter().map(|(n, _)| n.as_str())
    }

    /// 按插入顺序取出所有网格
    pub fn into_meshes(self) -> Vec<MeshData> {
        self.geometry.into_iter().map(|(_, mesh)| mesh).collect()
    }
}
