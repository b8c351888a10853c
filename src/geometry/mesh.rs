//! 网格数据结构模块
//!
//! 定义CPU侧的网格数据容器，保存从文件加载的原始几何数据及其材质绑定。

use std::sync::Arc;

use super::material::Material;
use super::vertex::Vertex;

/// 子网格描述符
///
/// 描述网格中连续的一段三角形以及它们使用的材质。
/// 加载得到的网格只有一个覆盖全部三角形的子网格；
/// 合并后的网格为每个来源子网格保留一个子网格。
///
/// # 示例
///
/// ```rust
/// use mesh_concat::geometry::mesh::Subset;
///
/// // 使用 0 号材质、包含100个顶点、50个三角形的子网格
/// let subset = Subset::new(Some(0), 0, 100, 0, 50);
/// assert_eq!(subset.face_count, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subset {
    /// 材质索引（指向所属网格的 `materials`），无材质时为 `None`
    pub material: Option<usize>,

    /// 起始顶点索引
    pub vertex_start: u32,

    /// 顶点数量
    pub vertex_count: u32,

    /// 起始面索引（以三角形为单位）
    pub face_start: u32,

    /// 面数量（三角形数量）
    pub face_count: u32,
}

impl Subset {
    /// 创建一个新的子网格描述符
    #[inline]
    pub fn new(
        material: Option<usize>,
        vertex_start: u32,
        vertex_count: u32,
        face_start: u32,
        face_count: u32,
    ) -> Self {
        Self {
            material,
            vertex_start,
            vertex_count,
            face_start,
            face_count,
        }
    }
}

/// CPU侧网格数据
///
/// 顶点、三角形索引、子网格和材质。材质通过 `Arc` 共享，
/// 纹理图像也随材质一起共享，复制网格不会复制图像数据。
///
/// # 示例
///
/// ```rust
/// use mesh_concat::geometry::mesh::MeshData;
/// use mesh_concat::geometry::vertex::Vertex;
///
/// let mut mesh = MeshData::with_name("Triangle");
/// mesh.vertices = vec![
///     Vertex::from_position([0.0, 0.0, 0.0]),
///     Vertex::from_position([1.0, 0.0, 0.0]),
///     Vertex::from_position([0.0, 0.0, 1.0]),
/// ];
/// mesh.indices = vec![0, 1, 2];
/// mesh.set_single_subset(None);
/// assert!(mesh.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// 顶点数组
    pub vertices: Vec<Vertex>,

    /// 索引数组
    ///
    /// 三角形顶点索引，每3个索引定义一个三角形。
    pub indices: Vec<u32>,

    /// 子网格列表，按面顺序排列
    pub subsets: Vec<Subset>,

    /// 材质列表，由 `Subset::material` 引用
    pub materials: Vec<Arc<Material>>,

    /// 顶点是否带有法线
    pub has_normals: bool,

    /// 顶点是否带有纹理坐标
    pub has_texcoords: bool,

    /// 网格名称（可选）
    pub name: Option<String>,
}

impl MeshData {
    /// 创建一个空的网格数据
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建一个指定名称的空网格数据
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// 创建一个带容量预分配的网格数据
    pub fn with_capacity(vertex_capacity: usize, index_capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_capacity),
            indices: Vec::with_capacity(index_capacity),
            ..Default::default()
        }
    }

    /// 获取顶点数量
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// 获取索引数量
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// 获取三角形数量
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// 网格名称，未命名时返回 `"Unnamed"`
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed")
    }

    /// 将整个网格设置为单一子网格，并绑定给定材质
    pub fn set_single_subset(&mut self, material: Option<Arc<Material>>) {
        self.materials.clear();
        let material_index = material.map(|m| {
            self.materials.push(m);
            0
        });

        self.subsets = vec![Subset::new(
            material_index,
            0,
            self.vertices.len() as u32,
            0,
            self.triangle_count() as u32,
        )];
    }

    /// 子网格对应的材质
    pub fn subset_material(&self, subset: &Subset) -> Option<&Arc<Material>> {
        subset.material.and_then(|i| self.materials.get(i))
    }

    /// 带纹理的材质数量
    pub fn textured_material_count(&self) -> usize {
        self.materials.iter().filter(|m| m.has_texture()).count()
    }

    /// 验证网格数据的有效性
    ///
    /// 检查：
    /// - 索引数量是3的倍数（每个三角形3个顶点）
    /// - 所有索引都在有效范围内
    /// - 子网格描述符的范围和材质索引有效
    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "index count must be a multiple of 3, got {}",
                self.indices.len()
            ));
        }

        let vertex_count = self.vertices.len();
        if let Some((i, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= vertex_count)
        {
            return Err(format!(
                "index {} at position {} is out of range for {} vertices",
                index, i, vertex_count
            ));
        }

        let triangle_count = self.triangle_count() as u64;
        for (i, subset) in self.subsets.iter().enumerate() {
            if subset.vertex_start as u64 + subset.vertex_count as u64 > vertex_count as u64 {
                return Err(format!(
                    "subset {} vertex range out of bounds: start={}, count={}, total={}",
                    i, subset.vertex_start, subset.vertex_count, vertex_count
                ));
            }

            if subset.face_start as u64 + subset.face_count as u64 > triangle_count {
                return Err(format!(
                    "subset {} face range out of bounds: start={}, count={}, total={}",
                    i, subset.face_start, subset.face_count, triangle_count
                ));
            }

            if let Some(material) = subset.material {
                if material >= self.materials.len() {
                    return Err(format!(
                        "subset {} references material {} but only {} exist",
                        i, material, self.materials.len()
                    ));
                }
            }
        }

        Ok(())
    }
}
