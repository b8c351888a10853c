//! 几何体顶点定义模块
//!
//! 每个顶点对应 OBJ 中一个唯一的 `v/vt/vn` 组合。

/// 网格顶点
///
/// # 示例
///
/// ```rust
/// use mesh_concat::geometry::vertex::Vertex;
///
/// let vertex = Vertex {
///     position: [0.0, 1.0, 0.0],
///     normal: [0.0, 1.0, 0.0],
///     texcoord: [0.5, 0.5],
/// };
/// ```
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    /// 顶点位置 (x, y, z)
    pub position: [f32; 3],

    /// 法线向量 (nx, ny, nz)
    ///
    /// 原样保存文件中的法线，网格没有法线时为零向量。
    pub normal: [f32; 3],

    /// 纹理坐标 (u, v)
    ///
    /// 原样保存，不做 V 轴翻转。
    pub texcoord: [f32; 2],
}

impl Vertex {
    /// 创建一个新的顶点
    #[inline]
    pub fn new(position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }

    /// 仅包含位置的顶点
    #[inline]
    pub fn from_position(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}
