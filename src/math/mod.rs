//! 数学工具模块
//!
//! 基于 `nalgebra` 的类型别名和少量几何辅助函数。

// 类型别名，使用更简洁的名称
pub type Vector3 = nalgebra::Vector3<f32>;

/// 数学常量
pub mod constants {
    /// 浮点数比较的 epsilon
    pub const EPSILON: f32 = 1e-6;
}

/// 计算三角形的单位面法线
///
/// 退化三角形（面积为零）返回零向量。
pub fn face_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let a = Vector3::from(a);
    let edge1 = Vector3::from(b) - a;
    let edge2 = Vector3::from(c) - a;

    edge1
        .cross(&edge2)
        .try_normalize(constants::EPSILON)
        .map(|n| [n.x, n.y, n.z])
        .unwrap_or([0.0, 0.0, 0.0])
}

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vector3,
    pub max: Vector3,
}

impl Bounds {
    /// 计算一组点的包围盒，点集为空时返回 `None`
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [f32; 3]>,
    {
        let mut iter = points.into_iter();
        let first = Vector3::from(*iter.next()?);
        let (min, max) = iter.fold((first, first), |(min, max), p| {
            let p = Vector3::from(*p);
            (min.inf(&p), max.sup(&p))
        });
        Some(Self { min, max })
    }

    /// 包围盒尺寸
    pub fn extent(&self) -> Vector3 {
        self.max - self.min
    }
}
