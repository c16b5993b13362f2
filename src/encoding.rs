//! 人脸特征向量的文本编码
//!
//! `cube` 扩展的单列维数有限，128 维的特征向量被拆成两个 64 维的半向量分别存储，
//! 查询时再用 `sqrt(d1² + d2²)` 还原完整的欧氏距离。

use serde::{Deserialize, Serialize};

/// 上游特征提取器输出的向量维数
pub const DESCRIPTOR_DIM: usize = 128;

/// 每个存储列的维数
pub const HALF_DIM: usize = DESCRIPTOR_DIM / 2;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DescriptorError {
    #[error("特征向量维数错误: 期望 {DESCRIPTOR_DIM}，实际 {0}")]
    Dimension(usize),
    #[error("特征向量第 {0} 维不是有限数值")]
    NotFinite(usize),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LiteralError {
    #[error("空的向量字面量")]
    Empty,
    #[error("无效的向量元素 `{0}`")]
    Element(String),
}

/// 一张人脸的特征向量，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct FaceDescriptor(Vec<f64>);

impl FaceDescriptor {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// 返回 `(part1, part2)` 两个半向量
    pub fn halves(&self) -> (&[f64], &[f64]) {
        self.0.split_at(HALF_DIM)
    }
}

impl TryFrom<Vec<f64>> for FaceDescriptor {
    type Error = DescriptorError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        if value.len() != DESCRIPTOR_DIM {
            return Err(DescriptorError::Dimension(value.len()));
        }
        if let Some(i) = value.iter().position(|v| !v.is_finite()) {
            return Err(DescriptorError::NotFinite(i));
        }
        Ok(Self(value))
    }
}

impl From<FaceDescriptor> for Vec<f64> {
    fn from(value: FaceDescriptor) -> Self {
        value.0
    }
}

/// 将 `encoding[start..end]` 格式化为逗号分隔的字面量
///
/// `parenthesize` 为真时输出 `(a,b,...)`，用于写入 `cube` 列；
/// 否则输出不带括号的 `a,b,...`，用于嵌入查询表达式。
///
/// # Panics
///
/// 区间为空或越界时 panic，这属于调用方的编程错误。
pub fn format_encoding(encoding: &[f64], start: usize, end: usize, parenthesize: bool) -> String {
    assert!(
        start < end && end <= encoding.len(),
        "无效的编码区间 {start}..{end}，向量长度为 {}",
        encoding.len()
    );

    let body = encoding[start..end].iter().map(f64::to_string).collect::<Vec<_>>().join(",");
    if parenthesize { format!("({body})") } else { body }
}

/// 将特征向量拆成两半并分别格式化
pub fn split_encoding(descriptor: &FaceDescriptor, parenthesize: bool) -> (String, String) {
    let encoding = descriptor.as_slice();
    let mid = encoding.len() / 2;
    (
        format_encoding(encoding, 0, mid, parenthesize),
        format_encoding(encoding, mid, encoding.len(), parenthesize),
    )
}

/// 解析 [`format_encoding`] 生成的字面量，括号可有可无
pub fn parse_encoding(literal: &str) -> Result<Vec<f64>, LiteralError> {
    let literal = literal.trim();
    let body = literal
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(literal)
        .trim();
    if body.is_empty() {
        return Err(LiteralError::Empty);
    }
    body.split(',')
        .map(|s| {
            let s = s.trim();
            s.parse::<f64>().map_err(|_| LiteralError::Element(s.to_owned()))
        })
        .collect()
}

/// 两个等长向量的欧氏距离
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "向量长度不一致");
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

/// 在 `mid` 处切分后由两段部分距离还原的欧氏距离
pub fn split_distance(a: &[f64], b: &[f64], mid: usize) -> f64 {
    assert_eq!(a.len(), b.len(), "向量长度不一致");
    let (a1, a2) = a.split_at(mid);
    let (b1, b2) = b.split_at(mid);
    combine_distances(euclidean_distance(a1, b1), euclidean_distance(a2, b2))
}

/// `sqrt(d1² + d2²)`
pub fn combine_distances(d1: f64, d2: f64) -> f64 {
    (d1.powi(2) + d2.powi(2)).sqrt()
}
