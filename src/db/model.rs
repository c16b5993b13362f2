use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

static POPULATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("failed to build regex"));

#[derive(Debug, thiserror::Error)]
#[error("无效的人脸表名 `{0}`，只允许字母、数字和下划线，且不能以数字开头")]
pub struct PopulationError(String);

/// 人脸表名
///
/// 表名无法作为 SQL 参数绑定，因此只接受合法的标识符，并在拼接时加上双引号。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Population(String);

impl Population {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 加双引号后的标识符，可以直接拼接进 SQL
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl Default for Population {
    fn default() -> Self {
        Self("face".to_owned())
    }
}

impl FromStr for Population {
    type Err = PopulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if POPULATION_RE.is_match(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(PopulationError(s.to_owned()))
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 搜索结果，按距离从小到大排列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct MatchResult {
    /// 人脸 ID
    #[sqlx(rename = "face_id")]
    pub id: i64,
    /// 人名，即去掉扩展名的文件名
    pub person_name: String,
}

/// 一张图片中每张人脸的搜索结果，按检测顺序序列化为 `{"face1": [...], "face2": [...], ...}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceMatches(pub Vec<Vec<MatchResult>>);

impl FaceMatches {
    /// `(face{N}, 结果)`，N 从 1 开始
    pub fn iter(&self) -> impl Iterator<Item = (String, &[MatchResult])> {
        self.0.iter().enumerate().map(|(i, m)| (format!("face{}", i + 1), m.as_slice()))
    }
}

impl Serialize for FaceMatches {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, matches) in self.iter() {
            map.serialize_entry(&key, matches)?;
        }
        map.end()
    }
}

/// 人脸信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct FaceInfo {
    pub person_name: Option<String>,
    pub version_number: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
}

/// 可修改的元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FaceMetadata {
    pub version_number: String,
    pub date: String,
    pub location: String,
}
