use crate::db::Population;
use crate::encoding::LiteralError;

/// 存储后端错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("存储的特征向量无法解析: {0}")]
    Literal(#[from] LiteralError),
    #[error("人脸表 `{0}` 不存在")]
    UnknownPopulation(Population),
}

/// 人脸库操作错误，不区分具体原因，也不做重试
#[derive(Debug, thiserror::Error)]
pub enum FaceDbError {
    #[error("人脸搜索失败: {0}")]
    SearchFailed(#[source] StoreError),
    #[error("人脸添加失败: {0}")]
    InsertFailed(#[source] StoreError),
    #[error("人脸信息查询失败: {0}")]
    LookupFailed(#[source] StoreError),
    #[error("元数据更新失败: {0}")]
    UpdateFailed(#[source] StoreError),
}

pub type Result<T, E = FaceDbError> = std::result::Result<T, E>;
