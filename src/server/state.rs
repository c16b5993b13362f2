use std::sync::Arc;

use crate::FaceDB;
use crate::db::Population;
use crate::extractor::FaceExtractor;

/// 应用状态
pub struct AppState {
    /// 人脸库
    pub db: FaceDB,
    /// 人脸特征提取器
    pub extractor: Arc<dyn FaceExtractor>,
    /// 所有请求操作的人脸表
    pub population: Population,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(db: FaceDB, extractor: Arc<dyn FaceExtractor>, population: Population) -> Arc<Self> {
        Arc::new(AppState { db, extractor, population })
    }
}
