use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::FaceMatches;
use crate::encoding::FaceDescriptor;

/// 搜索请求参数
#[derive(TryFromMultipart)]
pub struct SearchRequest {
    #[form_data(limit = "unlimited")]
    pub file: Bytes,
    pub k: i64,
    pub confidence_level: f64,
}

/// 搜索表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SearchForm {
    /// 上传的图片，可以包含多张人脸
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// 每张人脸返回的最大结果数量
    pub k: i64,
    /// 允许的最大欧氏距离
    pub confidence_level: f64,
}

/// 直接使用特征向量搜索
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchEncodingRequest {
    /// 128 维特征向量列表
    #[schema(value_type = Vec<Vec<f64>>)]
    pub encodings: Vec<FaceDescriptor>,
    pub k: i64,
    pub confidence_level: f64,
}

/// 搜索结果，`faceN` 对应图片中的第 N 张人脸，按检测顺序排列
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    #[schema(value_type = Object)]
    pub matches: FaceMatches,
}

/// 统一的响应格式
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub body: T,
}

/// 添加单张人脸
#[derive(TryFromMultipart)]
pub struct AddFaceRequest {
    #[form_data(limit = "unlimited")]
    pub file: FieldData<Bytes>,
}

/// 添加人脸表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct AddFaceForm {
    /// 只包含一张人脸的图片，文件名即人名
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// 批量添加人脸
#[derive(TryFromMultipart)]
pub struct AddBulkRequest {
    #[form_data(limit = "unlimited")]
    pub file: FieldData<Bytes>,
}

/// 批量添加表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct AddBulkForm {
    /// 包含多张人脸图片的 ZIP 或 tar 归档
    #[schema(format = Binary, content_media_type = "application/zip")]
    pub file: String,
}

/// 更新元数据
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMetadataRequest {
    pub face_id: i64,
    pub version_number: String,
    pub date: String,
    pub location: String,
}

/// 查询人脸信息
#[derive(Debug, Deserialize, ToSchema)]
pub struct FaceInfoRequest {
    pub face_id: i64,
}
