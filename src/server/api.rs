use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use axum_typed_multipart::TypedMultipart;
use log::info;
use serde::Serialize;
use tokio::task::spawn_blocking;

use super::error::{AppError, Result};
use super::state::AppState;
use super::types::*;
use crate::archive::read_archive;
use crate::bulk::{extract_entries, select_registrations};
use crate::db::{FaceInfo, FaceMatches, FaceMetadata};
use crate::encoding::FaceDescriptor;

fn ok(body: impl Serialize) -> Response {
    Json(Envelope { status: "OK", body }).into_response()
}

fn check_confidence(confidence: f64) -> Result<()> {
    if !(confidence >= 0.) {
        return Err(AppError::bad_request(format!("confidence_level 不能为负数: {confidence}")));
    }
    Ok(())
}

async fn extract(state: &AppState, image: Vec<u8>) -> Result<Vec<FaceDescriptor>> {
    let extractor = state.extractor.clone();
    let descriptors = spawn_blocking(move || extractor.extract(&image)).await??;
    Ok(descriptors)
}

async fn search_all(
    state: &AppState,
    descriptors: &[FaceDescriptor],
    k: i64,
    confidence: f64,
) -> Result<SearchResponse> {
    let mut matches = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        matches.push(state.db.search(&state.population, descriptor, k, confidence).await?);
    }
    Ok(SearchResponse { matches: FaceMatches(matches) })
}

/// 搜索图片中每张人脸的前 k 个匹配
#[utoipa::path(
    post,
    path = "/search_faces/",
    request_body(content = SearchForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = SearchResponse),
    )
)]
pub async fn search_faces_handler(
    State(state): State<Arc<AppState>>,
    data: TypedMultipart<SearchRequest>,
) -> Result<Response> {
    check_confidence(data.confidence_level)?;

    let descriptors = extract(&state, data.file.to_vec()).await?;
    info!("在上传图片中检测到 {} 张人脸", descriptors.len());

    let response = search_all(&state, &descriptors, data.k, data.confidence_level).await?;
    Ok(ok(response))
}

/// 使用特征向量搜索
#[utoipa::path(
    post,
    path = "/search_encoding/",
    request_body = SearchEncodingRequest,
    responses(
        (status = 200, body = SearchResponse),
    )
)]
pub async fn search_encoding_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<SearchEncodingRequest>,
) -> Result<Response> {
    check_confidence(data.confidence_level)?;
    let response = search_all(&state, &data.encodings, data.k, data.confidence_level).await?;
    Ok(ok(response))
}

/// 添加一张人脸到数据库
#[utoipa::path(
    post,
    path = "/add_face/",
    request_body(content = AddFaceForm, content_type = "multipart/form-data")
)]
pub async fn add_face_handler(
    State(state): State<Arc<AppState>>,
    data: TypedMultipart<AddFaceRequest>,
) -> Result<Response> {
    let TypedMultipart(AddFaceRequest { file }) = data;
    let Some(filename) = file.metadata.file_name.clone() else {
        return Err(AppError::bad_request("文件名不能为空"));
    };

    let descriptors = extract(&state, file.contents.to_vec()).await?;
    let Some(descriptor) = descriptors.first() else {
        let body = Envelope { status: "ERROR", body: "No face found in the image!" };
        return Ok(Json(body).into_response());
    };

    let id = state.db.register(&state.population, &filename, descriptor).await?;
    info!("已添加人脸 {filename}: {id}");
    Ok(ok("Face added successfully"))
}

/// 从 ZIP 或 tar 归档批量添加人脸，没有人脸的图片会被跳过
///
/// 所有人脸在同一个事务中写入，任意一张图片失败则整批都不会写入。
#[utoipa::path(
    post,
    path = "/add_faces_in_bulk/",
    request_body(content = AddBulkForm, content_type = "multipart/form-data")
)]
pub async fn add_faces_in_bulk_handler(
    State(state): State<Arc<AppState>>,
    data: TypedMultipart<AddBulkRequest>,
) -> Result<Response> {
    let entries = read_archive(data.file.contents.to_vec()).await.map_err(|e| AppError {
        status: StatusCode::BAD_REQUEST,
        error: e.context("无法读取归档"),
    })?;
    info!("归档中共 {} 个文件", entries.len());

    let images = extract_entries(state.extractor.clone(), entries, |_| {}).await?;
    let faces = select_registrations(images);
    state.db.register_batch(&state.population, &faces).await?;

    Ok(ok("Face(s) added successfully"))
}

/// 更新人脸元数据
#[utoipa::path(
    put,
    path = "/update_metadata/",
    request_body(content = UpdateMetadataRequest, content_type = "application/x-www-form-urlencoded")
)]
pub async fn update_metadata_handler(
    State(state): State<Arc<AppState>>,
    Form(data): Form<UpdateMetadataRequest>,
) -> Result<Response> {
    let metadata = FaceMetadata {
        version_number: data.version_number,
        date: data.date,
        location: data.location,
    };
    if !state.db.update_metadata(&state.population, data.face_id, &metadata).await? {
        return Err(AppError::not_found(format!("人脸不存在: {}", data.face_id)));
    }
    Ok(ok("Updated Successfully"))
}

/// 查询人脸信息，不存在时所有字段为 null
#[utoipa::path(
    post,
    path = "/get_face_info/",
    request_body(content = FaceInfoRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, body = FaceInfo),
    )
)]
pub async fn get_face_info_handler(
    State(state): State<Arc<AppState>>,
    Form(data): Form<FaceInfoRequest>,
) -> Result<Response> {
    let info = state.db.face_info(&state.population, data.face_id).await?.unwrap_or_default();
    Ok(ok(info))
}
