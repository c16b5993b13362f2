mod api;
mod error;
mod state;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{post, put};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use self::state::*;
pub use self::types::SearchResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::search_faces_handler,
        api::search_encoding_handler,
        api::add_face_handler,
        api::add_faces_in_bulk_handler,
        api::update_metadata_handler,
        api::get_face_info_handler,
    ),
    components(schemas(
        types::SearchForm,
        types::SearchEncodingRequest,
        types::SearchResponse,
        types::AddFaceForm,
        types::AddBulkForm,
        types::UpdateMetadataRequest,
        types::FaceInfoRequest,
        crate::db::MatchResult,
        crate::db::FaceInfo,
    ))
)]
pub struct ApiDoc;

/// 构建API服务器，`body_limit` 为请求体大小上限（字节）
pub fn create_app(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/search_faces/", post(api::search_faces_handler))
        .route("/search_encoding/", post(api::search_encoding_handler))
        .route("/add_face/", post(api::add_face_handler))
        .route("/add_faces_in_bulk/", post(api::add_faces_in_bulk_handler))
        .route("/update_metadata/", put(api::update_metadata_handler))
        .route("/get_face_info/", post(api::get_face_info_handler))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}
