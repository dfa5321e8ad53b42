use crate::{
    error::{AppError, Result},
    models::media::MediaUploadResponse,
    models::user::User,
    state::AppState,
};
use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload_image))
        .route("/files/*path", get(serve_file))
        .route("/:file_id", delete(delete_file))
        .route("/", get(list_user_files))
}

#[derive(Debug, Deserialize)]
pub struct MediaListQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// 上传图片
/// POST /api/media/upload
async fn upload_image(
    State(state): State<Arc<AppState>>,
    user: User,
    mut multipart: Multipart,
) -> Result<Json<MediaUploadResponse>> {
    debug!("Processing image upload for user: {}", user.id);

    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to process multipart field: {}", e);
        AppError::BadRequest("Could not process the uploaded file".to_string())
    })? {
        let field_name = field.name().unwrap_or("");

        if field_name == "file" {
            filename = field.file_name().map(|s| s.to_string());
            content_type = field.content_type().map(|s| s.to_string());

            let data = field.bytes().await.map_err(|e| {
                error!("Failed to read file data: {}", e);
                AppError::BadRequest("Could not read the uploaded file".to_string())
            })?;

            file_data = Some(data.to_vec());
            break;
        }
    }

    let file_data = file_data
        .ok_or_else(|| AppError::BadRequest("No file found in the upload".to_string()))?;
    let filename = filename.unwrap_or_else(|| "unnamed".to_string());
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());

    debug!("Uploading file: {} ({}), size: {} bytes", filename, content_type, file_data.len());

    let upload_result = state
        .media_service
        .upload_image(&user.id, &filename, &content_type, file_data)
        .await?;

    info!("Successfully uploaded image for user: {}, filename: {}", user.id, filename);

    Ok(Json(upload_result))
}

/// 获取文件
/// GET /api/media/files/*path
async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path(file_path): Path<String>,
) -> Result<Response<Body>> {
    debug!("Serving file: {}", file_path);

    let file_data = state.media_service.get_file(&file_path).await?;

    let content_type = determine_content_type(&file_path);

    // 内容寻址的文件不会变化，可以放心长缓存
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(file_data))
        .map_err(|e| {
            error!("Failed to build file response: {}", e);
            AppError::Internal("Failed to build file response".to_string())
        })?;

    Ok(response)
}

/// 删除文件
/// DELETE /api/media/:file_id
async fn delete_file(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(file_id): Path<String>,
) -> Result<Json<Value>> {
    debug!("Deleting file: {} for user: {}", file_id, user.id);

    state.media_service.delete_file(&user.id, &file_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "File deleted successfully"
    })))
}

/// 获取用户的文件列表
/// GET /api/media
async fn list_user_files(
    State(state): State<Arc<AppState>>,
    user: User,
    Query(query): Query<MediaListQuery>,
) -> Result<Json<Value>> {
    debug!("Listing files for user: {}", user.id);

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (files, total) = state
        .media_service
        .get_user_files(&user.id, page, limit)
        .await?;

    let total_pages = (total + limit - 1) / limit;

    Ok(Json(json!({
        "files": files.iter().map(|f| f.to_response()).collect::<Vec<_>>(),
        "pagination": {
            "current_page": page,
            "total_pages": total_pages,
            "total_items": total,
            "items_per_page": limit,
            "has_next": page < total_pages,
            "has_prev": page > 1,
        }
    })))
}

fn determine_content_type(file_path: &str) -> &'static str {
    let extension = file_path.split('.').last().unwrap_or("").to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determine_content_type() {
        assert_eq!(determine_content_type("ab/abc.png"), "image/png");
        assert_eq!(determine_content_type("ab/abc.JPG"), "image/jpeg");
        assert_eq!(determine_content_type("ab/no-extension"), "application/octet-stream");
    }
}
