use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 已上传的媒体文件记录
/// 实际字节存放在存储后端，数据库只记元信息和可访问 URL
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub storage_key: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl MediaFile {
    pub fn new(
        user_id: &str,
        filename: String,
        content_type: String,
        size: u64,
        storage_key: String,
        url: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            filename,
            content_type,
            size,
            storage_key,
            url,
            created_at: Utc::now(),
        }
    }

    pub fn to_response(&self) -> MediaUploadResponse {
        MediaUploadResponse {
            id: self.id.clone(),
            filename: self.filename.clone(),
            content_type: self.content_type.clone(),
            size: self.size,
            url: self.url.clone(),
            created_at: self.created_at,
        }
    }
}

/// 上传成功后返回给客户端的下载信息；
/// 客户端只保存其中的 url 字符串
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadResponse {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}
