use crate::{
    config::Config,
    error::{AppError, Result},
    models::media::{MediaFile, MediaUploadResponse},
    services::Database,
};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// 媒体服务：图片上传、存取与清理。
/// 文件按内容寻址存储，同样的字节永远落在同一个存储键上；
/// 数据库里的 media_file 记录只保存元信息和可访问 URL。
#[derive(Clone)]
pub struct MediaService {
    db: Arc<Database>,
    config: Config,
    #[cfg(feature = "s3-storage")]
    s3_client: Option<aws_sdk_s3::Client>,
}

impl MediaService {
    pub async fn new(db: Arc<Database>, config: &Config) -> Result<Self> {
        if config.storage_type == "local" {
            fs::create_dir_all(&config.media_storage_path).await?;
            debug!("Media storage directory ready: {}", config.media_storage_path);
        }

        #[cfg(feature = "s3-storage")]
        let s3_client = if config.storage_type == "s3" {
            Some(build_s3_client(config).await)
        } else {
            None
        };

        Ok(Self {
            db,
            config: config.clone(),
            #[cfg(feature = "s3-storage")]
            s3_client,
        })
    }

    /// 上传图片：校验大小与类型、解码确认内容、按内容哈希存储
    pub async fn upload_image(
        &self,
        user_id: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<MediaUploadResponse> {
        if !self.config.enable_media_uploads {
            return Err(AppError::ServiceUnavailable("Media uploads are disabled".to_string()));
        }

        if data.is_empty() {
            return Err(AppError::FileUpload("Uploaded file is empty".to_string()));
        }
        if data.len() as u64 > self.config.max_upload_size {
            return Err(AppError::FileUpload(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.config.max_upload_size
            )));
        }

        let extension = extension_for(filename, content_type);
        let allowed = self
            .config
            .allowed_image_types
            .split(',')
            .any(|t| t.trim().eq_ignore_ascii_case(&extension));
        if !allowed {
            return Err(AppError::FileUpload(format!(
                "File type '{}' is not allowed",
                extension
            )));
        }

        // 真正解码一次，拒绝伪装成图片的内容
        image::load_from_memory(&data)
            .map_err(|e| {
                warn!("Rejecting upload that failed image decode: {}", e);
                AppError::FileUpload("Uploaded file is not a valid image".to_string())
            })?;

        let storage_key = storage_key(&data, &extension);
        let size = data.len() as u64;
        self.store(&storage_key, data, content_type).await?;

        let url = format!("/api/media/files/{}", storage_key);
        let record = MediaFile::new(
            user_id,
            filename.to_string(),
            content_type.to_string(),
            size,
            storage_key,
            url,
        );
        let created = self.db.create("media_file", record).await?;

        info!("Stored media file {} for user {}", created.id, user_id);
        Ok(created.to_response())
    }

    /// 读取文件字节，供文件服务路由回传
    pub async fn get_file(&self, path: &str) -> Result<Vec<u8>> {
        if !is_safe_path(path) {
            return Err(AppError::BadRequest("Invalid file path".to_string()));
        }

        #[cfg(feature = "s3-storage")]
        if let Some(client) = &self.s3_client {
            let output = client
                .get_object()
                .bucket(&self.config.s3_bucket)
                .key(path)
                .send()
                .await
                .map_err(|_| AppError::not_found("File"))?;
            let bytes = output
                .body
                .collect()
                .await
                .map_err(|e| AppError::Internal(format!("Failed to read object body: {}", e)))?;
            return Ok(bytes.into_bytes().to_vec());
        }

        let full_path = PathBuf::from(&self.config.media_storage_path).join(path);
        match fs::read(&full_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found("File"))
            }
            Err(e) => Err(AppError::from(e)),
        }
    }

    /// 用户的上传记录，分页
    pub async fn get_user_files(
        &self,
        user_id: &str,
        page: usize,
        limit: usize,
    ) -> Result<(Vec<MediaFile>, usize)> {
        let start = page.saturating_sub(1) * limit;

        let mut response = self
            .db
            .query_with_params(
                r#"
                    SELECT * FROM media_file
                    WHERE user_id = $user_id
                    ORDER BY created_at DESC
                    LIMIT $limit START $start
                "#,
                json!({ "user_id": user_id, "limit": limit, "start": start }),
            )
            .await?;
        let files: Vec<MediaFile> = response.take(0)?;

        let mut response = self
            .db
            .query_with_params(
                "SELECT count() AS count FROM media_file WHERE user_id = $user_id GROUP ALL",
                json!({ "user_id": user_id }),
            )
            .await?;
        let rows: Vec<Value> = response.take(0)?;
        let total = rows
            .first()
            .and_then(|v| v.get("count"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        Ok((files, total))
    }

    /// 删除上传记录；内容寻址的字节只有在无人引用时才真正删除
    pub async fn delete_file(&self, user_id: &str, file_id: &str) -> Result<()> {
        let record: MediaFile = self
            .db
            .get_by_id("media_file", file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File"))?;

        if record.user_id != user_id {
            return Err(AppError::forbidden("You are not authorized to delete this file"));
        }

        self.db.delete_by_id("media_file", file_id).await?;

        let mut response = self
            .db
            .query_with_params(
                "SELECT count() AS count FROM media_file WHERE storage_key = $key GROUP ALL",
                json!({ "key": record.storage_key }),
            )
            .await?;
        let rows: Vec<Value> = response.take(0)?;
        let references = rows
            .first()
            .and_then(|v| v.get("count"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0);

        if references == 0 {
            self.remove_bytes(&record.storage_key).await?;
            debug!("Removed unreferenced media bytes: {}", record.storage_key);
        }

        info!("Deleted media file {} for user {}", file_id, user_id);
        Ok(())
    }

    async fn store(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        #[cfg(feature = "s3-storage")]
        if let Some(client) = &self.s3_client {
            client
                .put_object()
                .bucket(&self.config.s3_bucket)
                .key(key)
                .content_type(content_type)
                .body(aws_sdk_s3::types::ByteStream::from(data))
                .send()
                .await
                .map_err(|e| AppError::Internal(format!("S3 upload failed: {}", e)))?;
            return Ok(());
        }

        #[cfg(not(feature = "s3-storage"))]
        let _ = content_type;

        let full_path = PathBuf::from(&self.config.media_storage_path).join(key);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full_path, data).await?;
        Ok(())
    }

    async fn remove_bytes(&self, key: &str) -> Result<()> {
        #[cfg(feature = "s3-storage")]
        if let Some(client) = &self.s3_client {
            client
                .delete_object()
                .bucket(&self.config.s3_bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| AppError::Internal(format!("S3 delete failed: {}", e)))?;
            return Ok(());
        }

        let full_path = PathBuf::from(&self.config.media_storage_path).join(key);
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::from(e)),
        }
    }
}

#[cfg(feature = "s3-storage")]
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    use aws_sdk_s3::config::Credentials;

    let credentials = Credentials::new(
        config.s3_access_key.clone(),
        config.s3_secret_key.clone(),
        None,
        None,
        "rainbow-learn",
    );

    let shared = aws_config::from_env()
        .region(aws_sdk_s3::config::Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .load()
        .await;

    let mut builder = aws_sdk_s3::config::Builder::from(&shared).force_path_style(true);
    if let Some(endpoint) = &config.s3_endpoint {
        builder = builder.endpoint_url(endpoint);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}

/// 文件扩展名：优先取文件名后缀，退回到 MIME 子类型
fn extension_for(filename: &str, content_type: &str) -> String {
    let from_name = filename
        .rsplit('.')
        .next()
        .filter(|ext| !ext.is_empty() && *ext != filename);

    match from_name {
        Some(ext) => ext.to_lowercase(),
        None => content_type
            .rsplit('/')
            .next()
            .unwrap_or("bin")
            .to_lowercase(),
    }
}

/// 内容寻址的存储键：两级目录避免单目录文件过多
fn storage_key(data: &[u8], extension: &str) -> String {
    let hash = hex::encode(Sha256::digest(data));
    format!("{}/{}.{}", &hash[..2], hash, extension)
}

/// 拒绝目录穿越与绝对路径
fn is_safe_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains("..")
        && !path.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_filename() {
        assert_eq!(extension_for("photo.JPG", "image/jpeg"), "jpg");
        assert_eq!(extension_for("archive.tar.gz", "application/gzip"), "gz");
    }

    #[test]
    fn test_extension_falls_back_to_content_type() {
        assert_eq!(extension_for("unnamed", "image/png"), "png");
        assert_eq!(extension_for("unnamed", "weird"), "weird");
    }

    #[test]
    fn test_storage_key_is_content_addressed() {
        let a = storage_key(b"same bytes", "png");
        let b = storage_key(b"same bytes", "png");
        let c = storage_key(b"other bytes", "png");

        assert_eq!(a, b);
        assert_ne!(a, c);
        // 两级目录布局：ab/abcdef....png
        assert_eq!(&a[2..3], "/");
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn test_path_safety() {
        assert!(is_safe_path("ab/abcdef.png"));

        assert!(!is_safe_path("../etc/passwd"));
        assert!(!is_safe_path("/etc/passwd"));
        assert!(!is_safe_path("ab/../../secret"));
        assert!(!is_safe_path(""));
    }
}
