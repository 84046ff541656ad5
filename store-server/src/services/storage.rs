//! Upload Storage
//!
//! 上传文件落盘：uuid 文件名 + 原扩展名，按用途分子目录
//! （payment_proofs / feedback_photos / products）。

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::utils::AppError;

/// Maximum upload size (5MB)
const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 付款凭证（图片或 PDF）
    pub async fn save_payment_proof(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        self.save("payment_proofs", original_name, data).await
    }

    /// 反馈照片（仅图片）
    pub async fn save_feedback_photo(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        require_image(original_name)?;
        self.save("feedback_photos", original_name, data).await
    }

    /// 商品图片（仅图片）
    pub async fn save_product_image(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        require_image(original_name)?;
        self.save("products", original_name, data).await
    }

    /// 写入文件，返回相对路径 "subdir/uuid.ext"
    async fn save(
        &self,
        subdir: &str,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        if data.is_empty() {
            return Err(AppError::Validation("Empty file provided".to_string()));
        }
        if data.len() > MAX_FILE_SIZE {
            return Err(AppError::Validation(format!(
                "File too large. Maximum size is {}MB",
                MAX_FILE_SIZE / 1024 / 1024
            )));
        }

        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| {
                AppError::Validation(format!("Invalid file extension for: {}", original_name))
            })?;

        let dir = self.root.join(subdir);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {}", e)))?;

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let path = dir.join(&filename);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to save file: {}", e)))?;

        tracing::info!(
            original_name = %original_name,
            stored = %filename,
            size = data.len(),
            "File uploaded"
        );

        Ok(format!("{}/{}", subdir, filename))
    }
}

fn require_image(original_name: &str) -> Result<(), AppError> {
    let is_image = mime_guess::from_path(original_name)
        .first()
        .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE);
    if is_image {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Not an image file: {}",
            original_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saves_under_subdir_with_uuid_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path());

        let rel = storage
            .save_payment_proof("transfer.PNG", b"fake-bytes")
            .await
            .unwrap();
        assert!(rel.starts_with("payment_proofs/"));
        assert!(rel.ends_with(".png"));
        assert!(dir.path().join(&rel).exists());
    }

    #[tokio::test]
    async fn rejects_empty_and_extensionless_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path());

        assert!(storage.save_payment_proof("proof.png", b"").await.is_err());
        assert!(storage.save_payment_proof("noext", b"data").await.is_err());
    }

    #[tokio::test]
    async fn feedback_photo_must_be_image() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path());

        assert!(storage.save_feedback_photo("notes.pdf", b"data").await.is_err());
        assert!(storage.save_feedback_photo("foto.jpg", b"data").await.is_ok());
    }
}
