use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Allowed image extensions
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Maximum file size (10 MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// URL prefix under which `images_dir` is served.
pub const PUBLIC_PREFIX: &str = "images";

/// Save an uploaded image into `images_dir`.
/// Returns the public path to the file (e.g., "images/<owner>-abc123.jpg")
pub async fn save_image(
    images_dir: &str,
    owner_id: Uuid,
    filename: &str,
    data: &[u8],
) -> Result<String> {
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    // Validate file size
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::Validation("File too large (max 10 MB)".to_string()));
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "Invalid file type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    // Ensure images directory exists
    let images_path = PathBuf::from(images_dir);
    fs::create_dir_all(&images_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create images directory: {}", e))
    })?;

    let new_filename = format!("{}-{}.{}", owner_id, Uuid::new_v4().simple(), extension);
    let file_path = images_path.join(&new_filename);

    let mut file = fs::File::create(&file_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create file: {}", e))
    })?;

    file.write_all(data).await.map_err(|e| {
        AppError::Internal(format!("Failed to write file: {}", e))
    })?;

    Ok(format!("{}/{}", PUBLIC_PREFIX, new_filename))
}

/// Delete an image previously returned by [`save_image`].
pub async fn delete_image(images_dir: &str, public_path: &str) -> Result<()> {
    let Some(file_name) = public_path
        .strip_prefix(PUBLIC_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return Ok(());
    };

    // Never follow paths out of the images directory.
    if file_name.contains('/') || file_name.contains("..") {
        return Ok(());
    }

    let path = PathBuf::from(images_dir).join(file_name);
    if fs::try_exists(&path).await.unwrap_or(false) {
        fs::remove_file(&path).await.map_err(|e| {
            AppError::Internal(format!("Failed to delete file: {}", e))
        })?;
    }

    Ok(())
}
