//! Shared multipart upload handling.
//!
//! Files land under the configured uploads directory with a generated name;
//! the returned path is what gets stored on the owning record. Serving the
//! files back is the reverse proxy's job.

use axum::extract::multipart::Field;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::errors::{Error, Result};

/// Persist one multipart field to the uploads directory.
///
/// Returns the public path (`/uploads/{name}`) to store on the record.
pub async fn store_field(uploads_dir: &str, field: Field<'_>) -> Result<String> {
    let original_name = field.file_name().unwrap_or("upload").to_string();
    let extension = std::path::Path::new(&original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_ascii_lowercase();

    let data = field.bytes().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to read uploaded file: {e}"),
    })?;

    if data.is_empty() {
        return Err(Error::BadRequest {
            message: "Uploaded file is empty".to_string(),
        });
    }

    let file_name = format!("{}.{}", Uuid::new_v4().simple(), extension);
    let dir = std::path::Path::new(uploads_dir);
    tokio::fs::create_dir_all(dir).await.map_err(|e| Error::Internal {
        operation: format!("create uploads directory: {e}"),
    })?;

    let path = dir.join(&file_name);
    let mut file = tokio::fs::File::create(&path).await.map_err(|e| Error::Internal {
        operation: format!("create upload file: {e}"),
    })?;
    file.write_all(&data).await.map_err(|e| Error::Internal {
        operation: format!("write upload file: {e}"),
    })?;

    Ok(format!("/uploads/{file_name}"))
}
