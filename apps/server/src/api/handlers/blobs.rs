//! Blob storage endpoints.

use crate::{state::AppState, Error, Result};
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::{json, Value};

/// Upload an image to blob storage under its original filename. Same name
/// replaces prior content.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("invalid multipart body: {e}")))?
        .ok_or_else(|| Error::Validation("missing file field".to_string()))?;

    let file_name = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| Error::Validation("uploaded file has no filename".to_string()))?;
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let data = field
        .bytes()
        .await
        .map_err(|e| Error::Validation(format!("failed to read upload: {e}")))?;

    match state
        .blobs
        .upload(&file_name, data.to_vec(), &content_type)
        .await
    {
        Ok(blob_url) => Ok(Json(json!({
            "success": true,
            "blob_url": blob_url,
            "file_name": file_name
        }))),
        Err(e) => Ok(Json(json!({"success": false, "error": e.to_string()}))),
    }
}

/// List every blob in the container with its URL.
pub async fn list_blobs(State(state): State<AppState>) -> Result<Json<Value>> {
    match state.blobs.list().await {
        Ok(blobs) => Ok(Json(json!({"success": true, "blobs": blobs}))),
        Err(e) => Ok(Json(json!({"success": false, "error": e.to_string()}))),
    }
}
