use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::api::recommend::{clamp_top_k, truncate_to_char_boundary};
use crate::api::{api_error, multipart_error, multipart_rejection, path_param, ApiError};
use crate::llm::mime_for_path;
use crate::models::UploadResponse;
use crate::pipeline::{recommend, RecommendationQuery};
use crate::state::AppState;

const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
const MAX_PROMPT_LEN: usize = 1000;

/// POST /api/upload - Image (+ optional prompt) recommendations
///
/// Multipart fields: `imageFile` (required), `prompt` (optional).
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(multipart_rejection)?;
    let mut image: Option<(String, Bytes)> = None;
    let mut prompt = String::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "imageFile" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                image = Some((filename, data));
            }
            "prompt" => {
                prompt = field.text().await.map_err(multipart_error)?;
            }
            _ => {}
        }
    }

    let Some((original_name, data)) = image else {
        return Err(api_error(StatusCode::BAD_REQUEST, "No image file part"));
    };
    if original_name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No selected file"));
    }
    if !allowed_file(&original_name) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!(
                "File type not allowed. Please upload one of: {}.",
                ALLOWED_EXTENSIONS.join(", ")
            ),
        ));
    }

    let filename = secure_filename(&format!("{}_{original_name}", uuid::Uuid::new_v4()));
    let path = state.config.uploads_dir().join(&filename);

    if let Err(e) = tokio::fs::write(&path, &data).await {
        tracing::error!("Failed to save upload {}: {e}", path.display());
        let _ = tokio::fs::remove_file(&path).await;
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save uploaded file",
        ));
    }
    tracing::info!("Image saved to {} ({} bytes)", path.display(), data.len());

    let prompt = truncate_to_char_boundary(prompt.trim(), MAX_PROMPT_LEN);
    let catalog = state.catalog();
    let outcome = recommend(
        &state.http_client,
        &state.config,
        &catalog,
        RecommendationQuery {
            image: Some(path.as_path()),
            prompt: &prompt,
            top_k: clamp_top_k(None, state.config.scoring.top_k),
        },
    )
    .await;

    Ok(Json(UploadResponse {
        message: "Image processed successfully.".to_string(),
        image_preview_url: format!("/uploads/{filename}"),
        filename_server_temp: filename,
        recommendations: outcome.recommendations,
        image_description: outcome.image_description,
        refinement: outcome.refinement,
    }))
}

/// GET /uploads/{filename} - Serve a previously uploaded image
pub async fn serve_upload(
    State(state): State<AppState>,
    filename: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let filename = path_param(filename)?;
    if filename.is_empty() || secure_filename(&filename) != filename {
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid filename"));
    }

    let path = state.config.uploads_dir().join(&filename);
    let data = tokio::fs::read(&path)
        .await
        .map_err(|_| api_error(StatusCode::NOT_FOUND, "File not found"))?;

    Ok(([(header::CONTENT_TYPE, mime_for_path(&path))], data))
}

fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reduce a client-supplied filename to `[A-Za-z0-9._-]`, with whitespace
/// turned into `_` and no leading dots or underscores.
pub(crate) fn secure_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' => ' ',
            c => c,
        })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .collect();

    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("photo.png"));
        assert!(allowed_file("photo.JPG"));
        assert!(allowed_file("a.b.jpeg"));
        assert!(allowed_file("anim.gif"));
        assert!(!allowed_file("photo.webp"));
        assert!(!allowed_file("noextension"));
        assert!(!allowed_file("script.png.exe"));
    }

    #[test]
    fn test_secure_filename_strips_paths() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("my photo (1).jpg"), "my_photo_1.jpg");
        assert_eq!(secure_filename(".hidden.png"), "hidden.png");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn test_secure_filename_is_stable_for_clean_names() {
        let name = "3f2a_red-shirt.png";
        assert_eq!(secure_filename(name), name);
    }
}
