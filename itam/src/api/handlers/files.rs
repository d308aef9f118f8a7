use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    api::models::files::FileResponse,
    auth::current_user::{RequiresTier, tier},
    db::{errors::DbError, handlers::file_storage::is_plain_file_name},
    errors::{Error, Result},
};
use tokio_util::io::ReaderStream;

fn not_found(name: &str) -> Error {
    Error::NotFound {
        resource: "File".to_string(),
        id: name.to_string(),
    }
}

fn too_large(max_file_size: u64) -> Error {
    Error::PayloadTooLarge {
        message: format!(
            "File size exceeds maximum allowed size of {} bytes ({} MB)",
            max_file_size,
            max_file_size / (1024 * 1024)
        ),
    }
}

fn multipart_error(e: MultipartError, max_file_size: u64) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_file_size)
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {e}"),
        }
    }
}

#[utoipa::path(
    post,
    path = "/files",
    tag = "files",
    summary = "Upload file",
    description = "Upload an installer into the deployment directory. An existing file with the same name is replaced.",
    request_body(
        content_type = "multipart/form-data",
        description = "A single `file` field; its file name is used as the stored name"
    ),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 400, description = "Missing file or invalid file name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 413, description = "Payload too large"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn upload_file(
    State(state): State<AppState>,
    _: RequiresTier<tier::Manager>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>)> {
    let max_file_size = state.config.files.max_file_size;

    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, max_file_size))? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string).ok_or_else(|| Error::BadRequest {
            message: "Uploaded file must have a file name".to_string(),
        })?;
        if !is_plain_file_name(&filename) {
            return Err(Error::BadRequest {
                message: format!("Invalid file name: {filename:?}"),
            });
        }

        tracing::info!(filename = %filename, "Starting file upload");

        let mut content = Vec::new();
        let mut chunk_stream = field;
        while let Some(chunk) = chunk_stream.chunk().await.map_err(|e| multipart_error(e, max_file_size))? {
            // Fail as soon as the limit is crossed
            if (content.len() + chunk.len()) as u64 > max_file_size {
                tracing::warn!(
                    filename = %filename,
                    max_file_size,
                    "File size limit exceeded, aborting upload"
                );
                return Err(too_large(max_file_size));
            }
            content.extend_from_slice(&chunk);
        }

        let stored = state.files.store(&filename, &content).await?;
        tracing::info!(filename = %stored.name, size = stored.size, "File stored");
        return Ok((StatusCode::CREATED, Json(FileResponse::from(stored))));
    }

    Err(Error::BadRequest {
        message: "Missing multipart field 'file'".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    summary = "List files",
    responses(
        (status = 200, description = "Stored files, sorted by name", body = Vec<FileResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_files(State(state): State<AppState>, _: RequiresTier<tier::Viewer>) -> Result<Json<Vec<FileResponse>>> {
    let files = state.files.list().await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/files/{name}",
    tag = "files",
    summary = "Download file",
    params(("name" = String, Path, description = "File name")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(name = %name))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
    _: RequiresTier<tier::Viewer>,
) -> Result<Response> {
    let (reader, size) = state.files.open(&name).await.map_err(|e| match e {
        DbError::NotFound => not_found(&name),
        other => other.into(),
    })?;

    let disposition = format!("attachment; filename=\"{name}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response())
}

#[utoipa::path(
    delete,
    path = "/files/{name}",
    tag = "files",
    summary = "Delete file",
    description = "Packages referring to the file keep the reference and show it as unavailable.",
    params(("name" = String, Path, description = "File name")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "File not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(name = %name))]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
    _: RequiresTier<tier::Manager>,
) -> Result<StatusCode> {
    if state.files.delete(&name).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&name))
    }
}
