//! Printer API Handlers

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    response::{IntoResponse, Response},
};
use http::header;
use printer_client::ClientResult;
use shared::{ApiResult, AppError, AppResult, Job, Printer};
use std::future::Future;
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use super::extract::{PrinterId, ToolPath};
use crate::connection::LiveConnection;
use crate::core::ServerState;

/// Multipart field carrying the print file
const PRINT_FIELD: &str = "printfile";

/// Content type used when the frame format is not recognised
const FALLBACK_IMAGE_TYPE: &str = "image/png";

/// Resolve `{id}` to a connected printer
fn resolve(state: &ServerState, id: &str) -> AppResult<LiveConnection> {
    state.registry.find(id).ok_or_else(|| {
        tracing::debug!(printer = %id, "Printer not found");
        AppError::not_found()
    })
}

fn parse_tool_index(raw: &str) -> AppResult<u32> {
    raw.parse().map_err(|_| AppError::bad_request())
}

/// Run a device operation under the operation timeout
///
/// Device errors become operation errors (status 200, message verbatim).
async fn device_call<T>(
    state: &ServerState,
    operation: impl Future<Output = ClientResult<T>>,
) -> AppResult<T> {
    match tokio::time::timeout(state.operation_timeout(), operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AppError::operation(e.to_string())),
        Err(_) => Err(AppError::timeout()),
    }
}

/// GET /api/v1/printers - connected printers
pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<Printer>> {
    ApiResult::success(state.registry.connected_printers())
}

/// GET /api/v1/printers/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    PrinterId(id): PrinterId,
) -> AppResult<ApiResult<Printer>> {
    let conn = resolve(&state, &id)?;
    Ok(ApiResult::success(conn.printer))
}

/// GET /api/v1/printers/{id}/snapshot.jpg - raw camera frame
///
/// Bypasses the envelope on success. A failed capture is a 500.
pub async fn snapshot(
    State(state): State<ServerState>,
    PrinterId(id): PrinterId,
) -> AppResult<Response> {
    let conn = resolve(&state, &id)?;

    let frame = device_call(&state, conn.client.camera_frame())
        .await
        .map_err(|e| {
            tracing::error!(printer = %id, error = %e, "Camera frame failed");
            AppError::internal()
        })?;

    let content_type = image::guess_format(&frame)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_IMAGE_TYPE);

    Ok(([(header::CONTENT_TYPE, content_type)], frame).into_response())
}

/// GET /api/v1/printers/{id}/current_job
///
/// A bare JSON `null` (no envelope) when the printer has not reported any
/// metadata yet.
pub async fn current_job(
    State(state): State<ServerState>,
    PrinterId(id): PrinterId,
) -> AppResult<Response> {
    let conn = resolve(&state, &id)?;

    Ok(match conn.printer.metadata {
        None => Json(serde_json::Value::Null).into_response(),
        Some(metadata) => ApiResult::<Option<Job>>::success(metadata.current_process).into_response(),
    })
}

/// POST /api/v1/printers/{id}/current_job/suspend
pub async fn suspend(
    State(state): State<ServerState>,
    PrinterId(id): PrinterId,
) -> AppResult<ApiResult<bool>> {
    let conn = resolve(&state, &id)?;
    device_call(&state, conn.client.suspend()).await?;
    Ok(ApiResult::success(true))
}

/// POST /api/v1/printers/{id}/current_job/resume
pub async fn resume(
    State(state): State<ServerState>,
    PrinterId(id): PrinterId,
) -> AppResult<ApiResult<bool>> {
    let conn = resolve(&state, &id)?;
    device_call(&state, conn.client.resume()).await?;
    Ok(ApiResult::success(true))
}

/// DELETE /api/v1/printers/{id}/current_job - cancel
pub async fn cancel(
    State(state): State<ServerState>,
    PrinterId(id): PrinterId,
) -> AppResult<ApiResult<bool>> {
    let conn = resolve(&state, &id)?;
    device_call(&state, conn.client.cancel()).await?;
    Ok(ApiResult::success(true))
}

/// POST /api/v1/printers/{id}/load_filament/{tool_index}
pub async fn load_filament(
    State(state): State<ServerState>,
    ToolPath { id, tool_index }: ToolPath,
) -> AppResult<ApiResult<bool>> {
    let conn = resolve(&state, &id)?;
    let tool_index = parse_tool_index(&tool_index)?;
    device_call(&state, conn.client.load_filament(tool_index)).await?;
    Ok(ApiResult::success(true))
}

/// POST /api/v1/printers/{id}/unload_filament/{tool_index}
pub async fn unload_filament(
    State(state): State<ServerState>,
    ToolPath { id, tool_index }: ToolPath,
) -> AppResult<ApiResult<bool>> {
    let conn = resolve(&state, &id)?;
    let tool_index = parse_tool_index(&tool_index)?;
    device_call(&state, conn.client.unload_filament(tool_index)).await?;
    Ok(ApiResult::success(true))
}

/// POST /api/v1/printers/{id}/prints - submit a print (multipart `printfile`)
pub async fn print(
    State(state): State<ServerState>,
    PrinterId(id): PrinterId,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<ApiResult<bool>> {
    let conn = resolve(&state, &id)?;
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Invalid multipart request");
        AppError::bad_request()
    })?;

    let (filename, file, size) = spool_print_file(&mut multipart).await?;
    tracing::info!(printer = %id, filename = %filename, size, "Submitting print");

    device_call(&state, conn.client.print(&filename, Box::new(file), size)).await?;
    Ok(ApiResult::success(true))
}

/// Find the `printfile` field and stream it into an unnamed temp file
///
/// The device needs the exact size before the data, so the upload is
/// spooled to disk chunk by chunk and handed over rewound.
async fn spool_print_file(multipart: &mut Multipart) -> AppResult<(String, File, u64)> {
    let bad_request = |e: MultipartError| {
        tracing::debug!(error = %e, "Malformed print upload");
        AppError::bad_request()
    };
    let internal = |e: std::io::Error| {
        tracing::error!(error = %e, "Failed to spool print upload");
        AppError::internal()
    };

    while let Some(mut field) = multipart.next_field().await.map_err(bad_request)? {
        if field.name() != Some(PRINT_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(AppError::bad_request)?;

        let mut file = File::from_std(tempfile::tempfile().map_err(internal)?);
        let mut size = 0u64;
        while let Some(chunk) = field.chunk().await.map_err(bad_request)? {
            file.write_all(&chunk).await.map_err(internal)?;
            size += chunk.len() as u64;
        }
        file.flush().await.map_err(internal)?;
        file.seek(SeekFrom::Start(0)).await.map_err(internal)?;
        return Ok((filename, file, size));
    }

    Err(AppError::bad_request())
}
