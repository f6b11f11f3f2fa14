//! API request handlers

use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::AppState;
use crate::api::OutputFormat;
use crate::error::Excel2MdError;
use crate::status::TaskStatus;
use crate::types::{ConversionResult, JobId};

/// エラーレスポンス（`{"detail": "..."}`）
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<Excel2MdError> for ApiError {
    fn from(err: Excel2MdError) -> Self {
        let status = match &err {
            Excel2MdError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            Excel2MdError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Excel2MdError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = %self.detail, "Request failed");
        }
        (self.status, Json(ErrorBody { detail: &self.detail })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
    })
}

/// Response for a submitted conversion
#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub task_id: String,
    pub status: String,
    pub message: String,
}

fn parse_bool(value: &str) -> ApiResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Invalid boolean value for use_headers: {}", other),
        )),
    }
}

/// POST /api/v1/convert
///
/// multipart: `file`（必須）、`use_headers`（既定: true）、`output_format`（既定: markdown）
pub async fn convert(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<ConvertResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut use_headers = true;
    let mut output_format = OutputFormat::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                // 読み込み前に拡張子を検証する
                state.service.validate_upload(&filename, None)?;
                let content = field.bytes().await?;
                upload = Some((filename, content.to_vec()));
            }
            "use_headers" => use_headers = parse_bool(&field.text().await?)?,
            "output_format" => output_format = field.text().await?.parse()?,
            _ => {}
        }
    }

    let Some((filename, content)) = upload else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Invalid file format: Filename is required",
        ));
    };

    let task_id = state
        .service
        .submit(&filename, content, use_headers, output_format)
        .map_err(|e| {
            warn!(filename = %filename, error = %e, "Upload rejected");
            e
        })?;

    info!(task_id = %task_id, filename = %filename, format = %output_format, "Conversion submitted");

    Ok(Json(ConvertResponse {
        task_id: task_id.to_string(),
        status: "pending".to_string(),
        message: "Conversion task started".to_string(),
    }))
}

/// GET /api/v1/tasks/:task_id/status
pub async fn task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Json<TaskStatus> {
    Json(state.service.status(&JobId::from(task_id)).await)
}

/// 1シート分の結果
#[derive(Debug, Serialize, Deserialize)]
pub struct SheetEntry {
    pub sheet_name: String,
    pub content: String,
    pub row_count: usize,
    pub column_count: usize,
}

/// Full conversion result
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultResponse {
    pub task_id: String,
    pub status: String,
    pub original_filename: String,
    pub sheets: Vec<SheetEntry>,
    pub total_sheets: usize,
    pub has_archive: bool,
}

impl From<ConversionResult> for ResultResponse {
    fn from(result: ConversionResult) -> Self {
        let sheets = result
            .sheets
            .iter()
            .map(|(name, sheet)| SheetEntry {
                sheet_name: name.to_string(),
                content: sheet.content.clone(),
                row_count: sheet.row_count,
                column_count: sheet.column_count,
            })
            .collect();

        Self {
            task_id: result.task_id.to_string(),
            status: "success".to_string(),
            original_filename: result.original_filename,
            sheets,
            total_sheets: result.total_sheets,
            has_archive: result.has_archive,
        }
    }
}

/// GET /api/v1/tasks/:task_id/result
///
/// 完了前は202、失敗時は500を返します。
pub async fn task_result(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> ApiResult<Response> {
    match state.service.result(&JobId::from(task_id)).await? {
        Some(result) => Ok(Json(ResultResponse::from(result)).into_response()),
        None => Ok(ApiError::new(StatusCode::ACCEPTED, "Task is still processing").into_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub file: Option<String>,
}

/// GET /api/v1/tasks/:task_id/download?file=
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let resolved = state
        .service
        .download(&JobId::from(task_id), query.file.as_deref())
        .await?;

    let content = tokio::fs::read(&resolved.path)
        .await
        .map_err(|e| ApiError::new(StatusCode::NOT_FOUND, e.to_string()))?;

    let disposition = HeaderValue::from_str(&content_disposition(&resolved.filename))
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(resolved.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

/// RFC 5987の`attr-char`以外をエンコードする集合（英数字と`-._~`のみ残す）
const RFC5987_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// `Content-Disposition`の値（非ASCIIのファイル名はRFC 5987形式を併記）
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == filename {
        return format!("attachment; filename=\"{}\"", filename);
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        utf8_percent_encode(filename, RFC5987_ENCODE_SET)
    )
}

/// Response for task file cleanup
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub task_id: String,
    pub uploads_removed: bool,
    pub results_removed: bool,
}

/// DELETE /api/v1/tasks/:task_id
pub async fn cleanup(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<CleanupResponse>> {
    let job_id = JobId::from(task_id);
    let report = state.service.cleanup_task_files(&job_id)?;

    Ok(Json(CleanupResponse {
        task_id: job_id.to_string(),
        uploads_removed: report.uploads_removed,
        results_removed: report.results_removed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (Excel2MdError::InvalidFormat("x".into()), StatusCode::BAD_REQUEST),
            (Excel2MdError::FileTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (Excel2MdError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (Excel2MdError::TaskFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Excel2MdError::Zip("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn test_task_failed_detail() {
        let err = ApiError::from(Excel2MdError::TaskFailed("boom".into()));
        assert_eq!(err.detail, "Task failed: boom");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool(" TRUE ").unwrap());
        assert!(!parse_bool("false").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("report.zip"),
            "attachment; filename=\"report.zip\""
        );
        assert_eq!(
            content_disposition("売上.md"),
            "attachment; filename=\"__.md\"; filename*=UTF-8''%E5%A3%B2%E4%B8%8A.md"
        );
        assert_eq!(
            content_disposition("a\"b.md"),
            "attachment; filename=\"a_b.md\"; filename*=UTF-8''a%22b.md"
        );
        assert_eq!(
            content_disposition("résumé 1.zip"),
            "attachment; filename=\"r_sum_ 1.zip\"; filename*=UTF-8''r%C3%A9sum%C3%A9%201.zip"
        );
    }
}
