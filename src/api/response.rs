use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Meta {
    pub message: String,
    pub code: u16,
    pub status: &'static str,
}

/// Envelope shared by every JSON response: `{meta: {message, code, status}, data}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub meta: Meta,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            meta: Meta {
                message: message.into(),
                code: StatusCode::OK.as_u16(),
                status: "success",
            },
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            meta: Meta {
                message: message.into(),
                code: status.as_u16(),
                status: "error",
            },
            data: None,
        }
    }
}

pub type ApiResult<T> = crate::error::Result<Json<ApiResponse<T>>>;

pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(message, data)))
}
