use axum::http::StatusCode;
use serde::Serialize;

use crate::tools::ToolError;

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

pub(crate) fn error_status(err: &ToolError) -> StatusCode {
    match err {
        ToolError::InvalidArguments(_) => StatusCode::BAD_REQUEST,
        ToolError::UnknownTool(_) => StatusCode::NOT_FOUND,
        ToolError::NotConfigured => StatusCode::CONFLICT,
        ToolError::Failed(_) => StatusCode::BAD_GATEWAY,
    }
}
