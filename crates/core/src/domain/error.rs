use serde::Serialize;

use crate::infra::extract::ExtractionError;
use crate::infra::llm::ModelError;
use crate::infra::payment::PaymentError;

/// アプリケーション共通エラーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    #[serde(rename = "E_VALIDATION")]
    Validation,
    #[serde(rename = "E_TRANSPORT")]
    Transport,
    #[serde(rename = "E_API")]
    Api,
    #[serde(rename = "E_RESPONSE_SHAPE")]
    ResponseShape,
    #[serde(rename = "E_EXTRACTION")]
    Extraction,
    #[serde(rename = "E_EMPTY_CONTENT")]
    EmptyContent,
    #[serde(rename = "E_INVALID_STATE")]
    InvalidState,
    #[serde(rename = "E_NOT_FOUND")]
    NotFound,
    #[serde(rename = "E_STORAGE")]
    Storage,
    #[serde(rename = "E_PAYMENT")]
    Payment,
    #[serde(rename = "E_CONFIG")]
    Config,
    #[serde(rename = "E_INTERNAL")]
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "E_VALIDATION",
            Self::Transport => "E_TRANSPORT",
            Self::Api => "E_API",
            Self::ResponseShape => "E_RESPONSE_SHAPE",
            Self::Extraction => "E_EXTRACTION",
            Self::EmptyContent => "E_EMPTY_CONTENT",
            Self::InvalidState => "E_INVALID_STATE",
            Self::NotFound => "E_NOT_FOUND",
            Self::Storage => "E_STORAGE",
            Self::Payment => "E_PAYMENT",
            Self::Config => "E_CONFIG",
            Self::Internal => "E_INTERNAL",
        }
    }
}

/// アプリケーションエラー（API レスポンス兼用）
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub recoverable: bool,
    /// 上流 API が返した HTTP ステータス（E_API のみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

impl AppError {
    fn new(code: ErrorCode, msg: impl Into<String>, recoverable: bool) -> Self {
        Self {
            code,
            message: msg.into(),
            recoverable,
            upstream_status: None,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, msg, true)
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, msg, true)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg, true)
    }

    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Extraction, msg, true)
    }

    pub fn empty_content(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::EmptyContent, msg, true)
    }

    pub fn payment(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Payment, msg, true)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, msg, false)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg, false)
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Storage, msg, true)
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Transport(_) => Self::new(ErrorCode::Transport, err.to_string(), true),
            ModelError::Api { status, .. } => {
                let mut app = Self::new(ErrorCode::Api, format!("API call failed: {status}"), true);
                app.upstream_status = Some(status);
                app
            }
            ModelError::ResponseShape(_) => {
                Self::new(ErrorCode::ResponseShape, err.to_string(), true)
            }
        }
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        Self::new(ErrorCode::Extraction, err.to_string(), true)
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        Self::payment(err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}
