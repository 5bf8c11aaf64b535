use serde::{Deserialize, Serialize};

/// エラーレスポンス本体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub recoverable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

/// GET /api/health
#[derive(Debug, Clone, Serialize)]
pub struct HealthPayload {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
}

/// POST /api/wizards/{id}/analyze, POST /api/detect
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// POST /api/wizards/{id}/styles
#[derive(Debug, Deserialize)]
pub struct SaveStyleRequest {
    pub style_name: String,
}

/// POST /api/wizards/{id}/styles/select
#[derive(Debug, Deserialize)]
pub struct SelectStyleRequest {
    pub style_id: String,
}

/// POST /api/wizards/{id}/generate
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub keywords: String,
}

/// PUT /api/works/{id}/favorite
#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub favorite: bool,
}
