use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use styleable_core::domain::detection::DetectionReport;
use styleable_core::domain::error::{AppError, ErrorCode};
use styleable_core::domain::job::JobInfo;
use styleable_core::domain::types::{GatedContent, UserStyle, Work, WorkSummary};
use styleable_core::domain::wizard::WizardSnapshot;
use styleable_core::infra::metrics::MetricsSummary;
use styleable_core::usecase::app_service::{AppService, StageOutcome, UnlockOutcome};

use crate::payloads::{
    ErrorPayload, FavoriteRequest, GenerateRequest, HealthPayload, SaveStyleRequest,
    SelectStyleRequest, TextRequest,
};

/// 上流の認証基盤が付与する利用者 ID ヘッダ
pub const USER_ID_HEADER: &str = "x-user-id";

type SharedService = State<Arc<AppService>>;

/// コマンドエラー型（HTTP レスポンスに変換される）
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    App(#[from] AppError),
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::InvalidState => StatusCode::CONFLICT,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Payment => StatusCode::PAYMENT_REQUIRED,
        ErrorCode::Transport
        | ErrorCode::Api
        | ErrorCode::ResponseShape
        | ErrorCode::Extraction
        | ErrorCode::EmptyContent => StatusCode::BAD_GATEWAY,
        ErrorCode::Storage | ErrorCode::Config | ErrorCode::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let CommandError::App(err) = self;
        let status = status_for(err.code);
        if status.is_server_error() {
            tracing::error!(code = err.code.as_str(), "{}", err.message);
        }
        let payload = ErrorPayload {
            code: err.code.as_str().to_string(),
            message: err.message,
            recoverable: err.recoverable,
            upstream_status: err.upstream_status,
        };
        (status, Json(payload)).into_response()
    }
}

type CmdResult<T> = Result<T, CommandError>;

/// 呼び出し元の利用者 ID（未ログインなら None）
#[derive(Debug, Clone)]
pub struct UserId(pub Option<String>);

impl UserId {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok(Self(user))
    }
}

// --- Health / Metrics ---

pub async fn health(State(service): SharedService) -> Json<HealthPayload> {
    Json(HealthPayload {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: service.model_name().to_string(),
    })
}

pub async fn get_metrics(State(service): SharedService) -> Json<MetricsSummary> {
    Json(service.get_metrics())
}

// --- Wizard ---

pub async fn start_wizard(
    State(service): SharedService,
    user: UserId,
) -> (StatusCode, Json<WizardSnapshot>) {
    (StatusCode::CREATED, Json(service.start_wizard(user.0)))
}

pub async fn get_wizard(
    State(service): SharedService,
    user: UserId,
    Path(wizard_id): Path<String>,
) -> CmdResult<Json<WizardSnapshot>> {
    service.authorize_wizard(&wizard_id, user.as_deref())?;
    Ok(Json(service.get_wizard(&wizard_id)?))
}

pub async fn discard_wizard(
    State(service): SharedService,
    user: UserId,
    Path(wizard_id): Path<String>,
) -> CmdResult<StatusCode> {
    service.authorize_wizard(&wizard_id, user.as_deref())?;
    service.discard_wizard(&wizard_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn analyze_style(
    State(service): SharedService,
    user: UserId,
    Path(wizard_id): Path<String>,
    Json(req): Json<TextRequest>,
) -> CmdResult<Json<StageOutcome>> {
    service.authorize_wizard(&wizard_id, user.as_deref())?;
    Ok(Json(service.analyze_style(&wizard_id, &req.text).await?))
}

pub async fn save_style(
    State(service): SharedService,
    user: UserId,
    Path(wizard_id): Path<String>,
    Json(req): Json<SaveStyleRequest>,
) -> CmdResult<(StatusCode, Json<UserStyle>)> {
    service.authorize_wizard(&wizard_id, user.as_deref())?;
    let style = service.save_style(&wizard_id, &req.style_name)?;
    Ok((StatusCode::CREATED, Json(style)))
}

pub async fn select_style(
    State(service): SharedService,
    user: UserId,
    Path(wizard_id): Path<String>,
    Json(req): Json<SelectStyleRequest>,
) -> CmdResult<Json<StageOutcome>> {
    service.authorize_wizard(&wizard_id, user.as_deref())?;
    Ok(Json(service.select_style(&wizard_id, &req.style_id)?))
}

pub async fn generate_mimic(
    State(service): SharedService,
    user: UserId,
    Path(wizard_id): Path<String>,
    Json(req): Json<GenerateRequest>,
) -> CmdResult<Json<StageOutcome>> {
    service.authorize_wizard(&wizard_id, user.as_deref())?;
    Ok(Json(service.generate_mimic(&wizard_id, &req.keywords).await?))
}

pub async fn humanize(
    State(service): SharedService,
    user: UserId,
    Path(wizard_id): Path<String>,
) -> CmdResult<Json<StageOutcome>> {
    service.authorize_wizard(&wizard_id, user.as_deref())?;
    Ok(Json(service.humanize(&wizard_id).await?))
}

pub async fn back(
    State(service): SharedService,
    user: UserId,
    Path(wizard_id): Path<String>,
) -> CmdResult<Json<StageOutcome>> {
    service.authorize_wizard(&wizard_id, user.as_deref())?;
    Ok(Json(service.back(&wizard_id)?))
}

pub async fn unlock(
    State(service): SharedService,
    user: UserId,
    Path(wizard_id): Path<String>,
) -> CmdResult<Json<UnlockOutcome>> {
    service.authorize_wizard(&wizard_id, user.as_deref())?;
    Ok(Json(service.unlock(&wizard_id).await?))
}

pub async fn get_content(
    State(service): SharedService,
    user: UserId,
    Path(wizard_id): Path<String>,
) -> CmdResult<Json<GatedContent>> {
    service.authorize_wizard(&wizard_id, user.as_deref())?;
    Ok(Json(service.content(&wizard_id)?))
}

// --- Detection ---

pub async fn detect_ai(
    State(service): SharedService,
    Json(req): Json<TextRequest>,
) -> CmdResult<Json<DetectionReport>> {
    Ok(Json(service.detect_ai(&req.text).await?))
}

// --- Styles ---

pub async fn list_styles(
    State(service): SharedService,
    user: UserId,
) -> CmdResult<Json<Vec<UserStyle>>> {
    Ok(Json(service.list_styles(user.as_deref())?))
}

pub async fn delete_style(
    State(service): SharedService,
    user: UserId,
    Path(style_id): Path<String>,
) -> CmdResult<StatusCode> {
    service.delete_style(user.as_deref(), &style_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Works ---

pub async fn list_works(
    State(service): SharedService,
    user: UserId,
) -> CmdResult<Json<Vec<WorkSummary>>> {
    let works = service.list_works(user.as_deref())?;
    Ok(Json(works.iter().map(WorkSummary::from).collect()))
}

pub async fn get_work(
    State(service): SharedService,
    user: UserId,
    Path(work_id): Path<String>,
) -> CmdResult<Json<Work>> {
    Ok(Json(service.get_work(user.as_deref(), &work_id)?))
}

pub async fn set_favorite(
    State(service): SharedService,
    user: UserId,
    Path(work_id): Path<String>,
    Json(req): Json<FavoriteRequest>,
) -> CmdResult<Json<Work>> {
    Ok(Json(service.set_favorite(user.as_deref(), &work_id, req.favorite)?))
}

pub async fn toggle_favorite(
    State(service): SharedService,
    user: UserId,
    Path(work_id): Path<String>,
) -> CmdResult<Json<Work>> {
    Ok(Json(service.toggle_favorite(user.as_deref(), &work_id)?))
}

// --- Jobs ---

pub async fn get_job(
    State(service): SharedService,
    Path(job_id): Path<String>,
) -> CmdResult<Json<JobInfo>> {
    Ok(Json(service.get_job(&job_id).await?))
}
