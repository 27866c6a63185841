use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    controller::{SessionController, fulfil},
    errors::{ApiError, ErrorContext, SessionError},
    llm_service::StudyAssistant,
    models::*,
    session::{SessionEvent, StudySession},
    timer::TimerStatus,
};

// Import logging macros
use crate::{log_api_start, log_api_success, log_api_warn, log_validation};

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Mutex<SessionController>>,
    pub assistant: Arc<dyn StudyAssistant>,
}

impl AppState {
    pub fn new(controller: SessionController, assistant: Arc<dyn StudyAssistant>) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            assistant,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketCounts {
    pub total: usize,
    pub unseen: usize,
    pub know: usize,
    pub regular: usize,
    pub dont_know: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerView {
    pub seconds_remaining: u32,
    pub initial_minutes: u32,
    pub status: TimerStatus,
}

/// Everything a client needs to render the current stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionView {
    pub stage: Stage,
    pub error: Option<String>,
    pub current_card: Option<Flashcard>,
    pub counts: BucketCounts,
    pub summary: String,
    pub timer: TimerView,
    pub pending_score: Option<SessionScore>,
    pub current_collection_id: Option<String>,
    pub resumable: bool,
}

impl SessionView {
    pub fn from_session(session: &StudySession) -> Self {
        let boxes = session.boxes();
        let timer = session.timer();

        Self {
            stage: session.stage(),
            error: session.error().map(str::to_string),
            current_card: session.current_card().cloned(),
            counts: BucketCounts {
                total: boxes.total_count(),
                unseen: boxes.unseen.len(),
                know: boxes.bucket(LeitnerBox::Know).len(),
                regular: boxes.bucket(LeitnerBox::Regular).len(),
                dont_know: boxes.bucket(LeitnerBox::DontKnow).len(),
            },
            summary: session.summary().to_string(),
            timer: TimerView {
                seconds_remaining: timer.seconds_remaining(),
                initial_minutes: timer.initial_minutes(),
                status: timer.status(),
            },
            pending_score: session.pending_score().cloned(),
            current_collection_id: session.current_collection_id().map(str::to_string),
            resumable: session.can_resume(),
        }
    }
}

#[derive(Deserialize)]
pub struct GenerateSummaryRequest {
    #[serde(default)]
    pub text: String,
    pub image: Option<ImageAttachment>,
}

#[derive(Deserialize)]
pub struct EditSummaryRequest {
    pub summary: String,
}

#[derive(Deserialize)]
pub struct GradeRequest {
    pub card_id: String,
    pub bucket: LeitnerBox,
}

#[derive(Deserialize)]
pub struct SaveCollectionRequest {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerAction {
    Start,
    Pause,
    Reset,
    SetDuration,
}

#[derive(Deserialize)]
pub struct TimerRequest {
    pub action: TimerAction,
    pub minutes: Option<u32>,
}

fn reject(err: SessionError, context: ErrorContext) -> (StatusCode, Json<ApiResponse<()>>) {
    ApiError::from(err).to_response_with_context(context)
}

/// Apply an event and, when it asks for the AI collaborator, run that request
/// without holding the lock and feed the outcome back in.
async fn apply_event(
    state: &AppState,
    event: SessionEvent,
    context: ErrorContext,
) -> ApiResult<SessionView> {
    let request = {
        let mut controller = state.controller.lock().await;
        match controller.dispatch(event).await {
            Ok(request) => request,
            Err(e) => return Err(reject(e, context)),
        }
    };

    let mut controller = match request {
        Some(request) => {
            debug!(operation = %context.operation, "Waiting for study assistant");
            let outcome = fulfil(state.assistant.as_ref(), request).await;
            let mut controller = state.controller.lock().await;
            if let Err(e) = controller.dispatch(outcome).await {
                return Err(reject(e, context));
            }
            controller
        }
        None => state.controller.lock().await,
    };

    // Retry any write that failed during dispatch
    controller.flush().await;
    Ok(Json(ApiResponse::success(SessionView::from_session(
        controller.session(),
    ))))
}

// Session endpoints
pub async fn get_session(State(state): State<AppState>) -> ApiResult<SessionView> {
    let controller = state.controller.lock().await;
    Ok(Json(ApiResponse::success(SessionView::from_session(
        controller.session(),
    ))))
}

pub async fn start_new_session(State(state): State<AppState>) -> ApiResult<SessionView> {
    log_api_start!("start_new_session");
    apply_event(
        &state,
        SessionEvent::StartNew,
        ErrorContext::new("start_new_session", "session"),
    )
    .await
}

pub async fn resume_session(State(state): State<AppState>) -> ApiResult<SessionView> {
    log_api_start!("resume_session");
    let view = apply_event(
        &state,
        SessionEvent::ResumeSession,
        ErrorContext::new("resume_session", "session"),
    )
    .await?;
    log_api_success!("resume_session", "session resumed");
    Ok(view)
}

pub async fn return_to_dashboard(State(state): State<AppState>) -> ApiResult<SessionView> {
    log_api_start!("return_to_dashboard");
    apply_event(
        &state,
        SessionEvent::ReturnToDashboard,
        ErrorContext::new("return_to_dashboard", "session"),
    )
    .await
}

pub async fn generate_summary(
    State(state): State<AppState>,
    Json(request): Json<GenerateSummaryRequest>,
) -> ApiResult<SessionView> {
    log_api_start!("generate_summary");

    if let Some(image) = &request.image {
        if !image.mime_type.starts_with("image/") || image.data.trim().is_empty() {
            log_validation!(failure, "image_attachment", error = image.mime_type);
            let context = ErrorContext::new("generate_summary", "session");
            return Err(ApiError::BadRequest(
                "The attached file must be a non-empty image".to_string(),
            )
            .to_response_with_context(context));
        }
        log_validation!(success, "image_attachment", "image accepted");
    }

    apply_event(
        &state,
        SessionEvent::GenerateSummary {
            text: request.text,
            image: request.image,
        },
        ErrorContext::new("generate_summary", "session"),
    )
    .await
}

pub async fn edit_summary(
    State(state): State<AppState>,
    Json(request): Json<EditSummaryRequest>,
) -> ApiResult<SessionView> {
    log_api_start!("edit_summary");
    apply_event(
        &state,
        SessionEvent::EditSummary(request.summary),
        ErrorContext::new("edit_summary", "session"),
    )
    .await
}

pub async fn create_flashcards(State(state): State<AppState>) -> ApiResult<SessionView> {
    log_api_start!("create_flashcards");
    let view = apply_event(
        &state,
        SessionEvent::CreateFlashcards,
        ErrorContext::new("create_flashcards", "session"),
    )
    .await?;

    if let Some(data) = &view.data {
        log_api_success!(
            "create_flashcards",
            count = data.counts.unseen,
            "flashcards ready"
        );
    }
    Ok(view)
}

pub async fn grade_card(
    State(state): State<AppState>,
    Json(request): Json<GradeRequest>,
) -> ApiResult<SessionView> {
    log_api_start!("grade_card", card_id = request.card_id);
    let context = ErrorContext::new("grade_card", "card").with_id(&request.card_id);
    apply_event(
        &state,
        SessionEvent::Grade {
            card_id: request.card_id,
            bucket: request.bucket,
        },
        context,
    )
    .await
}

pub async fn finish_session(State(state): State<AppState>) -> ApiResult<SessionView> {
    log_api_start!("finish_session");
    apply_event(
        &state,
        SessionEvent::FinishEarly,
        ErrorContext::new("finish_session", "session"),
    )
    .await
}

pub async fn repeat_session(State(state): State<AppState>) -> ApiResult<SessionView> {
    log_api_start!("repeat_session");
    apply_event(
        &state,
        SessionEvent::Repeat,
        ErrorContext::new("repeat_session", "session"),
    )
    .await
}

pub async fn save_as_new_collection(
    State(state): State<AppState>,
    Json(request): Json<SaveCollectionRequest>,
) -> ApiResult<SessionView> {
    log_api_start!("save_as_new_collection");
    let view = apply_event(
        &state,
        SessionEvent::SaveAsNew { name: request.name },
        ErrorContext::new("save_as_new_collection", "collection"),
    )
    .await?;
    log_api_success!("save_as_new_collection", "collection saved");
    Ok(view)
}

pub async fn update_existing_collection(State(state): State<AppState>) -> ApiResult<SessionView> {
    log_api_start!("update_existing_collection");
    apply_event(
        &state,
        SessionEvent::UpdateExisting,
        ErrorContext::new("update_existing_collection", "collection"),
    )
    .await
}

pub async fn control_timer(
    State(state): State<AppState>,
    Json(request): Json<TimerRequest>,
) -> ApiResult<SessionView> {
    log_api_start!("control_timer");
    let context = ErrorContext::new("control_timer", "timer");

    let event = match (request.action, request.minutes) {
        (TimerAction::Start, _) => SessionEvent::StartTimer,
        (TimerAction::Pause, _) => SessionEvent::PauseTimer,
        (TimerAction::Reset, _) => SessionEvent::ResetTimer,
        (TimerAction::SetDuration, Some(minutes)) => SessionEvent::SetTimerDuration(minutes),
        (TimerAction::SetDuration, None) => {
            log_api_warn!("control_timer", "set_duration without minutes");
            return Err(ApiError::BadRequest(
                "minutes is required for set_duration".to_string(),
            )
            .to_response_with_context(context));
        }
    };

    apply_event(&state, event, context).await
}

// Collection endpoints
pub async fn get_collections(State(state): State<AppState>) -> ApiResult<Vec<Collection>> {
    let controller = state.controller.lock().await;
    let collections = controller.session().library().collections().to_vec();
    log_api_success!("get_collections", count = collections.len(), "collections listed");
    Ok(Json(ApiResponse::success(collections)))
}

pub async fn study_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SessionView> {
    log_api_start!("study_collection", collection_id = id);
    let context = ErrorContext::new("study_collection", "collection")
        .with_id(&id)
        .with_user_message("That collection no longer exists");
    let view = apply_event(
        &state,
        SessionEvent::StudyCollection {
            collection_id: id.clone(),
        },
        context,
    )
    .await?;
    log_api_success!("study_collection", collection_id = id, "study started");
    Ok(view)
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Collection>> {
    log_api_start!("delete_collection", collection_id = id);
    let context = ErrorContext::new("delete_collection", "collection").with_id(&id);

    let mut controller = state.controller.lock().await;
    if let Err(e) = controller
        .dispatch(SessionEvent::DeleteCollection {
            collection_id: id.clone(),
        })
        .await
    {
        return Err(reject(e, context));
    }

    log_api_success!("delete_collection", collection_id = id, "collection deleted");
    Ok(Json(ApiResponse::success(
        controller.session().library().collections().to_vec(),
    )))
}

// History endpoints
pub async fn get_history(State(state): State<AppState>) -> ApiResult<Vec<StudySessionRecord>> {
    let controller = state.controller.lock().await;
    let history = controller.session().library().history().to_vec();
    log_api_success!("get_history", count = history.len(), "history listed");
    Ok(Json(ApiResponse::success(history)))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session routes
        .route("/api/session", get(get_session))
        .route("/api/session/new", post(start_new_session))
        .route("/api/session/resume", post(resume_session))
        .route("/api/session/dashboard", post(return_to_dashboard))
        .route(
            "/api/session/summary",
            post(generate_summary).put(edit_summary),
        )
        .route("/api/session/flashcards", post(create_flashcards))
        .route("/api/session/grade", post(grade_card))
        .route("/api/session/finish", post(finish_session))
        .route("/api/session/repeat", post(repeat_session))
        .route("/api/session/save", post(save_as_new_collection))
        .route("/api/session/update", post(update_existing_collection))
        .route("/api/session/timer", post(control_timer))
        // Collection routes
        .route("/api/collections", get(get_collections))
        .route("/api/collections/:id/study", post(study_collection))
        .route("/api/collections/:id", delete(delete_collection))
        // History routes
        .route("/api/history", get(get_history))
        .with_state(state)
}
