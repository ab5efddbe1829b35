use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{BookingOutcome, BookingRequest, Slot, Step};
use crate::services::{dialogue, normalize, reconcile};
use crate::state::AppState;

const MAX_MESSAGE_LEN: usize = 1000;
const MAX_SESSION_ID_LEN: usize = 100;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    pub step: &'static str,
    pub available_slots: Vec<Slot>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = payload.message.trim().to_string();
    if message.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::Validation(format!(
            "Message is too long (max {MAX_MESSAGE_LEN} characters)"
        )));
    }

    let session_id = match payload.session_id {
        Some(id) => validate_session_id(&id)?,
        None => uuid::Uuid::new_v4().to_string(),
    };

    // synthetic typing latency; input for this session blocks until it elapses
    if state.config.typing_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(state.config.typing_delay_ms)).await;
    }

    let reply = dialogue::process_message(&state, &session_id, &message).await;
    let step = state
        .sessions
        .get(&session_id)
        .map(|s| s.step)
        .unwrap_or(Step::AskingName);

    Ok(Json(ChatResponse {
        session_id,
        reply: reply.text,
        step: step.as_str(),
        available_slots: reply.slots,
    }))
}

#[derive(Deserialize)]
pub struct ConfirmBookingRequest {
    pub session_id: String,
    pub selected_time: String,
}

#[derive(Serialize)]
pub struct ConfirmBookingResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<Slot>,
}

/// Direct confirmation path for button-driven clients: the user taps a
/// displayed slot and the client submits its time without another chat turn.
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConfirmBookingRequest>,
) -> Result<Json<ConfirmBookingResponse>, AppError> {
    let session_id = validate_session_id(&payload.session_id)?;
    let selected = payload.selected_time.trim();
    if selected.is_empty() {
        return Err(AppError::Validation("Selected time is required".to_string()));
    }

    let now = state.config.local_now();
    let mut session = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;

    if session.draft.name.is_none() || session.draft.phone.is_none() {
        return Err(AppError::Validation(
            "Incomplete booking information".to_string(),
        ));
    }

    // Prefer a slot from the current offer so its authoritative instant wins.
    let slot = session
        .offered_slots
        .iter()
        .find(|s| {
            s.time_24h == selected || s.formatted_time.eq_ignore_ascii_case(selected)
        })
        .cloned();

    let time = match &slot {
        Some(s) => s.time_24h.clone(),
        None => {
            normalize::normalize_time(selected, state.config.open_hour, state.config.close_hour)
                .map_err(|_| {
                    AppError::Validation("Invalid time format. Use HH:MM or HH:MM AM/PM".to_string())
                })?
        }
    };

    let resolved = reconcile::resolve_submission(
        slot.as_ref(),
        session.draft.date.as_deref(),
        Some(time.as_str()),
        &state.config.default_time,
    )
    .ok_or_else(|| AppError::Validation("Incomplete booking information".to_string()))?;

    let request = BookingRequest {
        patient_name: session.draft.name.clone().unwrap_or_default(),
        phone: session.draft.phone.clone().unwrap_or_default(),
        email: session.draft.email.clone(),
        date: resolved.date,
        time: resolved.time,
        service: session
            .draft
            .service
            .clone()
            .unwrap_or_else(|| "General Dentistry".to_string()),
        notes: None,
    };

    let outcome = state.calendar.book(&request).await?;

    let response = match outcome {
        BookingOutcome::Confirmed { event_id, message } => {
            tracing::info!(session = %session_id, event = %event_id, "appointment booked via direct confirmation");
            session.draft.reset_keeping_name();
            session.offered_slots.clear();
            session.offered_days.clear();
            session.step = Step::MainMenu;
            ConfirmBookingResponse {
                success: true,
                message,
                event_id: Some(event_id),
                alternatives: Vec::new(),
            }
        }
        BookingOutcome::Rejected {
            message,
            alternatives,
        } => {
            if alternatives.is_empty() {
                session.draft.reset_keeping_name();
                session.step = Step::MainMenu;
            } else {
                session.draft.selected_slot = None;
                session.draft.time = None;
                session.draft.display_time = None;
                session.offered_slots = alternatives.clone();
                session.step = Step::SlotSelection;
            }
            ConfirmBookingResponse {
                success: false,
                message,
                event_id: None,
                alternatives,
            }
        }
    };

    state.sessions.save(session, now);
    Ok(Json(response))
}

#[derive(Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub created_at: String,
    pub last_activity: String,
    pub message_count: usize,
    pub current_step: &'static str,
    pub booking_progress: BookingProgress,
}

#[derive(Serialize)]
pub struct BookingProgress {
    pub has_name: bool,
    pub has_date: bool,
    pub has_time: bool,
    pub has_phone: bool,
}

pub async fn session_info(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionInfo>, AppError> {
    let session_id = validate_session_id(&id)?;
    let session = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;

    Ok(Json(SessionInfo {
        session_id,
        created_at: session.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        last_activity: session.last_activity.format("%Y-%m-%dT%H:%M:%S").to_string(),
        message_count: session.messages.len(),
        current_step: session.step.as_str(),
        booking_progress: BookingProgress {
            has_name: session.draft.name.is_some(),
            has_date: session.draft.date.is_some(),
            has_time: session.draft.time.is_some(),
            has_phone: session.draft.phone.is_some(),
        },
    }))
}

fn validate_session_id(id: &str) -> Result<String, AppError> {
    let id = id.trim();
    if id.is_empty() || id.len() > MAX_SESSION_ID_LEN {
        return Err(AppError::Validation(
            "Session ID must be 1-100 characters".to_string(),
        ));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        return Err(AppError::Validation(
            "Session ID contains invalid characters".to_string(),
        ));
    }
    Ok(id.to_string())
}
