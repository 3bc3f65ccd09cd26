//! Conversation handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use casedesk_models::TicketId;

use crate::error::{ApiError, Result};
use crate::state::{AppState, SharedConversation};
use crate::types::{ConversationResponse, SendMessageRequest, TakeoverRequest, TurnResponse};

async fn find(state: &AppState, id: &str) -> Result<SharedConversation> {
    state
        .conversation(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("conversation {}", id)))
}

/// POST /api/conversations - Start a conversation.
pub async fn start_conversation(
    State(state): State<AppState>,
) -> (StatusCode, Json<ConversationResponse>) {
    let conversation = state.intake.start();
    let body = ConversationResponse::new("", &conversation);
    let (id, _) = state.open_conversation(conversation).await;
    info!(conversation_id = %id, "Conversation started");

    (StatusCode::CREATED, Json(ConversationResponse { id, ..body }))
}

/// GET /api/conversations/:id - Current stage and messages.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>> {
    let conversation = find(&state, &id).await?;
    let conv = conversation.lock().await;
    Ok(Json(ConversationResponse::new(id, &conv)))
}

/// POST /api/conversations/:id/messages - Send a user message.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<TurnResponse>> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("message text is empty".to_string()));
    }

    let conversation = find(&state, &id).await?;
    let (turn, stage) = {
        let mut conv = conversation.lock().await;
        let turn = state.intake.handle_message(&mut conv, &req.text);
        (turn, conv.stage())
    };

    let response = TurnResponse {
        conversation_id: id,
        stage,
        replies: turn.replies.clone(),
        pending_replies: turn.deferred.len(),
        creating: turn.creation.is_some(),
    };
    state.schedule(conversation, turn);

    Ok(Json(response))
}

/// POST /api/conversations/:id/reset - Start another ticket.
pub async fn reset_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TurnResponse>> {
    let conversation = find(&state, &id).await?;
    let mut conv = conversation.lock().await;
    let turn = state.intake.start_new_ticket(&mut conv)?;

    Ok(Json(TurnResponse {
        conversation_id: id,
        stage: conv.stage(),
        replies: turn.replies,
        pending_replies: 0,
        creating: false,
    }))
}

/// POST /api/conversations/:id/takeover - Hand the conversation to a human
/// agent, or back to the bot.
pub async fn set_takeover(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TakeoverRequest>,
) -> Result<Json<ConversationResponse>> {
    let conversation = find(&state, &id).await?;
    let mut conv = conversation.lock().await;
    state.intake.set_takeover(&mut conv, req.enabled);
    Ok(Json(ConversationResponse::new(id, &conv)))
}

/// DELETE /api/conversations/:id - End a conversation and forget it.
///
/// Replies still pending for it are dropped. A ticket already being created
/// is still stored.
pub async fn close_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>> {
    let conversation = state
        .close_conversation(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("conversation {}", id)))?;
    let conv = conversation.lock().await;
    info!(conversation_id = %id, "Conversation closed");
    Ok(Json(ConversationResponse::new(id, &conv)))
}

/// POST /api/tickets/:id/resume - Continue the conversation that produced a
/// ticket.
pub async fn resume_conversation(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<(StatusCode, Json<ConversationResponse>)> {
    let store = state
        .intake
        .store()
        .ok_or_else(|| ApiError::ServiceUnavailable("no persistence store is configured".to_string()))?;
    let session_id = store
        .find_session_by_ticket(&TicketId::from_string(&ticket_id))?
        .ok_or_else(|| ApiError::NotFound(format!("conversation for ticket {}", ticket_id)))?;

    let conversation = state.intake.resume(&session_id)?;
    let body = ConversationResponse::new("", &conversation);
    let (id, _) = state.open_conversation(conversation).await;
    info!(conversation_id = %id, session_id = %session_id, "Conversation resumed");

    Ok((StatusCode::CREATED, Json(ConversationResponse { id, ..body })))
}
