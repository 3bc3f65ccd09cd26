//! Ticket handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use casedesk_models::{TicketId, TicketNote, TicketStatus};

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{
    AddNoteRequest, MessageView, NoteListResponse, SlaView, StatusChangeResponse, TicketDetailResponse, TicketListQuery,
    TicketListResponse, TicketSlaResponse, TicketSummary, UpdateStatusRequest,
};

/// GET /api/tickets - List tickets, newest first.
pub async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<TicketListQuery>,
) -> Result<Json<TicketListResponse>> {
    let store = state
        .intake
        .store()
        .ok_or_else(|| ApiError::ServiceUnavailable("no persistence store is configured".to_string()))?;

    let status = match query.status.as_deref() {
        Some(s) => Some(parse_status(s)?),
        None => None,
    };

    let mut tickets: Vec<TicketSummary> = store
        .list_tickets()?
        .iter()
        .filter(|t| status.map_or(true, |s| t.status == s))
        .map(TicketSummary::from)
        .collect();

    let total = tickets.len();
    if let Some(limit) = query.limit {
        tickets.truncate(limit);
    }

    Ok(Json(TicketListResponse { tickets, total }))
}

/// GET /api/tickets/:id - Ticket status with its conversation and SLA.
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TicketDetailResponse>> {
    let lookup = state.intake.lookup_ticket(&id, Utc::now())?;

    Ok(Json(TicketDetailResponse {
        session_id: lookup.session_id.as_ref().map(|s| s.to_string()),
        messages: lookup.history.iter().map(MessageView::from).collect(),
        sla: lookup.sla.as_ref().map(SlaView::from),
        ticket: lookup.ticket,
    }))
}

/// GET /api/tickets/:id/sla - Current SLA status.
pub async fn get_ticket_sla(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TicketSlaResponse>> {
    let ticket_id = TicketId::from_string(&id);
    let sla = state.intake.sla_status(&ticket_id, Utc::now())?;

    Ok(Json(TicketSlaResponse {
        ticket_id: id,
        sla: sla.as_ref().map(SlaView::from),
    }))
}

/// POST /api/tickets/:id/status - Move a ticket to another status.
pub async fn update_ticket_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<StatusChangeResponse>> {
    let status = parse_status(&req.status)?;
    let change = state.intake.update_ticket_status(
        &TicketId::from_string(&id),
        status,
        req.resolution_notes,
        state.notifier.as_ref(),
    )?;

    Ok(Json(StatusChangeResponse {
        ticket: change.ticket,
        notified: change.notified,
    }))
}

/// POST /api/tickets/:id/notes - Add an agent note.
pub async fn add_ticket_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddNoteRequest>,
) -> Result<(StatusCode, Json<TicketNote>)> {
    let note = state.intake.add_ticket_note(
        &TicketId::from_string(&id),
        &req.text,
        req.internal.unwrap_or(true),
    )?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/tickets/:id/notes - Notes, newest first.
pub async fn list_ticket_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NoteListResponse>> {
    let notes = state.intake.ticket_notes(&TicketId::from_string(&id))?;
    Ok(Json(NoteListResponse { ticket_id: id, notes }))
}

fn parse_status(value: &str) -> Result<TicketStatus> {
    TicketStatus::parse(value)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown ticket status: {}", value)))
}
