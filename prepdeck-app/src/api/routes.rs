use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use prepdeck_core::records::Note;
use prepdeck_core::{filter_notes_by_subject, filter_notes_by_text, rate_card, repo, CoreError, Flashcards, RecordStore};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::api::dto::{CardOut, DeckOut, NoteOut, ReviewIn, ReviewOut};

pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub flashcards: Flashcards,
}

#[derive(Deserialize)]
pub struct DueQuery {
    deck: Option<String>,
    max: Option<usize>,
}

#[derive(Deserialize)]
pub struct NotesQuery {
    q: Option<String>,
    subject: Option<String>,
}

pub fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Invalid(_) => StatusCode::BAD_REQUEST,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        CoreError::Remote { .. } => StatusCode::BAD_GATEWAY,
        CoreError::ActionFailed { source, .. } | CoreError::PartialWrite { source, .. } => status_for(source),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn fail(err: CoreError) -> StatusCode {
    let status = status_for(&err);
    if status.is_server_error() {
        warn!(error = %err, "request failed");
    }
    status
}

pub async fn list_decks(State(st): State<Arc<AppState>>) -> Result<Json<Vec<DeckOut>>, StatusCode> {
    let decks = st.flashcards.list_decks().await.map_err(fail)?;
    Ok(Json(decks.into_iter().map(DeckOut::from).collect()))
}

pub async fn due_cards(
    State(st): State<Arc<AppState>>,
    Query(q): Query<DueQuery>,
) -> Result<Json<Vec<CardOut>>, StatusCode> {
    let deck_id = match q.deck.as_deref() {
        Some(sel) => Some(st.flashcards.resolve_deck(sel).await.map_err(fail)?.id),
        None => None,
    };
    let mut due = st.flashcards.due_cards(deck_id, Utc::now()).await.map_err(fail)?;
    if let Some(m) = q.max {
        due.truncate(m);
    }
    Ok(Json(due.into_iter().map(CardOut::from).collect()))
}

pub async fn post_review(
    State(st): State<Arc<AppState>>,
    Json(body): Json<ReviewIn>,
) -> Result<Json<ReviewOut>, StatusCode> {
    let card = st.flashcards.get_card(body.card_id).await.map_err(fail)?;
    let out = rate_card(card, body.rating);
    st.flashcards.persist_rating(&out).await.map_err(fail)?;
    Ok(Json(ReviewOut {
        mastered: out.updated_card.mastered,
        interval_days: out.review.interval_days,
        card: CardOut::from(out.updated_card),
    }))
}

pub async fn list_notes(
    State(st): State<Arc<AppState>>,
    Query(q): Query<NotesQuery>,
) -> Result<Json<Vec<NoteOut>>, StatusCode> {
    let all: Vec<Note> = repo::fetch_all(&*st.store, &repo::Query::all().order_by("updated_at", false))
        .await
        .map_err(fail)?;
    let by_subject = filter_notes_by_subject(&all, q.subject.as_deref().unwrap_or("all"));
    let notes = filter_notes_by_text(&by_subject, q.q.as_deref().unwrap_or(""));
    Ok(Json(notes.into_iter().map(NoteOut::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_statuses() {
        assert_eq!(status_for(&CoreError::NotFound("card")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&CoreError::Conflict("x")), StatusCode::CONFLICT);
        let wrapped = CoreError::action("save review", CoreError::Invalid("bad"));
        assert_eq!(status_for(&wrapped), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&CoreError::Storage("io")), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
