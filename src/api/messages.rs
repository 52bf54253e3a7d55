//! Messaging endpoints.

use super::{AppState, extract::AuthUser};
use crate::{
    core::message::{self, MessageUpdate, MessageView, NewMessage},
    entities::message as message_entity,
    errors::Result,
    media::MediaStore,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

fn views(messages: Vec<message_entity::Model>, media: &MediaStore) -> Vec<MessageView> {
    messages
        .into_iter()
        .map(|m| MessageView::new(m, media))
        .collect()
}

/// `GET /api/messages`
pub async fn list(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<MessageView>>> {
    let messages = message::list_messages(&state.db, &user.caller()).await?;
    Ok(Json(views(messages, &state.media)))
}

/// `POST /api/messages`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewMessage>,
) -> Result<(StatusCode, Json<MessageView>)> {
    let sent = message::send_message(&state.db, &state.media, &user.caller(), body).await?;
    Ok((StatusCode::CREATED, Json(MessageView::new(sent, &state.media))))
}

/// `GET /api/messages/{id}`
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageView>> {
    let found = message::get_message(&state.db, &user.caller(), id).await?;
    Ok(Json(MessageView::new(found, &state.media)))
}

/// `PUT /api/messages/{id}`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<MessageUpdate>,
) -> Result<Json<MessageView>> {
    let updated = message::update_message(&state.db, &user.caller(), id, body).await?;
    Ok(Json(MessageView::new(updated, &state.media)))
}

/// `DELETE /api/messages/{id}`
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    message::delete_message(&state.db, &user.caller(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/messages/thread/{user_id}`
pub async fn thread(
    State(state): State<AppState>,
    user: AuthUser,
    Path(counterpart): Path<i64>,
) -> Result<Json<Vec<MessageView>>> {
    let messages = message::thread(&state.db, &user.caller(), counterpart).await?;
    Ok(Json(views(messages, &state.media)))
}
