//! Message business logic - Direct messages between any two users.
//!
//! Both parties can read a message. Only its sender may edit or delete it;
//! the recipient gets a permission error and the row is left untouched.

use crate::{
    core::access::{self, Caller, Resource},
    entities::{Message, User, message},
    errors::{Error, Result},
    media::{self, MediaStore, Upload},
};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Input for sending a message.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    /// Addressee
    pub recipient_id: i64,
    /// Body
    #[serde(default)]
    pub text: Option<String>,
    /// Attached picture
    #[serde(default)]
    pub image: Option<Upload>,
}

/// Input for editing a message. Only the text can change.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageUpdate {
    /// New body
    pub text: String,
}

/// Public view of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    /// Message id
    pub id: i64,
    /// Author
    pub sender_id: i64,
    /// Addressee
    pub recipient_id: i64,
    /// Body
    pub text: Option<String>,
    /// Absolute image URL
    pub image_url: Option<String>,
    /// Sending time
    pub sent_at: DateTime<Utc>,
}

impl MessageView {
    /// Builds the view, resolving the image path to a URL.
    #[must_use]
    pub fn new(message: message::Model, media: &MediaStore) -> Self {
        Self {
            image_url: message.image.as_deref().map(|path| media.url(path)),
            id: message.id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            text: message.text,
            sent_at: message.sent_at,
        }
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Sends a message from the caller.
#[instrument(skip(db, media, input), fields(recipient_id = input.recipient_id))]
pub async fn send_message(
    db: &DatabaseConnection,
    media: &MediaStore,
    caller: &Caller,
    input: NewMessage,
) -> Result<message::Model> {
    let text = non_blank(input.text);
    if text.is_none() && input.image.is_none() {
        return Err(Error::invalid("text", "A message needs text or an image."));
    }
    if input.recipient_id == caller.id {
        return Err(Error::invalid("recipient_id", "You cannot message yourself."));
    }
    User::find_by_id(input.recipient_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("user", input.recipient_id))?;

    let image = match &input.image {
        Some(upload) => Some(media.save_upload(media::MESSAGE_IMAGES, "image", upload).await?),
        None => None,
    };
    let sent = message::ActiveModel {
        sender_id: Set(caller.id),
        recipient_id: Set(input.recipient_id),
        text: Set(text),
        image: Set(image),
        sent_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(message_id = sent.id, sender_id = caller.id, "Message sent");
    Ok(sent)
}

/// Lists every message the caller sent or received, oldest first.
pub async fn list_messages(db: &DatabaseConnection, caller: &Caller) -> Result<Vec<message::Model>> {
    Message::find()
        .filter(access::scope(Resource::Message, caller))
        .order_by_asc(message::Column::SentAt)
        .order_by_asc(message::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one message the caller sent or received.
pub async fn get_message(
    db: &DatabaseConnection,
    caller: &Caller,
    message_id: i64,
) -> Result<message::Model> {
    Message::find_by_id(message_id)
        .filter(access::scope(Resource::Message, caller))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("message", message_id))
}

/// The conversation between the caller and `counterpart_id`, both directions,
/// oldest first.
pub async fn thread(
    db: &DatabaseConnection,
    caller: &Caller,
    counterpart_id: i64,
) -> Result<Vec<message::Model>> {
    User::find_by_id(counterpart_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("user", counterpart_id))?;

    Message::find()
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(message::Column::SenderId.eq(caller.id))
                        .add(message::Column::RecipientId.eq(counterpart_id)),
                )
                .add(
                    Condition::all()
                        .add(message::Column::SenderId.eq(counterpart_id))
                        .add(message::Column::RecipientId.eq(caller.id)),
                ),
        )
        .order_by_asc(message::Column::SentAt)
        .order_by_asc(message::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads a message and checks the caller wrote it.
async fn find_own(db: &DatabaseConnection, caller: &Caller, message_id: i64) -> Result<message::Model> {
    let found = get_message(db, caller, message_id).await?;
    if found.sender_id != caller.id {
        return Err(Error::forbidden(format!(
            "user {} is not the sender of message {message_id}",
            caller.id
        )));
    }
    Ok(found)
}

/// Edits the text of a message the caller sent.
#[instrument(skip(db, input))]
pub async fn update_message(
    db: &DatabaseConnection,
    caller: &Caller,
    message_id: i64,
    input: MessageUpdate,
) -> Result<message::Model> {
    let existing = find_own(db, caller, message_id).await?;
    let text = non_blank(Some(input.text));
    if text.is_none() && existing.image.is_none() {
        return Err(Error::invalid("text", "A message needs text or an image."));
    }
    let mut active: message::ActiveModel = existing.into();
    active.text = Set(text);
    let updated = active.update(db).await?;
    info!(message_id, "Message edited");
    Ok(updated)
}

/// Deletes a message the caller sent.
#[instrument(skip(db))]
pub async fn delete_message(db: &DatabaseConnection, caller: &Caller, message_id: i64) -> Result<()> {
    let existing = find_own(db, caller, message_id).await?;
    Message::delete_by_id(existing.id).exec(db).await?;
    info!(message_id, "Message deleted");
    Ok(())
}
