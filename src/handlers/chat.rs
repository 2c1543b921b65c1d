use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, FieldError};
use crate::services::chatbot::{self, Language};

#[derive(Deserialize)]
pub struct ChatMessage {
    pub message: String,
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub language: String,
}

// POST /api/chat
pub async fn chat(Json(payload): Json<ChatMessage>) -> Result<Json<ChatReply>, AppError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation(FieldError::new(
            "message",
            "message is required",
        )));
    }

    let lang = Language::parse(payload.language.as_deref().unwrap_or("fr"));
    Ok(Json(ChatReply {
        reply: chatbot::reply(message, lang).to_string(),
        language: lang.as_str().to_string(),
    }))
}
