//! One-shot flash messages kept in the session.
//!
//! POST handlers queue a message and redirect; the next JSON view drains the
//! queue and returns it alongside its data.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use tower_sessions::Session;

use crate::models::{FlashLevel, FlashMessage, session_keys};

/// Extractor giving access to the session's flash queue.
#[derive(Clone)]
pub struct Flash(Session);

impl Flash {
    /// Queue a message for the next view.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn push(
        &self,
        level: FlashLevel,
        text: impl Into<String>,
    ) -> Result<(), tower_sessions::session::Error> {
        let mut queue: Vec<FlashMessage> = self
            .0
            .get(session_keys::FLASH_MESSAGES)
            .await?
            .unwrap_or_default();
        queue.push(FlashMessage::new(level, text));
        self.0.insert(session_keys::FLASH_MESSAGES, queue).await
    }

    /// Take every queued message, leaving the queue empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn drain(&self) -> Result<Vec<FlashMessage>, tower_sessions::session::Error> {
        Ok(self
            .0
            .remove::<Vec<FlashMessage>>(session_keys::FLASH_MESSAGES)
            .await?
            .unwrap_or_default())
    }
}

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self)
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Session layer not configured",
            ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_push_then_drain() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let flash = Flash(session);

        flash.push(FlashLevel::Info, "first").await.unwrap();
        flash.push(FlashLevel::Error, "second").await.unwrap();

        let messages = flash.drain().await.unwrap();
        assert_eq!(
            messages,
            vec![
                FlashMessage::new(FlashLevel::Info, "first"),
                FlashMessage::new(FlashLevel::Error, "second"),
            ]
        );
        assert!(flash.drain().await.unwrap().is_empty());
    }
}
