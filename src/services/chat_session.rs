//! The working conversation a user builds up before saving it.
//!
//! `ChatSession` is a plain value: every transition takes the current session
//! and hands back the next one, so nothing here is shared between requests.

use crate::db::models::session::{Message, Session, SessionRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Active,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Cannot save an empty conversation")]
    NoMessages,

    #[error("Failed to save chat: {0}")]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSession {
    messages: Vec<Message>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn state(&self) -> SessionState {
        if self.messages.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Active
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn append(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Drops every unsaved message.
    pub fn clear(self) -> Self {
        Self::new()
    }

    /// Replace the working messages with a saved conversation. Anything not
    /// yet saved is discarded.
    pub fn load(self, saved: &Session) -> Self {
        Self {
            messages: saved.messages.clone(),
        }
    }

    /// Persist the conversation under `title` for `owner_id`.
    ///
    /// On success the working session does not stay open: the caller gets the
    /// stored [`Session`] and a fresh empty `ChatSession` to continue with. On
    /// failure `self` is untouched.
    pub async fn save(
        &self,
        title: &str,
        owner_id: &str,
        repo: &dyn SessionRepository,
    ) -> Result<(ChatSession, Session), SaveError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SaveError::EmptyTitle);
        }
        if self.messages.is_empty() {
            return Err(SaveError::NoMessages);
        }

        let saved = repo.create(title, owner_id, &self.messages).await?;
        tracing::info!(
            "Saved chat session {} ({} messages) for {owner_id}",
            saved.id,
            saved.messages.len()
        );

        Ok((ChatSession::new(), saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::session::MemorySessionRepository;

    fn active() -> ChatSession {
        ChatSession::new()
            .append(Message::user("What does the document say?"))
            .append(Message::assistant("It greets the world."))
    }

    #[test]
    fn test_transitions() {
        let session = ChatSession::new();
        assert_eq!(session.state(), SessionState::Empty);

        let session = session.append(Message::user("hi"));
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.messages().len(), 1);

        let session = session.clear();
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn test_load_discards_unsaved() {
        let saved = Session {
            id: "s1".into(),
            title: "Earlier".into(),
            messages: vec![Message::user("old question"), Message::assistant("old answer")],
            owner_id: "alice".into(),
            created_at: "2024-01-01T00:00:00+00:00".into(),
        };

        let session = active().load(&saved);
        assert_eq!(session.messages(), saved.messages.as_slice());
    }

    #[tokio::test]
    async fn test_save_persists_and_resets() {
        let repo = MemorySessionRepository::new();
        let session = active();

        let (next, saved) = session.save("  Greeting  ", "alice", &repo).await.unwrap();
        assert_eq!(next.state(), SessionState::Empty);
        assert_eq!(saved.title, "Greeting");
        assert_eq!(saved.messages, session.messages());

        let listed = repo.list("alice").await.unwrap();
        assert_eq!(listed, vec![saved]);
    }

    #[tokio::test]
    async fn test_save_validation() {
        let repo = MemorySessionRepository::new();

        let err = active().save("   ", "alice", &repo).await.unwrap_err();
        assert!(matches!(err, SaveError::EmptyTitle));

        let err = ChatSession::new().save("Title", "alice", &repo).await.unwrap_err();
        assert!(matches!(err, SaveError::NoMessages));

        assert!(repo.list("alice").await.unwrap().is_empty());
    }
}
