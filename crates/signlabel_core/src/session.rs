//! Per-volunteer session state machine.
//!
//! # Responsibility
//! - Hold the current volunteer name and presented image for one session.
//! - Enforce legal transitions between session states.
//!
//! # Invariants
//! - A session only leaves `NoUser` with a non-empty trimmed name.
//! - `Presenting` and `Done` always carry the logged-in user.
//! - Sessions are plain values owned by the caller; no global state.

use crate::model::label::ImageId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable id used to correlate one session's log lines.
pub type SessionId = Uuid;

/// Session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for a volunteer name.
    NoUser,
    /// Logged in, no image drawn yet.
    HasUser { user: String },
    /// An image is on screen.
    Presenting { user: String, image: ImageId },
    /// Nothing left to label; re-checked on the next `present`.
    Done { user: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    EmptyUserName,
    NotLoggedIn,
    NoImagePresented,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUserName => write!(f, "please enter your name"),
            Self::NotLoggedIn => write!(f, "session has no user; log in first"),
            Self::NoImagePresented => write!(f, "no image is currently presented"),
        }
    }
}

impl Error for SessionError {}

/// Explicit per-session context passed to every service call.
#[derive(Debug, Clone)]
pub struct LabelSession {
    id: SessionId,
    state: SessionState,
}

impl Default for LabelSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::NoUser,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&str> {
        match &self.state {
            SessionState::NoUser => None,
            SessionState::HasUser { user }
            | SessionState::Presenting { user, .. }
            | SessionState::Done { user } => Some(user.as_str()),
        }
    }

    pub fn current_image(&self) -> Option<&str> {
        match &self.state {
            SessionState::Presenting { image, .. } => Some(image.as_str()),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, SessionState::Done { .. })
    }

    /// Sets the volunteer name; any previous user and image are discarded.
    ///
    /// # Errors
    /// - `EmptyUserName` when `name` is blank; the state is left unchanged.
    pub fn login<'a>(&mut self, name: &'a str) -> Result<&'a str, SessionError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyUserName);
        }
        self.state = SessionState::HasUser {
            user: trimmed.to_string(),
        };
        Ok(trimmed)
    }

    pub fn logout(&mut self) {
        self.state = SessionState::NoUser;
    }

    /// Moves to `Presenting(image)`, or to `Done` when `next` is `None`.
    pub fn present(&mut self, next: Option<ImageId>) -> Result<(), SessionError> {
        let user = self.user().ok_or(SessionError::NotLoggedIn)?.to_string();
        self.state = match next {
            Some(image) => SessionState::Presenting { user, image },
            None => SessionState::Done { user },
        };
        Ok(())
    }

    /// Drops the presented image, keeping the user logged in.
    pub fn release_image(&mut self) {
        let user = match &self.state {
            SessionState::Presenting { user, .. } | SessionState::Done { user } => user.clone(),
            _ => return,
        };
        self.state = SessionState::HasUser { user };
    }

    /// Returns `(user, image)` for the presented image.
    pub fn presented(&self) -> Result<(&str, &str), SessionError> {
        match &self.state {
            SessionState::Presenting { user, image } => Ok((user.as_str(), image.as_str())),
            SessionState::NoUser => Err(SessionError::NotLoggedIn),
            _ => Err(SessionError::NoImagePresented),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LabelSession, SessionError, SessionState};

    #[test]
    fn blank_login_keeps_no_user() {
        let mut session = LabelSession::new();
        assert_eq!(session.login("   "), Err(SessionError::EmptyUserName));
        assert_eq!(session.state(), &SessionState::NoUser);
    }

    #[test]
    fn login_trims_and_present_walks_states() {
        let mut session = LabelSession::new();
        assert_eq!(session.login("  Mia ").unwrap(), "Mia");
        assert_eq!(session.user(), Some("Mia"));

        session.present(Some("img1".to_string())).unwrap();
        assert_eq!(session.presented().unwrap(), ("Mia", "img1"));

        session.present(None).unwrap();
        assert!(session.is_done());
        assert_eq!(session.presented(), Err(SessionError::NoImagePresented));

        session.present(Some("img2".to_string())).unwrap();
        assert_eq!(session.current_image(), Some("img2"));
    }

    #[test]
    fn present_requires_login() {
        let mut session = LabelSession::new();
        assert_eq!(
            session.present(Some("img1".to_string())),
            Err(SessionError::NotLoggedIn)
        );
        session.login("Mia").unwrap();
        session.logout();
        assert_eq!(session.presented(), Err(SessionError::NotLoggedIn));
    }

    #[test]
    fn release_image_returns_to_has_user() {
        let mut session = LabelSession::new();
        session.release_image();
        assert_eq!(session.state(), &SessionState::NoUser);

        session.login("Mia").unwrap();
        session.present(Some("img1".to_string())).unwrap();
        session.release_image();
        assert_eq!(
            session.state(),
            &SessionState::HasUser {
                user: "Mia".to_string()
            }
        );
        assert_eq!(session.current_image(), None);
        assert_eq!(session.presented(), Err(SessionError::NoImagePresented));
    }
}
