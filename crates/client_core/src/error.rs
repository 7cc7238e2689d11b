//! Failure taxonomy for everything the client does on behalf of the UI.

use shared::error::ErrorCode;
use thiserror::Error;

/// Client-side rejection raised before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("amount must be a number greater than zero")]
    InvalidAmount,
    #[error("notes must not be empty")]
    EmptyNotes,
    #[error("notes must be at most {max} characters")]
    NotesTooLong { max: usize },
    #[error("weight must be a finite, non-negative number")]
    InvalidWeight,
    #[error("a submission is already in progress")]
    SubmissionInFlight,
    #[error("slot start and end times are required")]
    MissingSlotTime,
    #[error("'{0}' is not a valid date/time")]
    InvalidSlotTime(String),
    #[error("slot must end after it starts")]
    SlotEndsBeforeStart,
    #[error("slot '{0}' is still being saved; refresh before voting")]
    UnsavedSlot(String),
    #[error("nothing to vote on with id '{0}'")]
    UnknownVoteTarget(String),
    #[error("'{category}' is not a valid choice for '{target}'")]
    UnknownVoteCategory { target: String, category: String },
    #[error("no poll has been created for this event yet")]
    NoActivePoll,
    #[error("event title must not be empty")]
    EmptyEventTitle,
    #[error("participant name must not be empty")]
    EmptyUserName,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("server failure (status {status:?}): {message}")]
    Server { status: Option<u16>, message: String },
}

impl ClientError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match ErrorCode::from_status(status) {
            Some(ErrorCode::RateLimited) => Self::RateLimited(message),
            Some(ErrorCode::Forbidden) => Self::Forbidden(message),
            _ => Self::Server {
                status: Some(status),
                message,
            },
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::Validation,
            Self::Transport(_) => ErrorCode::Transport,
            Self::RateLimited(_) => ErrorCode::RateLimited,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::Server { .. } => ErrorCode::Server,
        }
    }

    /// What the user should see for this failure.
    pub fn notice(&self) -> UserNotice {
        match self {
            Self::Validation(err) => UserNotice {
                severity: NoticeSeverity::Inline,
                message: err.to_string(),
                retryable: false,
            },
            Self::RateLimited(_) => UserNotice {
                severity: NoticeSeverity::Blocking,
                message: "You are voting too fast. Wait a couple of seconds and try again."
                    .to_string(),
                retryable: false,
            },
            Self::Forbidden(_) => UserNotice {
                severity: NoticeSeverity::Blocking,
                message: "Voting is locked for this event.".to_string(),
                retryable: false,
            },
            Self::Transport(_) => UserNotice {
                severity: NoticeSeverity::Banner,
                message: "Server unreachable; check your connection and retry.".to_string(),
                retryable: true,
            },
            Self::Server { .. } => UserNotice {
                severity: NoticeSeverity::Banner,
                message: "Something went wrong on the server. Please try again.".to_string(),
                retryable: true,
            },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return Self::Transport(err.to_string());
        }
        if err.is_decode() {
            return Self::Server {
                status: err.status().map(|s| s.as_u16()),
                message: format!("undecodable response: {err}"),
            };
        }
        match err.status() {
            Some(status) => Self::from_status(status.as_u16(), err.to_string()),
            None => Self::Transport(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    /// Shown next to the form that was rejected.
    Inline,
    /// Must be acknowledged: the user has to wait or stop voting.
    Blocking,
    /// Dismissable banner with a retry affordance.
    Banner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    pub severity: NoticeSeverity,
    pub message: String,
    pub retryable: bool,
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
