//! Three-state wrapper around a one-shot request: loading, failed, ready.

use std::fmt::Display;
use std::future::Future;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FetchState<T> {
    Loading,
    Failed { message: String },
    Ready { data: T },
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState::Loading
    }
}

impl<T> FetchState<T> {
    /// Await `request` once and capture its outcome. Failures are logged and
    /// kept as their display text; nothing is retried.
    pub async fn load<F, E>(request: F) -> Self
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        match request.await {
            Ok(data) => FetchState::Ready { data },
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed");
                FetchState::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            FetchState::Ready { data } => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchState<U> {
        match self {
            FetchState::Loading => FetchState::Loading,
            FetchState::Failed { message } => FetchState::Failed { message },
            FetchState::Ready { data } => FetchState::Ready { data: f(data) },
        }
    }

    /// Replace the underlying error text with a user-facing message.
    pub fn with_failure_message(self, message: &str) -> Self {
        match self {
            FetchState::Failed { .. } => FetchState::Failed {
                message: message.to_string(),
            },
            other => other,
        }
    }
}
