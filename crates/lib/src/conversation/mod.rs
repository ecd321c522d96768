//! Conversation service client.
//!
//! Sends one message turn per call and remembers the last successful response so the next turn
//! can carry its context forward (see [`ConversationClient::continue_with`]).

mod types;

pub use types::{
    Context, InputData, LogMessage, MessageRequest, MessageResponse, OutputData, RuntimeEntity,
    RuntimeIntent,
};

use crate::transport::{HttpRequest, Method, Transport, TransportError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Service API revision, sent verbatim as the `version` query parameter.
pub const API_VERSION: &str = "2017-05-26";

pub const DEFAULT_BASE_URL: &str = "https://gateway.watsonplatform.net";

/// Login and workspace for a client. Fixed for the client's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub workspace_id: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        workspace_id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            workspace_id: workspace_id.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("encoding message request failed: {0}")]
    Encoding(#[source] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("conversation service returned HTTP {status}")]
    UnexpectedStatus { status: u16 },
    #[error("decoding message response failed: {0}")]
    Decoding(#[source] serde_json::Error),
}

impl ConversationError {
    /// True for failures that may succeed on a later attempt: transport errors, 429 and 503.
    pub fn is_retryable(&self) -> bool {
        match self {
            ConversationError::Transport(_) => true,
            ConversationError::UnexpectedStatus { status } => matches!(status, 429 | 503),
            ConversationError::Encoding(_) | ConversationError::Decoding(_) => false,
        }
    }

    /// HTTP status for `UnexpectedStatus`, otherwise `None`.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConversationError::UnexpectedStatus { status } => Some(*status),
            _ => None,
        }
    }
}

/// Client for the message endpoint of one workspace.
///
/// The last successful response is held behind a lock, so a client can be shared across tasks
/// (e.g. in an `Arc`). Concurrent sends resolve to whichever completes last.
pub struct ConversationClient<T> {
    transport: T,
    credentials: Credentials,
    base_url: String,
    timeout: Option<Duration>,
    last_response: RwLock<Option<MessageResponse>>,
}

impl<T: Transport> ConversationClient<T> {
    pub fn new(credentials: Credentials, transport: T) -> Self {
        Self {
            transport,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            last_response: RwLock::new(None),
        }
    }

    /// Override the service root (scheme and host, optionally a path prefix).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Deadline passed to the transport with every request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// `{base}/conversation/api/v1/workspaces/{id}/message?version={API_VERSION}`
    pub fn message_url(&self) -> String {
        format!(
            "{}/conversation/api/v1/workspaces/{}/message?version={}",
            self.base_url, self.credentials.workspace_id, API_VERSION
        )
    }

    /// POST one message turn. On success the response is remembered for [`Self::continue_with`];
    /// on any error the remembered response is left as it was.
    pub async fn send_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, ConversationError> {
        let body = serde_json::to_vec(request).map_err(ConversationError::Encoding)?;

        let mut http = HttpRequest::new(Method::Post, self.message_url());
        http.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        http.headers
            .push(("Authorization".to_string(), self.basic_auth()));
        http.body = body;
        http.timeout = self.timeout;

        log::debug!(
            "conversation: {} message to workspace {} ({} bytes)",
            http.method.as_str(),
            self.credentials.workspace_id,
            http.body.len()
        );
        let res = self.transport.execute(http).await?;
        if res.status != 200 {
            log::debug!("conversation: unexpected status {}", res.status);
            return Err(ConversationError::UnexpectedStatus { status: res.status });
        }
        let response: MessageResponse =
            serde_json::from_slice(&res.body).map_err(ConversationError::Decoding)?;

        *self
            .last_response
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(response.clone());
        Ok(response)
    }

    /// Build the next turn's request. Carries a copy of the last response's context, if any.
    pub fn continue_with(&self, text: impl Into<String>) -> MessageRequest {
        let mut request = MessageRequest::new(text);
        request.context = self
            .last_response
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|r| r.context.clone());
        request
    }

    /// Copy of the remembered response.
    pub fn last_response(&self) -> Option<MessageResponse> {
        self.last_response
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget the remembered response; the next `continue_with` starts a new conversation.
    pub fn reset(&self) {
        *self
            .last_response
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.credentials.username, self.credentials.password);
        format!("Basic {}", BASE64.encode(raw))
    }
}
