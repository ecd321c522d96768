//! Conversation service client library: message turns, context continuation, and the
//! config plumbing shared with the `converse` CLI.

pub mod config;
pub mod conversation;
pub mod init;
pub mod transport;

pub use conversation::{
    ConversationClient, ConversationError, Credentials, MessageRequest, MessageResponse,
    API_VERSION,
};
pub use transport::{ReqwestTransport, Transport, TransportError};
