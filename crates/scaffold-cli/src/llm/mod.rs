//! Model-provider plumbing: request/response types and the HTTP client

mod client;
mod types;

pub use client::{LlmClient, LlmError};
pub use types::{Message, MessageRequest, MessageResponse, ResponseBlock};
