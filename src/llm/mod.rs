pub mod client;
pub mod types;

pub use client::{HttpModelClient, LlmError, ModelService};
pub use types::{ChatMessage, ContentPart, MessageContent, Role};
