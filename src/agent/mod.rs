//! In-process coding agent used by the `native` backend and the planner.
//!
//! - **Protocol**: OpenAI-compatible chat-completion wire types
//! - **Client**: the [`ChatModel`] seam and its blocking HTTP implementation
//! - **Tools**: shell and file tools confined to one workspace
//! - **Session**: the bounded tool-calling loop
//!
//! Responses are requested non-streaming; a worker thread blocks on each turn.

pub mod client;
pub mod protocol;
mod session;
mod tools;

// Re-export public API
pub use client::{ChatModel, OpenAiClient};
pub use protocol::{Message, Role, ToolCall, ToolDefinition};
pub use session::{AgentSession, SessionEnd};
pub use tools::Toolbox;
