//! Command routing: transcript + context → one [`ToolCall`](crate::tool::ToolCall).
//!
//! * [`CommandRouter`]: async trait the pipeline depends on.
//! * [`ApiRouter`]: OpenAI-compatible chat-completions backend.
//! * [`PromptBuilder`]: system prompt with catalog, environment, dictionary
//!   and style sections.
//! * [`parse_tool_call`]: fence stripping and lenient decoding of the reply.

pub mod client;
pub mod parse;
pub mod prompt;

pub use client::{ApiRouter, CommandRouter, RouteError};
pub use parse::{parse_tool_call, strip_fences};
pub use prompt::PromptBuilder;
