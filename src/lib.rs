//! Push-to-talk voice commands: record, transcribe, route to a tool, act.

pub mod actions;
pub mod audio;
pub mod config;
pub mod context;
pub mod focus;
pub mod hotkey;
pub mod inject;
pub mod pipeline;
pub mod router;
pub mod tool;
pub mod transcribe;
