//! The fixed tool catalog and the structured tool call produced by routing.
//!
//! [`ToolCall`] is what the command router hands to the tool executor.  Its
//! arguments come from an unreliable model response, so
//! [`ToolArguments`] decodes leniently: a bare string or a single-entry
//! string map become [`ToolArguments::Text`], anything else becomes
//! [`ToolArguments::None`] instead of a decode error.

use std::fmt;

use serde::{Deserialize, Deserializer};

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

/// One entry of the fixed action catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Deliver dictated text into the focused window.
    Type,
    /// Open an application by name, or a URL in the default browser.
    OpenApp,
    /// Bring a running application to the front.
    SwitchTo,
    /// Open a web search for a topic.
    DeepResearch,
    /// Control Spotify playback.
    Spotify,
}

impl Tool {
    /// Every tool, in the order it is presented to the model.
    pub const ALL: [Tool; 5] = [
        Tool::Type,
        Tool::OpenApp,
        Tool::SwitchTo,
        Tool::DeepResearch,
        Tool::Spotify,
    ];

    /// Wire name used in the routing response.
    pub fn name(self) -> &'static str {
        match self {
            Tool::Type => "type",
            Tool::OpenApp => "open_app",
            Tool::SwitchTo => "switch_to",
            Tool::DeepResearch => "deep_research",
            Tool::Spotify => "spotify",
        }
    }

    /// Name of the single argument, as shown in the prompt signature.
    pub fn argument(self) -> &'static str {
        match self {
            Tool::Type => "text",
            Tool::OpenApp => "name_or_url",
            Tool::SwitchTo => "app_name",
            Tool::DeepResearch => "topic",
            Tool::Spotify => "action",
        }
    }

    /// Look up a tool by its exact wire name.
    ///
    /// ```
    /// use voice_command::tool::Tool;
    ///
    /// assert_eq!(Tool::from_name("open_app"), Some(Tool::OpenApp));
    /// assert_eq!(Tool::from_name("Open_App"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        Tool::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// ToolArguments
// ---------------------------------------------------------------------------

/// Argument of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolArguments {
    /// A single textual argument.
    Text(String),
    /// Absent, or a shape we do not understand.
    #[default]
    None,
}

impl ToolArguments {
    /// The text argument, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolArguments::Text(text) => Some(text),
            ToolArguments::None => None,
        }
    }

    /// Display form: the text, or an empty string.
    pub fn display(&self) -> &str {
        self.as_text().unwrap_or("")
    }
}

impl From<serde_json::Value> for ToolArguments {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => ToolArguments::Text(text),
            serde_json::Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
                Some((_, serde_json::Value::String(text))) => ToolArguments::Text(text),
                _ => ToolArguments::None,
            },
            _ => ToolArguments::None,
        }
    }
}

impl<'de> Deserialize<'de> for ToolArguments {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(ToolArguments::from(value))
    }
}

// ---------------------------------------------------------------------------
// ToolCall
// ---------------------------------------------------------------------------

/// The router's decision: which tool to run and with what argument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub tool_arguments: ToolArguments,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, tool_arguments: ToolArguments) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_arguments,
        }
    }

    /// Convenience constructor for a call with a text argument.
    pub fn text(tool_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(tool_name, ToolArguments::Text(text.into()))
    }

    /// The catalog entry this call names, if it names one.
    pub fn tool(&self) -> Option<Tool> {
        Tool::from_name(&self.tool_name)
    }
}
