//! System prompt for command routing.
//!
//! [`PromptBuilder::build_chat`] returns a `(system_msg, user_msg)` pair for
//! an OpenAI-compatible chat-completions endpoint.  The system message is
//! built in this order:
//!
//! 1. Routing rules (dictation by default, JSON-only output).
//! 2. The tool catalog with live environment facts.
//! 3. Dictionary section, when any entry produces a line.
//! 4. Style examples, when not blank.
//!
//! The user message is the raw transcript, unchanged.

use std::fmt::Write as _;

use crate::context::{DictionaryEntry, EntryKind, RoutingContext};
use crate::tool::Tool;

const ROUTING_RULES: &str = "\
You turn a spoken instruction into exactly one tool call on the user's computer.

Rules:
1. By default the user is dictating: call 'type' with what they said. You may only fix capitalisation, obvious grammar mistakes and typos, corrections the user dictates explicitly, and terms listed in the dictionary below.
2. Only when the instruction clearly and unambiguously asks for one of 'open_app', 'switch_to', 'deep_research' or 'spotify' do you call that tool instead. When in doubt, call 'type'. A question that is not a request for one of those tools is dictated with 'type' like anything else.
3. Never answer the user yourself and never ask for clarification.
4. Reply with JSON only, with the keys \"tool_name\" and \"tool_arguments\".";

/// Builds routing prompts.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the `(system_msg, user_msg)` pair for one transcript.
    pub fn build_chat(&self, transcript: &str, context: &RoutingContext) -> (String, String) {
        let mut system = String::with_capacity(2048);
        system.push_str(ROUTING_RULES);
        system.push_str("\n\nTools:\n");
        for tool in Tool::ALL {
            let _ = writeln!(
                system,
                "- {}({}: String): {}",
                tool.name(),
                tool.argument(),
                describe(tool, context)
            );
        }
        // Drop the catalog's trailing newline so optional sections start clean.
        system.truncate(system.trim_end().len());

        if let Some(section) = dictionary_section(&context.dictionary) {
            system.push_str("\n\n");
            system.push_str(&section);
        }

        let style = context.style_examples.trim();
        if !style.is_empty() {
            system.push_str("\n\nStyle examples (write dictated text in this style):\n");
            system.push_str(style);
        }

        (system, transcript.to_string())
    }
}

fn describe(tool: Tool, context: &RoutingContext) -> String {
    match tool {
        Tool::Type => "Type text into the focused window.".to_string(),
        Tool::OpenApp => format!(
            "Open an application or a website. Websites open in the default browser \"{}\". \
             Only open applications from this installed list: <installed_apps>{}</installed_apps>.",
            context.default_browser,
            context.installed_apps_description()
        ),
        Tool::SwitchTo => format!(
            "Bring a running application to the front. Running applications: {}.",
            context.open_apps_description()
        ),
        Tool::DeepResearch => "Search the web for a topic.".to_string(),
        Tool::Spotify => {
            "Control Spotify playback. The action is one of \"play\", \"pause\" or \"next\" (next track)."
                .to_string()
        }
    }
}

/// One line per usable entry; `None` when no entry yields a line.
fn dictionary_section(entries: &[DictionaryEntry]) -> Option<String> {
    let lines: Vec<String> = entries
        .iter()
        .filter_map(|entry| match (entry.kind, &entry.output) {
            (EntryKind::Word, _) => Some(format!("- Keep \"{}\" exactly as written", entry.input)),
            (EntryKind::Correction, Some(output)) => {
                Some(format!("- Replace \"{}\" with \"{}\"", entry.input, output))
            }
            (EntryKind::Correction, None) => None,
        })
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(format!(
        "Dictionary (use these spellings and replacements):\n{}",
        lines.join("\n")
    ))
}
