//! Tool executor: turns a routed [`ToolCall`] into one desktop side effect.
//!
//! # Dispatch table
//!
//! | Tool            | Effect |
//! |-----------------|--------|
//! | `type`          | focus-aware clipboard paste ([`TextDelivery`]) |
//! | `open_app`      | open a URL, or launch an app (bundle id, then name) |
//! | `switch_to`     | activate the first running app whose name contains the argument |
//! | `deep_research` | open a web search for the topic |
//! | `spotify`       | play / pause / next |
//!
//! Every failure is an [`ActionError`].  [`ToolExecutor::dispatch`] never
//! panics on bad input; the pipeline turns an error into a single system
//! message and carries on.

pub mod system;
pub mod target;

pub use system::{DesktopSystem, PlayerCommand, SystemActions};
pub use target::OpenTarget;

use std::sync::Arc;

use thiserror::Error;

use crate::config::ActionsConfig;
use crate::focus::FocusInspector;
use crate::inject::{Delivery, InjectError, TextDelivery};
use crate::tool::{Tool, ToolCall};

// ---------------------------------------------------------------------------
// ActionError
// ---------------------------------------------------------------------------

/// Errors raised by tool handlers.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Unknown tool")]
    UnknownTool,

    #[error("missing argument for {0}")]
    MissingArgument(Tool),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to open app: {0}")]
    LaunchFailed(String),

    #[error("No running app found: {0}")]
    NoRunningApp(String),

    #[error("Unknown Spotify action: {0}. Use play, pause, or next.")]
    UnknownPlayerAction(String),

    #[error("Failed to control Spotify")]
    PlayerControl,

    #[error("command failed: {0}")]
    Command(String),

    #[error(transparent)]
    Inject(#[from] InjectError),
}

// ---------------------------------------------------------------------------
// ActionOutcome
// ---------------------------------------------------------------------------

/// What a successful dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Typed(Delivery),
    OpenedUrl(String),
    LaunchedApp(String),
    Activated(String),
    /// The search URL was opened (`true`) or silently skipped (`false`).
    Searched(bool),
    Player(PlayerCommand),
}

// ---------------------------------------------------------------------------
// ToolExecutor
// ---------------------------------------------------------------------------

/// Dispatches tool calls to their handlers.
///
/// Blocking: handlers launch processes and sleep for clipboard delays.
#[derive(Clone)]
pub struct ToolExecutor {
    system: Arc<dyn SystemActions>,
    delivery: TextDelivery,
    focus: Arc<dyn FocusInspector>,
    search_url: String,
}

impl ToolExecutor {
    pub fn new(
        system: Arc<dyn SystemActions>,
        delivery: TextDelivery,
        focus: Arc<dyn FocusInspector>,
        config: &ActionsConfig,
    ) -> Self {
        Self {
            system,
            delivery,
            focus,
            search_url: config.search_url.clone(),
        }
    }

    /// Run the handler named by `call`.
    pub fn dispatch(&self, call: &ToolCall) -> Result<ActionOutcome, ActionError> {
        let tool = call.tool().ok_or(ActionError::UnknownTool)?;
        let arg = call
            .tool_arguments
            .as_text()
            .ok_or(ActionError::MissingArgument(tool))?;

        log::info!("actions: {tool}({arg:?})");

        match tool {
            Tool::Type => self.type_text(arg),
            Tool::OpenApp => self.open_app(arg),
            Tool::SwitchTo => self.switch_to(arg),
            Tool::DeepResearch => Ok(self.deep_research(arg)),
            Tool::Spotify => self.spotify(arg),
        }
    }

    fn type_text(&self, text: &str) -> Result<ActionOutcome, ActionError> {
        let focus = self.focus.inspect();
        log::debug!("actions: focus state = {focus}");
        let delivery = self.delivery.deliver(text, focus)?;
        Ok(ActionOutcome::Typed(delivery))
    }

    fn open_app(&self, target: &str) -> Result<ActionOutcome, ActionError> {
        match OpenTarget::classify(target) {
            OpenTarget::Url(url) => {
                if target::parse_url(&url).is_none() {
                    return Err(ActionError::InvalidUrl(target.to_string()));
                }
                self.system.open_url(&url)?;
                Ok(ActionOutcome::OpenedUrl(url))
            }
            OpenTarget::App(name) => {
                let launched = self
                    .system
                    .launch_bundle(&name)
                    .map_err(|_| ActionError::LaunchFailed(name.clone()))?;
                if !launched {
                    self.system
                        .launch_by_name(&name)
                        .map_err(|_| ActionError::LaunchFailed(name.clone()))?;
                }
                Ok(ActionOutcome::LaunchedApp(name))
            }
        }
    }

    fn switch_to(&self, wanted: &str) -> Result<ActionOutcome, ActionError> {
        let needle = wanted.to_lowercase();
        let running = self.system.running_apps()?;

        let Some(app) = running
            .into_iter()
            .find(|name| name.to_lowercase().contains(&needle))
        else {
            return Err(ActionError::NoRunningApp(wanted.to_string()));
        };

        self.system.activate(&app)?;
        Ok(ActionOutcome::Activated(app))
    }

    /// Best-effort: a malformed URL or a failed open is logged, not reported.
    fn deep_research(&self, topic: &str) -> ActionOutcome {
        let url = format!("{}{}", self.search_url, urlencoding::encode(topic));
        if target::parse_url(&url).is_none() {
            log::warn!("actions: skipping research, malformed URL {url:?}");
            return ActionOutcome::Searched(false);
        }
        match self.system.open_url(&url) {
            Ok(()) => ActionOutcome::Searched(true),
            Err(e) => {
                log::warn!("actions: could not open research URL: {e}");
                ActionOutcome::Searched(false)
            }
        }
    }

    fn spotify(&self, action: &str) -> Result<ActionOutcome, ActionError> {
        let command = PlayerCommand::parse(action)
            .ok_or_else(|| ActionError::UnknownPlayerAction(action.to_string()))?;
        self.system.control_player(command)?;
        Ok(ActionOutcome::Player(command))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
