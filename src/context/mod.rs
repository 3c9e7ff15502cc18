//! Routing context: everything the router prompt needs besides the transcript.
//!
//! A fresh [`RoutingContext`] is gathered for every utterance so the open-app
//! list and the dictionary are never stale.  Gathering runs processes and
//! reads files, so callers run [`ContextSource::routing_context`] on a
//! blocking thread.

pub mod dictionary;
pub mod environment;

pub use dictionary::{load_dictionary, load_style_examples, DictionaryEntry, EntryKind};

use std::sync::Arc;

use crate::actions::SystemActions;
use crate::config::{ActionsConfig, AppPaths, RouterConfig};

/// Read-only inputs to one routing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingContext {
    /// Router credential; `None` when not configured.
    pub api_key: Option<String>,
    pub default_browser: String,
    /// Running user-facing apps, sorted.
    pub open_apps: Vec<String>,
    /// Installed apps, sorted.  `None` when the app directory was unreadable.
    pub installed_apps: Option<Vec<String>>,
    pub dictionary: Vec<DictionaryEntry>,
    pub style_examples: String,
}

impl RoutingContext {
    pub fn open_apps_description(&self) -> String {
        environment::describe_apps(&self.open_apps, "None detected")
    }

    pub fn installed_apps_description(&self) -> String {
        match &self.installed_apps {
            Some(apps) => environment::describe_apps(apps, "Unknown"),
            None => "Unknown".to_string(),
        }
    }
}

/// Produces a [`RoutingContext`].  Blocking.
pub trait ContextSource: Send + Sync {
    fn routing_context(&self) -> RoutingContext;
}

/// A context that never changes.  Used by tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct StaticContext(pub RoutingContext);

impl ContextSource for StaticContext {
    fn routing_context(&self) -> RoutingContext {
        self.0.clone()
    }
}

/// Gathers the context from settings, the config directory and the desktop.
pub struct LiveContext {
    system: Arc<dyn SystemActions>,
    router: RouterConfig,
    actions: ActionsConfig,
    paths: AppPaths,
}

impl LiveContext {
    pub fn new(
        system: Arc<dyn SystemActions>,
        router: &RouterConfig,
        actions: &ActionsConfig,
        paths: &AppPaths,
    ) -> Self {
        Self {
            system,
            router: router.clone(),
            actions: actions.clone(),
            paths: paths.clone(),
        }
    }

    fn default_browser(&self) -> String {
        self.actions
            .default_browser
            .clone()
            .filter(|b| !b.trim().is_empty())
            .or_else(environment::detect_default_browser)
            .unwrap_or_else(|| environment::FALLBACK_BROWSER.to_string())
    }

    fn open_apps(&self) -> Vec<String> {
        match self.system.running_apps() {
            Ok(mut apps) => {
                apps.sort();
                apps
            }
            Err(e) => {
                log::warn!("context: cannot list running apps: {e}");
                Vec::new()
            }
        }
    }
}

impl ContextSource for LiveContext {
    fn routing_context(&self) -> RoutingContext {
        let context = RoutingContext {
            api_key: self.router.resolved_api_key(),
            default_browser: self.default_browser(),
            open_apps: self.open_apps(),
            installed_apps: environment::installed_apps(),
            dictionary: load_dictionary(&self.paths.dictionary_file),
            style_examples: load_style_examples(&self.paths.style_file),
        };
        log::debug!(
            "context: browser={} open={} installed={} dictionary={}",
            context.default_browser,
            context.open_apps.len(),
            context.installed_apps.as_ref().map_or(0, Vec::len),
            context.dictionary.len()
        );
        context
    }
}
