//! Classification of the `open_app` argument as URL or application name.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// What `open_app` was asked to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    /// A web address, already normalised to carry a scheme.
    Url(String),
    /// An application name or bundle identifier.
    App(String),
}

fn bare_domain() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9-]+\.[a-zA-Z]{2,}").expect("static regex"))
}

fn has_scheme(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

impl OpenTarget {
    /// Decide whether `target` is a URL.
    ///
    /// A URL must contain a dot and either carry an `http(s)://` scheme,
    /// start with `www.`, or look like `label.tld` with a TLD of at least two
    /// letters.  URLs without a scheme get `https://`.
    ///
    /// ```
    /// use voice_command::actions::OpenTarget;
    ///
    /// assert_eq!(
    ///     OpenTarget::classify("github.com"),
    ///     OpenTarget::Url("https://github.com".into())
    /// );
    /// assert_eq!(OpenTarget::classify("Notes"), OpenTarget::App("Notes".into()));
    /// ```
    pub fn classify(target: &str) -> Self {
        let target = target.trim();
        let looks_like_url = target.contains('.')
            && (has_scheme(target) || target.starts_with("www.") || bare_domain().is_match(target));

        if !looks_like_url {
            return OpenTarget::App(target.to_string());
        }

        if has_scheme(target) {
            OpenTarget::Url(target.to_string())
        } else {
            OpenTarget::Url(format!("https://{target}"))
        }
    }
}

/// Parse a normalised URL, `None` when malformed.
pub fn parse_url(url: &str) -> Option<Url> {
    Url::parse(url).ok()
}
