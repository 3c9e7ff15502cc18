//! Facts about the desktop that the router prompt mentions.

use std::path::Path;
use std::process::Command;

/// Browser named to the router when nothing better is known.
pub const FALLBACK_BROWSER: &str = "Safari";

#[cfg(target_os = "macos")]
const APP_DIRS: &[&str] = &["/Applications", "/System/Applications"];
#[cfg(not(target_os = "macos"))]
const APP_DIRS: &[&str] = &["/usr/share/applications", "/var/lib/flatpak/exports/share/applications"];

#[cfg(target_os = "macos")]
const APP_EXTENSION: &str = "app";
#[cfg(not(target_os = "macos"))]
const APP_EXTENSION: &str = "desktop";

/// Names of installed applications, sorted and de-duplicated.
///
/// `None` when none of the platform application directories can be read.
pub fn installed_apps() -> Option<Vec<String>> {
    let mut readable = false;
    let mut names = Vec::new();
    for dir in APP_DIRS {
        if let Some(found) = apps_in(Path::new(dir), APP_EXTENSION) {
            readable = true;
            names.extend(found);
        }
    }
    if !readable {
        return None;
    }
    names.sort();
    names.dedup();
    Some(names)
}

/// Entries of `dir` with the given extension, extension stripped.
pub fn apps_in(dir: &Path, extension: &str) -> Option<Vec<String>> {
    let entries = std::fs::read_dir(dir).ok()?;
    Some(
        entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == extension))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect(),
    )
}

/// Best-effort name of the default web browser.
pub fn detect_default_browser() -> Option<String> {
    let output = Command::new("xdg-settings")
        .args(["get", "default-web-browser"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    browser_from_desktop_id(&String::from_utf8_lossy(&output.stdout))
}

/// `"firefox.desktop\n"` → `"firefox"`.
fn browser_from_desktop_id(id: &str) -> Option<String> {
    let id = id.trim();
    let name = id.strip_suffix(".desktop").unwrap_or(id);
    (!name.is_empty()).then(|| name.to_string())
}

/// Text used for an app list in the prompt, `placeholder` when empty.
pub fn describe_apps(apps: &[String], placeholder: &str) -> String {
    if apps.is_empty() {
        placeholder.to_string()
    } else {
        apps.join(", ")
    }
}
