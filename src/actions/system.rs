//! OS seam for the tool executor: launching, activating, and media control.
//!
//! [`DesktopSystem`] shells out to the platform's own tools:
//!
//! | Operation       | macOS                          | Linux                     |
//! |-----------------|--------------------------------|---------------------------|
//! | open URL        | `open <url>`                   | `xdg-open <url>`          |
//! | launch bundle   | `open -b <id>`                 | `gtk-launch <id>`         |
//! | launch by name  | `open -a <name>`               | `<name>` as a command     |
//! | running apps    | System Events via `osascript`  | `wmctrl -lx`              |
//! | activate        | `osascript … to activate`      | `wmctrl -xa <class>`      |
//! | player control  | Spotify via `osascript`        | `playerctl -p spotify`    |

use std::fmt;
use std::process::{Command, Output};

use super::ActionError;

// ---------------------------------------------------------------------------
// PlayerCommand
// ---------------------------------------------------------------------------

/// Spotify playback commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Play,
    Pause,
    Next,
}

impl PlayerCommand {
    /// Parse a spoken action, case-insensitively.
    pub fn parse(action: &str) -> Option<Self> {
        match action.trim().to_lowercase().as_str() {
            "play" => Some(PlayerCommand::Play),
            "pause" => Some(PlayerCommand::Pause),
            "next" => Some(PlayerCommand::Next),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlayerCommand::Play => "play",
            PlayerCommand::Pause => "pause",
            PlayerCommand::Next => "next",
        })
    }
}

// ---------------------------------------------------------------------------
// SystemActions
// ---------------------------------------------------------------------------

/// Side effects the tool executor performs against the desktop.
///
/// All methods block until the underlying launch/control call returns.
pub trait SystemActions: Send + Sync {
    /// Hand `url` to the system URL handler (default browser).
    fn open_url(&self, url: &str) -> Result<(), ActionError>;

    /// Launch by bundle / desktop-file identifier.  `Ok(false)` means no such
    /// identifier is installed.
    fn launch_bundle(&self, bundle_id: &str) -> Result<bool, ActionError>;

    /// Launch by display name.
    fn launch_by_name(&self, name: &str) -> Result<(), ActionError>;

    /// Names of running, user-facing applications.
    fn running_apps(&self) -> Result<Vec<String>, ActionError>;

    /// Bring the named running application to the front.
    fn activate(&self, app_name: &str) -> Result<(), ActionError>;

    /// Send a playback command to Spotify.
    fn control_player(&self, command: PlayerCommand) -> Result<(), ActionError>;
}

// ---------------------------------------------------------------------------
// DesktopSystem
// ---------------------------------------------------------------------------

/// [`SystemActions`] implemented with platform command-line tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopSystem;

fn run(program: &str, args: &[&str]) -> Result<Output, ActionError> {
    log::debug!("actions: running {program} {args:?}");
    Command::new(program)
        .args(args)
        .output()
        .map_err(|e| ActionError::Command(format!("{program}: {e}")))
}

/// Escape a value for use inside an AppleScript string literal.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn applescript_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Distinct window classes from `wmctrl -lx` output, sorted.
#[cfg_attr(target_os = "macos", allow(dead_code))]
fn window_classes(listing: &str) -> Vec<String> {
    let mut names: Vec<String> = listing
        .lines()
        // <id> <desktop> <instance.Class> <host> <title…>
        .filter_map(|line| line.split_whitespace().nth(2))
        .filter_map(|class| class.rsplit('.').next())
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(target_os = "macos")]
impl SystemActions for DesktopSystem {
    fn open_url(&self, url: &str) -> Result<(), ActionError> {
        let output = run("open", &[url])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ActionError::InvalidUrl(url.to_string()))
        }
    }

    fn launch_bundle(&self, bundle_id: &str) -> Result<bool, ActionError> {
        Ok(run("open", &["-b", bundle_id])?.status.success())
    }

    fn launch_by_name(&self, name: &str) -> Result<(), ActionError> {
        let output = run("open", &["-a", name])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ActionError::LaunchFailed(name.to_string()))
        }
    }

    fn running_apps(&self) -> Result<Vec<String>, ActionError> {
        let script = "tell application \"System Events\" to get name of every application process whose background only is false";
        let output = run("osascript", &["-e", script])?;
        if !output.status.success() {
            return Err(ActionError::Command(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .trim()
            .split(", ")
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn activate(&self, app_name: &str) -> Result<(), ActionError> {
        let script = format!("tell application \"{}\" to activate", applescript_quote(app_name));
        let output = run("osascript", &["-e", &script])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ActionError::NoRunningApp(app_name.to_string()))
        }
    }

    fn control_player(&self, command: PlayerCommand) -> Result<(), ActionError> {
        let verb = match command {
            PlayerCommand::Play => "play",
            PlayerCommand::Pause => "pause",
            PlayerCommand::Next => "next track",
        };
        let script = format!("tell application \"Spotify\" to {verb}");
        let output = run("osascript", &["-e", &script])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ActionError::PlayerControl)
        }
    }
}

#[cfg(not(target_os = "macos"))]
impl SystemActions for DesktopSystem {
    fn open_url(&self, url: &str) -> Result<(), ActionError> {
        let output = run("xdg-open", &[url])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ActionError::InvalidUrl(url.to_string()))
        }
    }

    fn launch_bundle(&self, bundle_id: &str) -> Result<bool, ActionError> {
        match run("gtk-launch", &[bundle_id]) {
            Ok(output) => Ok(output.status.success()),
            // gtk-launch missing: treat as "no such identifier".
            Err(_) => Ok(false),
        }
    }

    fn launch_by_name(&self, name: &str) -> Result<(), ActionError> {
        let program = name.trim().to_lowercase().replace(' ', "-");
        let mut child = Command::new(&program)
            .spawn()
            .map_err(|_| ActionError::LaunchFailed(name.to_string()))?;
        // Reap the app when it exits so it does not linger as a zombie.
        std::thread::Builder::new()
            .name(format!("reap-{program}"))
            .spawn(move || {
                if let Err(e) = child.wait() {
                    log::debug!("actions: wait on {program} failed: {e}");
                }
            })
            .map_err(|e| ActionError::Command(format!("cannot spawn reaper thread: {e}")))?;
        Ok(())
    }

    fn running_apps(&self) -> Result<Vec<String>, ActionError> {
        let output = run("wmctrl", &["-lx"])?;
        if !output.status.success() {
            return Err(ActionError::Command("wmctrl -lx failed".into()));
        }
        Ok(window_classes(&String::from_utf8_lossy(&output.stdout)))
    }

    fn activate(&self, app_name: &str) -> Result<(), ActionError> {
        let output = run("wmctrl", &["-xa", app_name])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ActionError::NoRunningApp(app_name.to_string()))
        }
    }

    fn control_player(&self, command: PlayerCommand) -> Result<(), ActionError> {
        let verb = command.to_string();
        let output = run("playerctl", &["--player=spotify", &verb])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ActionError::PlayerControl)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_actions_parse_case_insensitively() {
        assert_eq!(PlayerCommand::parse("Play"), Some(PlayerCommand::Play));
        assert_eq!(PlayerCommand::parse("PAUSE"), Some(PlayerCommand::Pause));
        assert_eq!(PlayerCommand::parse(" next "), Some(PlayerCommand::Next));
        assert_eq!(PlayerCommand::parse("previous"), None);
    }

    #[test]
    fn window_classes_are_distinct_even_when_not_adjacent() {
        let listing = "\
0x01 0 firefox.Firefox  host Docs
0x02 0 slack.Slack      host General
0x03 1 firefox.Firefox  host Issues
";
        assert_eq!(window_classes(listing), vec!["Firefox", "Slack"]);
        assert!(window_classes("").is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn launch_by_name_spawns_lowercased_program() {
        assert!(DesktopSystem.launch_by_name("True").is_ok());
        assert!(matches!(
            DesktopSystem.launch_by_name("No Such Program Zz"),
            Err(ActionError::LaunchFailed(name)) if name == "No Such Program Zz"
        ));
    }

    #[test]
    fn applescript_strings_are_escaped() {
        assert_eq!(applescript_quote(r#"My "App""#), r#"My \"App\""#);
        assert_eq!(applescript_quote(r"a\b"), r"a\\b");
    }
}
