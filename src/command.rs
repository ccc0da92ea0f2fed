//! Events and commands shared by all components.
//!
//! [`Event`] is everything the [`Dispatcher`](crate::dispatcher::Dispatcher)
//! reacts to: clicks, hover changes, focus changes and remote-control
//! [`RemoteCommand`]s.  [`UiUpdate`] is what the dispatcher asks the UI to
//! do in return.  [`WindowState`] is the visibility state the dispatcher
//! consults before every refresh pass.

use crate::entry::EntryId;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Remote-control operations accepted from an already-running instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCommand {
    Show,
    Hide,
    Quit,
}

impl RemoteCommand {
    /// Wire name of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteCommand::Show => "show",
            RemoteCommand::Hide => "hide",
            RemoteCommand::Quit => "quit",
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a command name, case-insensitively.
pub fn parse_remote_command(s: &str) -> Option<RemoteCommand> {
    match s.trim().to_lowercase().as_str() {
        "show" => Some(RemoteCommand::Show),
        "hide" => Some(RemoteCommand::Hide),
        "quit" => Some(RemoteCommand::Quit),
        _ => None,
    }
}

impl Serialize for RemoteCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RemoteCommand {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_remote_command(&s)
            .ok_or_else(|| DeError::custom(format!("invalid remote command: {:?}", s)))
    }
}

/// Input to the dispatcher's event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A button was activated.
    Clicked(EntryId),
    /// The pointer entered a button.
    HoverEnter(EntryId),
    /// The pointer left a button.
    HoverExit(EntryId),
    /// The window gained focus.
    WindowActivated,
    /// The window lost focus.
    WindowDeactivated,
    /// A remote-control request.
    Remote(RemoteCommand),
}

/// Requests from the dispatcher to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    /// Replace the text of an infobar.
    InfobarText { id: EntryId, text: String },
    /// Toggle the hover look of a button.
    Hover { id: EntryId, hovered: bool },
    Show,
    Hide,
    Quit,
}

/// Visibility of the launcher window.
///
/// Only external events move the window between states; the dispatcher
/// reads the state to decide whether a refresh pass may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    /// Focused; refresh runs.
    Active,
    /// Shown but unfocused; refresh runs only in background mode.
    #[default]
    Inactive,
    /// Hidden by remote control.
    Hidden,
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_commands_deserialize_case_insensitively() {
        let cmd: RemoteCommand = serde_json::from_str(r#""show""#).unwrap();
        assert_eq!(cmd, RemoteCommand::Show);
        let cmd: RemoteCommand = serde_json::from_str(r#""Hide""#).unwrap();
        assert_eq!(cmd, RemoteCommand::Hide);
        let cmd: RemoteCommand = serde_json::from_str(r#"" QUIT ""#).unwrap();
        assert_eq!(cmd, RemoteCommand::Quit);
    }

    #[test]
    fn unknown_remote_command_is_rejected() {
        assert!(serde_json::from_str::<RemoteCommand>(r#""toggle""#).is_err());
        assert!(serde_json::from_str::<RemoteCommand>("42").is_err());
    }

    #[test]
    fn remote_command_serializes_to_wire_name() {
        assert_eq!(serde_json::to_string(&RemoteCommand::Quit).unwrap(), r#""quit""#);
        assert_eq!(RemoteCommand::Show.to_string(), "show");
    }
}
