pub mod help;
pub mod people;
pub mod profile;

/// Text appended when someone edits their public profile while hidden.
pub const PRIVACY_NUDGE: &str = "\n\n💡 Your privacy mode is ON, so you won't appear on hacka.network. Use `/privacy off` to be listed!";

/// Direct message commands, matched by prefix like the Telegram clients
/// suggest them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    X,
    Privacy,
    Bio,
    People,
    Unknown,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        if text.starts_with("/help") || text.starts_with("/start") {
            Command::Help
        } else if text.starts_with("/x ") || text == "/x" {
            Command::X
        } else if text.starts_with("/privacy") {
            Command::Privacy
        } else if text.starts_with("/bio") {
            Command::Bio
        } else if text.starts_with("/people") {
            Command::People
        } else {
            Command::Unknown
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::X => "x",
            Command::Privacy => "privacy",
            Command::Bio => "bio",
            Command::People => "people",
            Command::Unknown => "unknown",
        }
    }
}

/// Everything after the first run of whitespace, if anything.
pub fn command_argument(text: &str) -> Option<&str> {
    text.trim()
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim_start())
        .filter(|rest| !rest.is_empty())
}

pub fn privacy_status(privacy: bool) -> &'static str {
    if privacy {
        "ON 🔒"
    } else {
        "OFF 🔓"
    }
}
