/// Action attached to an inline button, carried in its `callback_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Menu,
    Status,
    RecentLists,
    ViewList(String),
}

// Telegram rejects buttons whose callback data is longer than this many bytes.
const MAX_CALLBACK_DATA_LEN: usize = 64;
const VIEW_LIST_PREFIX: &str = "list:";

impl CallbackAction {
    pub fn parse(data: &str) -> Result<CallbackAction, String> {
        match data {
            "menu" => Ok(CallbackAction::Menu),
            "status" => Ok(CallbackAction::Status),
            "recent" => Ok(CallbackAction::RecentLists),
            _ => match data.strip_prefix(VIEW_LIST_PREFIX) {
                Some(date) if !date.is_empty() => Ok(CallbackAction::ViewList(date.to_string())),
                _ => Err(format!("{} is not a valid callback action", data)),
            },
        }
    }

    /// Encoded form, or `None` when it would not fit in a button.
    pub fn encode(&self) -> Option<String> {
        let data = match self {
            CallbackAction::Menu => String::from("menu"),
            CallbackAction::Status => String::from("status"),
            CallbackAction::RecentLists => String::from("recent"),
            CallbackAction::ViewList(date) => format!("{}{}", VIEW_LIST_PREFIX, date),
        };

        Some(data).filter(|data| data.len() <= MAX_CALLBACK_DATA_LEN)
    }
}

/// Returns true when `text` is the bot command `command`, either bare (`/start`) or addressed to
/// this bot (`/start@lists_bot`). Arguments after the command are ignored.
pub fn is_command(text: &str, command: &str, bot_username: &str) -> bool {
    let Some(first) = text.split_whitespace().next() else {
        return false;
    };
    let Some(first) = first.strip_prefix('/') else {
        return false;
    };

    match first.split_once('@') {
        Some((name, target)) => name == command && target.eq_ignore_ascii_case(bot_username),
        None => first == command,
    }
}
