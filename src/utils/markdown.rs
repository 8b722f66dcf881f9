//! Helpers for text sent with Telegram's legacy `Markdown` parse mode.

const SPECIAL_CHARACTERS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Backslash-escapes every character with a formatting meaning.
///
/// # Example
/// ```
/// use hackabot::utils::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("Hacka *Bali*"), "Hacka \\*Bali\\*");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL_CHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escapes underscores only, enough for usernames inside plain lines.
pub fn escape_underscores(text: &str) -> String {
    text.replace('_', "\\_")
}

/// Inline mention link that notifies the user.
pub fn mention(first_name: &str, telegram_id: i64) -> String {
    let name = if first_name.is_empty() { "there" } else { first_name };
    format!("[{}](tg://user?id={})", name, telegram_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("Test*Bold*"), "Test\\*Bold\\*");
        assert_eq!(escape_markdown("[link](url)"), "\\[link\\]\\(url\\)");
        assert_eq!(escape_markdown("Hacka Bali"), "Hacka Bali");
        assert_eq!(escape_markdown(""), "");
    }

    #[test]
    fn test_escape_underscores() {
        assert_eq!(escape_underscores("cool_dev_42"), "cool\\_dev\\_42");
    }

    #[test]
    fn test_mention() {
        assert_eq!(mention("Alice", 42), "[Alice](tg://user?id=42)");
        assert_eq!(mention("", 7), "[there](tg://user?id=7)");
    }
}
