use crate::bot::commands::privacy_status;
use crate::database::models::{Node, Person};
use crate::utils::markdown::escape_underscores;

/// `/help` and `/start`: introduction, the person's nodes and profile, and
/// the command list.
pub fn help_text(person: &Person, nodes: &[Node]) -> String {
    let mut lines = vec![
        "👋 *Welcome to Hackabot!*".to_string(),
        String::new(),
        "I'm the friendly bot for the Hacka\\* network — a global community of hackers, makers, and builders."
            .to_string(),
        String::new(),
        "🔒 *Privacy:* I never store any of your group messages.".to_string(),
        String::new(),
        "🌐 For more info, visit https://hacka.network".to_string(),
        String::new(),
    ];

    if nodes.is_empty() {
        lines.push("📍 You're not in any Hacka\\* nodes yet!".to_string());
    } else {
        lines.push("📍 *Your nodes:*".to_string());
        lines.extend(nodes.iter().map(|node| format!("  • {}", node.display_name())));
    }

    lines.push(String::new());
    lines.push("👤 *Your profile:*".to_string());
    if !person.username.is_empty() {
        lines.push(format!("  • Telegram: @{}", escape_underscores(&person.username)));
    }
    if !person.username_x.is_empty() {
        lines.push(format!("  • X/Twitter: @{}", escape_underscores(&person.username_x)));
    }
    if !person.bio.is_empty() {
        lines.push(format!("  • Bio: _{}_", escape_underscores(&person.bio)));
    }

    lines.push(String::new());
    lines.push(format!("🛡️ *Privacy mode:* {}", privacy_status(person.privacy)));
    lines.push(if person.privacy {
        "  You are hidden from hacka.network".to_string()
    } else {
        "  You are listed on hacka.network for your nodes".to_string()
    });

    lines.push(String::new());
    lines.extend(
        [
            "*Commands:*",
            "  /bio your text — set your bio",
            "  /bio unset — clear your bio",
            "  /x @username — set your X/Twitter username",
            "  /privacy on — turn privacy mode ON",
            "  /privacy off — turn privacy mode OFF",
            "  /people — list people in your nodes",
        ]
        .map(String::from),
    );

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Person {
        Person {
            id: 1,
            telegram_id: 12345,
            is_bot: false,
            first_name: "Alice".to_string(),
            username: "alice_dev".to_string(),
            privacy: true,
            username_x: String::new(),
            bio: String::new(),
            onboarded: true,
        }
    }

    #[test]
    fn test_help_without_nodes() {
        let text = help_text(&person(), &[]);
        assert!(text.starts_with("👋 *Welcome to Hackabot!*"));
        assert!(text.contains("📍 You're not in any Hacka\\* nodes yet!"));
        assert!(text.contains("  • Telegram: @alice\\_dev"));
        assert!(!text.contains("X/Twitter: @"));
        assert!(text.contains("🛡️ *Privacy mode:* ON 🔒\n  You are hidden from hacka.network"));
        assert!(text.ends_with("  /people — list people in your nodes"));
    }

    #[test]
    fn test_help_shows_profile_fields() {
        let mut person = person();
        person.privacy = false;
        person.username_x = "alice_x".to_string();
        person.bio = "Building_things".to_string();

        let text = help_text(&person, &[]);
        assert!(text.contains("  • X/Twitter: @alice\\_x"));
        assert!(text.contains("  • Bio: _Building\\_things_"));
        assert!(text.contains("OFF 🔓\n  You are listed on hacka.network for your nodes"));
    }
}
