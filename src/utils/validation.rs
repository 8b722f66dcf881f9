use anyhow::{anyhow, Result};

pub const BIO_MAX_LENGTH: usize = 140;
const WEBHOOK_SECRET_MAX_LENGTH: usize = 256;

/// Telegram accepts 1-256 characters of `A-Z`, `a-z`, `0-9`, `_` and `-`.
pub fn validate_webhook_secret(secret: &str) -> Result<()> {
    if secret.is_empty() {
        return Err(anyhow!("secret cannot be empty"));
    }

    if secret.len() > WEBHOOK_SECRET_MAX_LENGTH {
        return Err(anyhow!(
            "secret cannot be longer than {} characters",
            WEBHOOK_SECRET_MAX_LENGTH
        ));
    }

    if !secret
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(anyhow!(
            "secret can only contain letters, numbers, underscores and hyphens"
        ));
    }

    Ok(())
}

/// Normalizes the argument of `/x`, returning the username without `@`.
/// Error messages are shown to the user as they are.
pub fn validate_x_username(input: Option<&str>) -> Result<String> {
    let input = input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            anyhow!("Please provide your X/Twitter username.\n\nExample: `/x @yourname`")
        })?;

    let username = input.strip_prefix('@').unwrap_or(input);

    if username.is_empty() {
        return Err(anyhow!("Please provide a valid username.\n\nExample: `/x @yourname`"));
    }

    if username.contains('<') || username.contains('>') {
        return Err(anyhow!("Username cannot contain HTML characters."));
    }

    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(anyhow!("Please provide a valid username.\n\nExample: `/x @yourname`"));
    }

    Ok(username.to_string())
}

/// Checks a bio before entities are unescaped. Error messages are shown to
/// the user as they are.
pub fn validate_bio(bio: &str) -> Result<()> {
    let length = bio.chars().count();
    if length > BIO_MAX_LENGTH {
        return Err(anyhow!(
            "Bio is too long ({} characters).\n\nMaximum length is {} characters.",
            length,
            BIO_MAX_LENGTH
        ));
    }

    if bio.contains('<') || bio.contains('>') {
        return Err(anyhow!("Bio cannot contain HTML tags."));
    }

    if contains_command(bio) {
        return Err(anyhow!("Bio cannot contain Telegram commands (e.g. /something)."));
    }

    Ok(())
}

/// True when a `/` is directly followed by a word character.
fn contains_command(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars
        .windows(2)
        .any(|pair| pair[0] == '/' && (pair[1].is_alphanumeric() || pair[1] == '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_webhook_secret() {
        assert!(validate_webhook_secret("abc-DEF_123").is_ok());
        assert!(validate_webhook_secret(&"a".repeat(256)).is_ok());
        assert!(validate_webhook_secret("").is_err());
        assert!(validate_webhook_secret(&"a".repeat(257)).is_err());
        assert!(validate_webhook_secret("has space").is_err());
        assert!(validate_webhook_secret("semi;colon").is_err());
    }

    #[test]
    fn test_validate_x_username() {
        assert_eq!(validate_x_username(Some("@cool_dev")).ok(), Some("cool_dev".to_string()));
        assert_eq!(validate_x_username(Some("  plain  ")).ok(), Some("plain".to_string()));
        assert!(validate_x_username(None).is_err());
        assert!(validate_x_username(Some("@")).is_err());
        assert!(validate_x_username(Some("bad name")).is_err());

        let html = validate_x_username(Some("<script>"));
        assert!(html.is_err_and(|e| e.to_string().contains("HTML")));
    }

    #[test]
    fn test_validate_bio() {
        assert!(validate_bio("Building a tiny ML compiler in Rust").is_ok());
        assert!(validate_bio(&"é".repeat(140)).is_ok());
        assert!(validate_bio(&"a".repeat(141)).is_err());
        assert!(validate_bio("<b>bold</b>").is_err());
        assert!(validate_bio("try /start now").is_err());
        assert!(validate_bio("either / or").is_ok());
    }
}
