use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static SCRUBBER: LazyLock<SecretScrubber> = LazyLock::new(SecretScrubber::new);

/// Redacts credentials from text that came from upstream services.
///
/// Applied to error bodies before they are logged or surfaced as a
/// completion `error_detail`.
#[derive(Clone)]
pub struct SecretScrubber {
    secret_key_pattern: Regex,
    token_pattern: Regex,
    bearer_pattern: Regex,
    password_pattern: Regex,
}

impl SecretScrubber {
    /// Create a new scrubber
    pub fn new() -> Self {
        Self {
            // sk-..., scw-... style keys and bare UUID secret keys
            secret_key_pattern: Regex::new(
                r"\b(?:sk|scw)-[a-zA-Z0-9_-]{16,}|\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b",
            )
            .expect("secret key pattern"),
            token_pattern: Regex::new(
                r#"["']?(?:api_key|apikey|token|secret|secret_key)["']?\s*[:=]\s*["']?([a-zA-Z0-9_.-]{8,})["']?"#,
            )
            .expect("token pattern"),
            bearer_pattern: Regex::new(r"Bearer\s+[a-zA-Z0-9_.=-]+").expect("bearer pattern"),
            password_pattern: Regex::new(r#"["']?password["']?\s*[:=]\s*["']?([^"'\s,}]+)["']?"#)
                .expect("password pattern"),
        }
    }

    /// The shared process-wide scrubber.
    pub fn global() -> &'static Self {
        &SCRUBBER
    }

    /// Scrub a message of sensitive data
    pub fn scrub_message(&self, message: &str) -> String {
        let mut scrubbed = self
            .bearer_pattern
            .replace_all(message, "Bearer [TOKEN_REDACTED]")
            .to_string();
        scrubbed = self
            .token_pattern
            .replace_all(&scrubbed, |caps: &regex::Captures| {
                let full_match = &caps[0];
                if let Some(colon_pos) = full_match.find(':') {
                    format!("{}:[REDACTED]", &full_match[..colon_pos])
                } else if let Some(eq_pos) = full_match.find('=') {
                    format!("{}=[REDACTED]", &full_match[..eq_pos])
                } else {
                    "[REDACTED]".to_string()
                }
            })
            .to_string();
        scrubbed = self
            .secret_key_pattern
            .replace_all(&scrubbed, "[API_KEY_REDACTED]")
            .to_string();
        scrubbed = self
            .password_pattern
            .replace_all(&scrubbed, "password=[REDACTED]")
            .to_string();
        scrubbed
    }

    /// Scrub, then cut to at most `max_chars` characters.
    pub fn scrub_truncated(&self, message: &str, max_chars: usize) -> String {
        let scrubbed = self.scrub_message(message.trim());
        if scrubbed.chars().count() <= max_chars {
            return scrubbed;
        }
        let mut cut: String = scrubbed.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    }
}

impl Default for SecretScrubber {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber").finish()
    }
}
