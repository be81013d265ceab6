use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Token prefixes and header/query markers whose following token is secret.
const SECRET_MARKERS: [&str; 10] = [
    "sk-",
    "xoxb-",
    "ghp_",
    "Bearer ",
    "bearer ",
    "api_key=",
    "access_token=",
    "\"api_key\":\"",
    "\"access_token\":\"",
    "bot",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

/// Redact the token following every occurrence of `marker`.
fn redact_after(text: &mut String, marker: &str) {
    let mut from = 0;
    while let Some(offset) = text[from..].find(marker) {
        let start = from + offset;
        let token_start = start + marker.len();
        let token_len: usize = text[token_start..]
            .chars()
            .take_while(|c| is_secret_char(*c))
            .map(char::len_utf8)
            .sum();

        // `bot` only counts as a marker in Telegram URLs: bot<digits>:<secret>
        let is_bot_marker = marker == "bot";
        let looks_like_secret = if is_bot_marker {
            let token = &text[token_start..token_start + token_len];
            token.contains(':') && token.starts_with(|c: char| c.is_ascii_digit())
        } else {
            token_len > 0
        };

        if !looks_like_secret {
            from = token_start;
            continue;
        }
        let keep = if is_bot_marker { marker.len() } else { 0 };
        text.replace_range(start + keep..token_start + token_len, REDACTED);
        from = start + keep + REDACTED.len();
    }
}

/// Scrub secret-looking tokens from text leaving the process.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    if !SECRET_MARKERS.iter().any(|m| input.contains(m)) {
        return Cow::Borrowed(input);
    }
    let mut scrubbed = input.to_string();
    for marker in SECRET_MARKERS {
        redact_after(&mut scrubbed, marker);
    }
    Cow::Owned(scrubbed)
}

/// Scrub and truncate an API error body for logs and user-facing errors.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);
    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }
    let truncated: String = scrubbed.chars().take(MAX_API_ERROR_CHARS).collect();
    format!("{truncated}...")
}

/// Build a sanitized error from a failed HTTP response.
pub async fn api_error(provider: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    anyhow::anyhow!("{provider} API error ({status}): {}", sanitize_api_error(&body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_is_borrowed() {
        assert!(matches!(
            scrub_secret_patterns("nothing to see"),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn redacts_keys_and_bearer_tokens() {
        let scrubbed = scrub_secret_patterns("bad key sk-ant-abc123 and Bearer xyz.789");
        assert_eq!(scrubbed, "bad key [REDACTED] and [REDACTED]");
    }

    #[test]
    fn redacts_telegram_bot_tokens_in_urls() {
        let scrubbed =
            scrub_secret_patterns("error sending request for url (https://api.telegram.org/bot123456:AAE-x_y/getUpdates)");
        assert_eq!(
            scrubbed,
            "error sending request for url (https://api.telegram.org/bot[REDACTED])"
        );
        assert_eq!(scrub_secret_patterns("robot arm"), "robot arm");
    }

    #[test]
    fn long_errors_are_truncated() {
        let body = "x".repeat(500);
        let sanitized = sanitize_api_error(&body);
        assert_eq!(sanitized.chars().count(), MAX_API_ERROR_CHARS + 3);
        assert!(sanitized.ends_with("..."));
    }
}
