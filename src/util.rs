use rand::{Rng, distr::Alphanumeric};

/// 8-char lowercase id for share links and audit entry keys.
pub fn short_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

/// Truncate to at most `max_chars` characters, never splitting a char.
pub fn clip(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
