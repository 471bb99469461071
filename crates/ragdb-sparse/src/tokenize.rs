/// Lowercases and splits on whitespace, trimming edge punctuation while
/// keeping in-token `-`, `.` and `_` so operations vocabulary survives
/// intact ("kafka-topics.sh", "--create", "log.retention").
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| trim_token(&raw.to_lowercase()).to_string())
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .collect()
}

/// Edge dots alternate with other punctuation ("(once)."), so trim to a
/// fixpoint rather than in one pass.
fn trim_token(token: &str) -> &str {
    let mut current = token;
    loop {
        let next = current
            .trim_matches(|c: char| !(c.is_alphanumeric() || c == '-' || c == '.' || c == '_'))
            .trim_start_matches('.')
            .trim_end_matches('.');
        if next == current {
            return current;
        }
        current = next;
    }
}
