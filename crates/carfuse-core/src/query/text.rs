//! Free-text input scrubbing

/// Longest search term passed to a `LIKE` pattern
const MAX_SEARCH_LEN: usize = 255;

/// Trim, drop control characters and angle brackets, and cap at `max_chars`.
pub fn sanitize_text(input: &str, max_chars: usize) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .take(max_chars)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Scrub a search term before it is wrapped in `%...%`
pub fn sanitize_search_term(input: &str) -> String {
    sanitize_text(input, MAX_SEARCH_LEN)
}
