//! Small text utilities shared across crates.

/// Truncate text to a maximum character count, adding ellipsis if needed.
///
/// Unicode-aware character counting; trims whitespace from the input and
/// from the truncated output before adding the ellipsis.
///
/// # Examples
///
/// ```
/// use deepscout_core::util::truncate;
///
/// assert_eq!(truncate("hello world", 8), "hello...");
/// assert_eq!(truncate("short", 10), "short");
/// ```
pub fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated.trim_end())
    }
}

/// Truncate text with the total character count appended.
///
/// Useful for error messages where knowing the full size helps debugging.
pub fn truncate_with_count(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}... ({} chars total)", truncated.trim_end(), char_count)
    }
}

/// Extract the host from a URL for human-readable messages.
///
/// Falls back to the raw input when it does not parse as a URL.
///
/// # Examples
///
/// ```
/// use deepscout_core::util::host_of;
///
/// assert_eq!(host_of("https://docs.rs/tokio/latest"), "docs.rs");
/// assert_eq!(host_of("not a url"), "not a url");
/// ```
pub fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| url.to_string())
}
