use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SEPARATOR: Regex = Regex::new(r"[^a-z0-9]+").expect("valid regex");
}

/// Tokenize text into terms: lowercase, treat every character that is not an
/// ASCII letter or digit as a separator, and drop empty pieces.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    SEPARATOR
        .split(&lowered)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
