use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"(?i)<[^>]*>").expect("static pattern");
    static ref SCRIPT_SCHEME: Regex =
        Regex::new(r"(?i)(?:java|vb)script\s*:").expect("static pattern");
}

/// Zero-width and bidirectional formatting characters.
const INVISIBLE: [char; 17] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}', '\u{202A}', '\u{202B}',
    '\u{202C}', '\u{202D}', '\u{202E}', '\u{2060}', '\u{2066}', '\u{2067}', '\u{2068}',
    '\u{2069}', '\u{FEFF}', '\u{061C}',
];

/// Longest input, in characters, that is cleaned. The rest is dropped.
pub const MAX_INPUT_CHARS: usize = 2048;

/// Clean an untrusted string before validation.
///
/// Cuts the input at [`MAX_INPUT_CHARS`], then normalizes to NFC, strips
/// tags and script schemes, drops invisible and control characters (newline
/// and tab survive) and trims. Passes repeat until nothing changes, so
/// `sanitize(sanitize(x)) == sanitize(x)`. Each pass can peel only one layer
/// of a nested payload, and the cut keeps that bounded.
pub fn sanitize(input: &str) -> String {
    let bounded = match input.char_indices().nth(MAX_INPUT_CHARS) {
        Some((end, _)) => &input[..end],
        None => input,
    };

    let mut current = clean_once(bounded);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Sanitize then lowercase, for email-like fields.
pub fn sanitize_lowercase(input: &str) -> String {
    sanitize(input).to_lowercase()
}

fn clean_once(input: &str) -> String {
    let normalized: String = input.nfc().collect();
    let without_tags = HTML_TAG.replace_all(&normalized, "");
    let without_schemes = SCRIPT_SCHEME.replace_all(&without_tags, "");

    without_schemes
        .chars()
        .filter(|c| !is_unsafe(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_unsafe(c: char) -> bool {
    if c == '\n' || c == '\t' {
        return false;
    }
    c.is_control() || INVISIBLE.contains(&c)
}
