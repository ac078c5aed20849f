//! Text-level helpers for vCard values.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::NaiveDate;

/// Standard alphabet, padding optional. Exporters disagree about padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Unescapes `\n`, `\N`, `\,`, `\;` and `\\`. Other backslashes are kept.
pub fn unescape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('n' | 'N') => {
                chars.next();
                result.push('\n');
            }
            Some(&escaped) if matches!(escaped, ',' | ';' | '\\') => {
                chars.next();
                result.push(escaped);
            }
            _ => result.push(c),
        }
    }

    result
}

/// Splits a structured value on unescaped semicolons. Components keep
/// their escapes.
pub fn split_structured(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ';' => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    parts.push(&s[start..]);
    parts
}

/// Splits a component on unescaped commas and unescapes each part.
///
/// An empty input yields no parts.
pub fn split_component(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ',' => {
                parts.push(unescape_text(&s[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }

    parts.push(unescape_text(&s[start..]));
    parts
}

/// Reads the date part of a `BDAY`/`ANNIVERSARY` value.
///
/// Accepts `YYYYMMDD` and `YYYY-MM-DD`, optionally followed by a `T` time
/// part. Truncated forms (`--0412`, `1985`) have no full date and yield `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date = raw.trim().split(['T', 't']).next()?;

    let digits: String = match date.len() {
        8 => date.to_string(),
        10 if date.as_bytes()[4] == b'-' && date.as_bytes()[7] == b'-' => date.replace('-', ""),
        _ => return None,
    };
    if !digits.bytes().all(|b| b.is_ascii_digit()) || digits.len() != 8 {
        return None;
    }

    let year = digits[0..4].parse().ok()?;
    let month = digits[4..6].parse().ok()?;
    let day = digits[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Decodes base64 text, ignoring embedded whitespace left over from folding.
pub fn decode_base64(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    LENIENT_BASE64.decode(compact.as_bytes()).ok()
}

/// Payload of a `data:<mediatype>;base64,<payload>` URI.
///
/// Returns `None` when `text` is not a base64 data URI.
pub fn data_uri_payload(text: &str) -> Option<&str> {
    let rest = text
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .map(|_| &text[5..])?;
    let (header, payload) = rest.split_once(',')?;
    header
        .to_ascii_lowercase()
        .ends_with(";base64")
        .then_some(payload)
}
