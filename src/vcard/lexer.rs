//! Line unfolding and content-line splitting (RFC 6350 §3.2).

use super::card::Parameter;
use super::error::{ParseError, ParseErrorKind, ParseResult};

/// Unfolds a document: a line break followed by a single space or tab is a
/// continuation and is removed together with that whitespace character.
/// Accepts CRLF and bare LF.
pub fn unfold(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let is_break = match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                true
            }
            '\n' => true,
            _ => false,
        };

        if !is_break {
            result.push(c);
        } else if matches!(chars.peek(), Some(' ' | '\t')) {
            chars.next();
        } else {
            result.push('\n');
        }
    }

    result
}

/// A content line split into its parts, before value interpretation.
#[derive(Debug, Clone)]
pub struct ContentLine {
    pub group: Option<String>,
    /// Property name, uppercase.
    pub name: String,
    /// Parameters, or the reason the parameter list could not be read.
    pub params: ParseResult<Vec<Parameter>>,
    /// Raw value text after the first unquoted colon.
    pub value: String,
}

/// Splits `[group.]name[;param]*:value`.
///
/// Bare parameters without `=` (vCard 2.1 `TEL;HOME;VOICE:`) are read as
/// `TYPE` values.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let (colon, unterminated_quote) = find_value_separator(line).ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::MissingSeparator,
            line_num,
            format!("no ':' in {:?}", truncate(line, 40)),
        )
    })?;

    let (head, value) = (&line[..colon], &line[colon + 1..]);
    let (name_part, params_part) = match head.find(';') {
        Some(semi) => (&head[..semi], Some(&head[semi + 1..])),
        None => (head, None),
    };
    let (group, name) = split_group(name_part);

    if name.is_empty() || !name.chars().all(is_name_char) {
        return Err(ParseError::new(
            ParseErrorKind::InvalidPropertyName,
            line_num,
            format!("invalid property name: {name:?}"),
        ));
    }

    let params = match params_part {
        Some(_) if unterminated_quote => Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            "unterminated quote in parameters",
        )),
        Some(s) => parse_parameters(s, line_num),
        None => Ok(Vec::new()),
    };

    Ok(ContentLine {
        group: group.map(String::from),
        name: name.to_ascii_uppercase(),
        params,
        value: value.to_string(),
    })
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// Index of the first colon outside a quoted parameter value.
///
/// A quote that is never closed would hide every colon after it; in that
/// case the first colon is used and the flag is set.
fn find_value_separator(line: &str) -> Option<(usize, bool)> {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => return Some((i, false)),
            _ => {}
        }
    }
    if in_quotes {
        line.find(':').map(|i| (i, true))
    } else {
        None
    }
}

fn split_group(s: &str) -> (Option<&str>, &str) {
    match s.find('.') {
        Some(dot) if dot > 0 && s[..dot].chars().all(is_name_char) => {
            (Some(&s[..dot]), &s[dot + 1..])
        }
        _ => (None, s),
    }
}

/// Splits `s` on `sep` wherever `sep` is not inside double quotes.
fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_parameters(s: &str, line_num: usize) -> ParseResult<Vec<Parameter>> {
    let mut params = Vec::new();

    for segment in split_unquoted(s, ';') {
        if segment.is_empty() {
            continue;
        }

        let (name, raw_values) = match segment.find('=') {
            Some(eq) => (&segment[..eq], &segment[eq + 1..]),
            None => ("TYPE", segment),
        };

        if name.is_empty() || !name.chars().all(is_name_char) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidParameter,
                line_num,
                format!("invalid parameter name: {name:?}"),
            ));
        }

        let values = split_unquoted(raw_values, ',')
            .into_iter()
            .map(decode_param_value)
            .collect();
        params.push(Parameter::new(name, values));
    }

    Ok(params)
}

/// Strips surrounding quotes and applies RFC 6868 caret escapes.
fn decode_param_value(raw: &str) -> String {
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    let mut out = String::with_capacity(unquoted.len());
    let mut chars = unquoted.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '^' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('\'') => {
                chars.next();
                out.push('"');
            }
            Some('^') => {
                chars.next();
                out.push('^');
            }
            _ => out.push('^'),
        }
    }
    out
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
