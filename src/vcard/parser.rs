//! vCard document parser.

use super::card::{Card, Parameter, Property};
use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{parse_content_line, unfold, ContentLine};
use super::value::{NodeId, PropertyValue, ValueGraph};
use super::values::{
    data_uri_payload, decode_base64, parse_date, split_component, split_structured, unescape_text,
};

/// Parses a document into its cards, in file order.
///
/// Parsing never fails as a whole. Lines that cannot be read are recorded
/// on the enclosing [`Card::faults`]; properties whose value cannot be built
/// carry an `Err` value. Content outside `BEGIN:VCARD`/`END:VCARD` is ignored.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> Vec<Card> {
    let unfolded = unfold(input);
    let mut cards = Vec::new();
    let mut open: Option<Card> = None;

    for (idx, raw) in unfolded.lines().enumerate() {
        let line_num = idx + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if is_marker(line, "BEGIN") {
            if let Some(card) = open.take() {
                cards.push(close_unterminated(card));
            }
            open = Some(Card::new(line_num));
            continue;
        }

        if is_marker(line, "END") {
            if let Some(card) = open.take() {
                cards.push(card);
            }
            continue;
        }

        let Some(card) = open.as_mut() else {
            continue;
        };

        match parse_content_line(line, line_num) {
            Ok(content) => {
                let property = build_property(&mut card.values, content, line_num);
                card.properties.push(property);
            }
            Err(e) => {
                tracing::warn!(card_line = card.line, error = %e, "skipping unreadable line");
                card.faults.push(e);
            }
        }
    }

    if let Some(card) = open.take() {
        cards.push(close_unterminated(card));
    }

    tracing::debug!(count = cards.len(), "parsed cards");
    cards
}

fn is_marker(line: &str, keyword: &str) -> bool {
    line.split_once(':').is_some_and(|(name, value)| {
        name.trim().eq_ignore_ascii_case(keyword) && value.trim().eq_ignore_ascii_case("VCARD")
    })
}

fn close_unterminated(mut card: Card) -> Card {
    tracing::warn!(card_line = card.line, "card has no END:VCARD");
    card.faults.push(ParseError::new(
        ParseErrorKind::UnterminatedCard,
        card.line,
        "card not closed with END:VCARD",
    ));
    card
}

fn build_property(graph: &mut ValueGraph, line: ContentLine, line_num: usize) -> Property {
    let (params, value) = match line.params {
        Ok(params) => {
            let value = build_value(graph, &line.name, &params, &line.value, line_num)
                .map(|inner| graph.wrap(inner));
            (params, value)
        }
        Err(e) => (Vec::new(), Err(e)),
    };

    Property {
        group: line.group,
        name: line.name,
        params,
        value,
        line: line_num,
    }
}

fn param_value<'a>(params: &'a [Parameter], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .and_then(Parameter::value)
}

fn build_value(
    graph: &mut ValueGraph,
    name: &str,
    params: &[Parameter],
    raw: &str,
    line_num: usize,
) -> ParseResult<NodeId> {
    if let Some(encoding) = param_value(params, "ENCODING") {
        match encoding.to_ascii_lowercase().as_str() {
            "b" | "base64" => {
                let bytes = decode_base64(raw).ok_or_else(|| {
                    ParseError::encoding(line_num, format!("{name}: invalid base64 payload"))
                })?;
                return Ok(graph.push(PropertyValue::Binary(bytes)));
            }
            "7bit" | "8bit" => {}
            other => {
                return Err(ParseError::encoding(
                    line_num,
                    format!("{name}: unsupported encoding {other:?}"),
                ));
            }
        }
    }

    let value_type = param_value(params, "VALUE").map(str::to_ascii_lowercase);

    match name {
        "N" | "ADR" | "ORG" | "CLIENTPIDMAP" => Ok(structured(graph, raw)),
        "NICKNAME" | "CATEGORIES" => {
            let items = split_component(raw)
                .into_iter()
                .map(|part| graph.scalar(part))
                .collect();
            Ok(graph.sequence(items))
        }
        "BDAY" | "ANNIVERSARY" => {
            let date = match value_type.as_deref() {
                Some("text") => None,
                _ => parse_date(raw),
            };
            Ok(match date {
                Some(date) => graph.push(PropertyValue::Date(date)),
                None => graph.scalar(unescape_text(raw)),
            })
        }
        "PHOTO" | "LOGO" | "SOUND" | "KEY" => match data_uri_payload(raw) {
            Some(payload) => {
                let bytes = decode_base64(payload).ok_or_else(|| {
                    ParseError::encoding(line_num, format!("{name}: invalid data URI payload"))
                })?;
                Ok(graph.push(PropertyValue::Binary(bytes)))
            }
            None => Ok(graph.scalar(raw)),
        },
        "URL" | "MEMBER" | "IMPP" | "FBURL" | "CALADRURI" | "CALURI" | "SOURCE" => {
            Ok(graph.scalar(raw))
        }
        _ => Ok(graph.scalar(unescape_text(raw))),
    }
}

/// `a;b,c;d` becomes `Sequence[a, Sequence[b, c], d]`.
fn structured(graph: &mut ValueGraph, raw: &str) -> NodeId {
    let components = split_structured(raw)
        .into_iter()
        .map(|component| {
            let mut parts = split_component(component);
            if parts.len() > 1 {
                let items = parts.into_iter().map(|p| graph.scalar(p)).collect();
                graph.sequence(items)
            } else {
                graph.scalar(parts.pop().unwrap_or_default())
            }
        })
        .collect();
    graph.sequence(components)
}
