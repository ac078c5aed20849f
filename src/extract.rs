//! Reading named properties off a card.
//!
//! Extraction normalizes the number of occurrences and peels exactly one
//! [`PropertyValue::Wrapped`] layer off each; rendering what is inside is
//! the job of [`crate::stringify`]. A malformed property is an
//! [`ExtractError`], never a panic, and the import treats it as absent.

use crate::vcard::{Card, NodeId, ParseError, PropertyValue};

/// Occurrences of one property on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Absent,
    Single(NodeId),
    /// Two or more occurrences, in file order.
    Many(Vec<NodeId>),
}

impl Extracted {
    /// First occurrence, dropping the rest.
    pub fn first(&self) -> Option<NodeId> {
        match self {
            Extracted::Absent => None,
            Extracted::Single(id) => Some(*id),
            Extracted::Many(ids) => ids.first().copied(),
        }
    }

    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Extracted::Absent => &[],
            Extracted::Single(id) => std::slice::from_ref(id),
            Extracted::Many(ids) => ids,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Extracted::Absent)
    }
}

/// A property that is present but cannot be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("property {property} is malformed: {source}")]
    Malformed {
        property: String,
        #[source]
        source: ParseError,
    },
    #[error("property {property} refers to missing value {node}")]
    DanglingValue { property: String, node: NodeId },
}

/// Reads every occurrence of `name` (case-insensitive).
///
/// Fails if any occurrence is malformed; a partial list would silently
/// change which value is "first".
pub fn extract(card: &Card, name: &str) -> Result<Extracted, ExtractError> {
    let mut nodes = Vec::new();

    for property in card.properties_named(name) {
        let wrapper = property
            .value
            .as_ref()
            .map_err(|e| ExtractError::Malformed {
                property: property.name.clone(),
                source: e.clone(),
            })?;

        let node = match card.values.get(*wrapper) {
            Some(PropertyValue::Wrapped(inner)) => *inner,
            Some(_) => *wrapper,
            None => {
                return Err(ExtractError::DanglingValue {
                    property: property.name.clone(),
                    node: *wrapper,
                })
            }
        };
        nodes.push(node);
    }

    Ok(match nodes.len() {
        0 => Extracted::Absent,
        1 => Extracted::Single(nodes[0]),
        _ => Extracted::Many(nodes),
    })
}

/// [`extract`], logging a fault and reporting it as [`Extracted::Absent`].
pub fn extract_or_absent(card: &Card, name: &str) -> Extracted {
    extract_or_else(card, name, drop)
}

/// Like [`extract_or_absent`], handing the logged fault to `on_fault`.
pub fn extract_or_else(
    card: &Card,
    name: &str,
    on_fault: impl FnOnce(ExtractError),
) -> Extracted {
    extract(card, name).unwrap_or_else(|e| {
        tracing::warn!(card_line = card.line, error = %e, "treating property as absent");
        on_fault(e);
        Extracted::Absent
    })
}
