//! Parsed cards, properties and parameters.

use super::error::{ParseError, ParseResult};
use super::value::{NodeId, ValueGraph};

/// A property parameter such as `TYPE=home,voice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name, uppercase.
    pub name: String,
    pub values: Vec<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values,
        }
    }

    /// First value, if any.
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// One property instance on a card.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Group prefix (`item1` in `item1.TEL`).
    pub group: Option<String>,
    /// Property name, uppercase.
    pub name: String,
    pub params: Vec<Parameter>,
    /// The wrapped value node, or the reason it could not be built.
    pub value: ParseResult<NodeId>,
    /// Logical line the property was read from.
    pub line: usize,
}

impl Property {
    pub fn param(&self, name: &str) -> Option<&Parameter> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// One `BEGIN:VCARD` ... `END:VCARD` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Logical line of the `BEGIN:VCARD`.
    pub line: usize,
    pub values: ValueGraph,
    pub properties: Vec<Property>,
    /// Card-level faults: skipped lines and a missing `END:VCARD`.
    pub faults: Vec<ParseError>,
}

impl Card {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            values: ValueGraph::new(),
            properties: Vec::new(),
            faults: Vec::new(),
        }
    }

    /// All occurrences of a property, in file order. Names compare
    /// case-insensitively.
    pub fn properties_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties_named(name).next().is_some()
    }
}
