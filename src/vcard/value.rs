//! Property values and the arena that owns them.
//!
//! Values refer to their children by [`NodeId`] rather than by box, so a
//! [`ValueGraph`] can describe shared and even cyclic structures. The parser
//! only ever builds trees; consumers that walk a graph must still guard
//! against cycles (see [`crate::stringify`]).

use chrono::NaiveDate;
use std::fmt;

/// Stable index of a node inside a [`ValueGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of a property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Text, already unescaped.
    Scalar(String),
    /// A value with calendar-date semantics.
    Date(NaiveDate),
    /// Inline binary payload.
    Binary(Vec<u8>),
    /// Repeated or structured components.
    Sequence(Vec<NodeId>),
    /// A property instance wrapping its inner value.
    Wrapped(NodeId),
}

/// Arena of [`PropertyValue`] nodes for one card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueGraph {
    nodes: Vec<PropertyValue>,
}

impl ValueGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: PropertyValue) -> NodeId {
        self.nodes.push(value);
        NodeId(self.nodes.len() - 1)
    }

    pub fn scalar(&mut self, text: impl Into<String>) -> NodeId {
        self.push(PropertyValue::Scalar(text.into()))
    }

    pub fn sequence(&mut self, items: Vec<NodeId>) -> NodeId {
        self.push(PropertyValue::Sequence(items))
    }

    pub fn wrap(&mut self, inner: NodeId) -> NodeId {
        self.push(PropertyValue::Wrapped(inner))
    }

    pub fn get(&self, id: NodeId) -> Option<&PropertyValue> {
        self.nodes.get(id.0)
    }

    /// Overwrites an existing node, returning the old value.
    ///
    /// Returns `None` and leaves the graph untouched when `id` is not a node
    /// of this graph. This is the only way to close a cycle.
    pub fn replace(&mut self, id: NodeId, value: PropertyValue) -> Option<PropertyValue> {
        self.nodes
            .get_mut(id.0)
            .map(|slot| std::mem::replace(slot, value))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
