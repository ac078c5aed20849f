//! Collapsing property values into display text.
//!
//! [`stringify`] turns any node of a [`ValueGraph`] into one flat string and
//! never fails: sequences are joined with `", "`, wrappers are unwrapped, and
//! anything that cannot be rendered is replaced by a marker.
//!
//! | Situation | Output |
//! |-----------|--------|
//! | node reached again through its own descendants | `[RECURSION]` |
//! | dangling [`NodeId`] or nesting deeper than [`MAX_DEPTH`] | `[UNSTRINGIFIABLE]` |
//! | more than [`MAX_WORK`] units of rendering in one [`Stringifier`] | `[UNSTRINGIFIABLE]` |
//!
//! Cycle detection is by path: a node shared by two siblings is rendered
//! twice, which is not a cycle. Repeated sharing can still multiply the
//! output at every level, so each [`Stringifier`] carries a work budget
//! (one unit per visited node plus one per byte produced). A render that
//! runs out of budget returns the marker alone.
//!
//! [`stringify`] and [`stringify_all`] are the one-shot forms for callers
//! that do not need the fault list.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashSet;
use std::fmt;

use crate::vcard::{NodeId, PropertyValue, ValueGraph};

pub const RECURSION_MARKER: &str = "[RECURSION]";
pub const UNSTRINGIFIABLE_MARKER: &str = "[UNSTRINGIFIABLE]";
pub const SEQUENCE_SEPARATOR: &str = ", ";

/// Nesting bound. Parsed cards stay below 5 levels.
pub const MAX_DEPTH: usize = 256;

/// Work budget of one [`Stringifier`]: visited nodes plus bytes produced.
pub const MAX_WORK: usize = 1 << 20;

/// Why a marker was substituted for part of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringifyFault {
    Cycle(NodeId),
    Dangling(NodeId),
    TooDeep(NodeId),
    /// Rendering ran out of budget while visiting this node.
    TooLarge(NodeId),
}

impl fmt::Display for StringifyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle(id) => write!(f, "value {id} refers back to itself"),
            Self::Dangling(id) => write!(f, "value {id} does not exist"),
            Self::TooDeep(id) => write!(f, "value {id} is nested deeper than {MAX_DEPTH}"),
            Self::TooLarge(id) => write!(f, "value {id} expands beyond {MAX_WORK} units"),
        }
    }
}

/// Renders `node` as flat text.
pub fn stringify(graph: &ValueGraph, node: NodeId) -> String {
    Stringifier::new(graph).render(node)
}

/// Renders `nodes` separately and joins them with `", "`.
pub fn stringify_all(graph: &ValueGraph, nodes: &[NodeId]) -> String {
    let mut stringifier = Stringifier::new(graph);
    stringifier.render_all(nodes)
}

/// Stateful renderer that also keeps the faults it papered over.
pub struct Stringifier<'g> {
    graph: &'g ValueGraph,
    on_stack: HashSet<NodeId>,
    faults: Vec<StringifyFault>,
    spent: usize,
    cut_off: bool,
}

impl<'g> Stringifier<'g> {
    pub fn new(graph: &'g ValueGraph) -> Self {
        Self {
            graph,
            on_stack: HashSet::new(),
            faults: Vec::new(),
            spent: 0,
            cut_off: false,
        }
    }

    pub fn render(&mut self, node: NodeId) -> String {
        let text = self.visit(node, 0);
        self.within_budget(text)
    }

    pub fn render_all(&mut self, nodes: &[NodeId]) -> String {
        let text = nodes
            .iter()
            .map(|&node| self.visit(node, 0))
            .collect::<Vec<_>>()
            .join(SEQUENCE_SEPARATOR);
        self.within_budget(text)
    }

    fn exhausted(&self) -> bool {
        self.spent >= MAX_WORK
    }

    fn within_budget(&self, text: String) -> String {
        if self.exhausted() {
            UNSTRINGIFIABLE_MARKER.to_string()
        } else {
            text
        }
    }

    /// Faults seen so far, in the order they were hit.
    pub fn faults(&self) -> &[StringifyFault] {
        &self.faults
    }

    pub fn into_faults(self) -> Vec<StringifyFault> {
        self.faults
    }

    fn visit(&mut self, node: NodeId, depth: usize) -> String {
        if self.exhausted() {
            if !self.cut_off {
                self.cut_off = true;
                self.faults.push(StringifyFault::TooLarge(node));
            }
            return UNSTRINGIFIABLE_MARKER.to_string();
        }
        self.spent += 1;

        if self.on_stack.contains(&node) {
            self.faults.push(StringifyFault::Cycle(node));
            return RECURSION_MARKER.to_string();
        }
        if depth >= MAX_DEPTH {
            self.faults.push(StringifyFault::TooDeep(node));
            return UNSTRINGIFIABLE_MARKER.to_string();
        }

        let graph = self.graph;
        let Some(value) = graph.get(node) else {
            self.faults.push(StringifyFault::Dangling(node));
            return UNSTRINGIFIABLE_MARKER.to_string();
        };

        self.on_stack.insert(node);
        let text = match value {
            PropertyValue::Scalar(text) => text.clone(),
            PropertyValue::Date(date) => date.format("%Y-%m-%d").to_string(),
            PropertyValue::Binary(bytes) => STANDARD.encode(bytes),
            PropertyValue::Wrapped(inner) => self.visit(*inner, depth + 1),
            PropertyValue::Sequence(items) => items
                .iter()
                .map(|&item| self.visit(item, depth + 1))
                .collect::<Vec<_>>()
                .join(SEQUENCE_SEPARATOR),
        };
        self.on_stack.remove(&node);

        self.spent = self.spent.saturating_add(text.len());
        text
    }
}
