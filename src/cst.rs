//! Concrete syntax tree for tooling.
//!
//! [`parse_cst`](crate::parse_cst) runs the same reader as
//! [`parse`](crate::parse) but keeps every node's byte span, the verbatim
//! text of each literal, and whether a map or set was written with its
//! `Map{` / `Set{` keyword. Formatters and linters use it to reprint a
//! document without re-deriving literal spellings.
//!
//! ```rust
//! use rdn::{parse_cst, CstKind};
//!
//! let err = parse_cst("Set{0x\"ff\"}").unwrap_err();
//! assert!(err.is_syntax());
//!
//! let cst = parse_cst("[1.50, x\"ff\"]").unwrap();
//! assert_eq!((cst.start, cst.end), (0, 13));
//! if let CstKind::Array(items) = &cst.kind {
//!     assert_eq!(items[0].raw.as_deref(), Some("1.50"));
//!     assert_eq!(items[1].raw.as_deref(), Some("x\"ff\""));
//! }
//! ```

use crate::de::Builder;
use crate::{Object, Value};
use std::ops::Range;

/// A node of the concrete syntax tree.
#[derive(Clone, Debug, PartialEq)]
pub struct CstNode {
    pub kind: CstKind,
    /// Byte offset of the node's first character.
    pub start: usize,
    /// Byte offset just past the node's last character.
    pub end: usize,
    /// Source text of a literal node; `None` for containers.
    pub raw: Option<String>,
}

/// What a [`CstNode`] holds.
#[derive(Clone, Debug, PartialEq)]
pub enum CstKind {
    /// Any scalar: null, bool, number, bigint, string, date, time,
    /// duration, regexp or binary.
    Literal(Value),
    Array(Vec<CstNode>),
    Tuple(Vec<CstNode>),
    /// Members in source order; keys are string literals.
    Object(Vec<(CstNode, CstNode)>),
    Map {
        entries: Vec<(CstNode, CstNode)>,
        explicit: bool,
    },
    Set {
        items: Vec<CstNode>,
        explicit: bool,
    },
}

impl CstNode {
    fn container(kind: CstKind, span: Range<usize>) -> Self {
        CstNode {
            kind,
            start: span.start,
            end: span.end,
            raw: None,
        }
    }

    /// Source text covered by this node.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let src = "{\"a\" => 1}";
    /// let cst = rdn::parse_cst(src).unwrap();
    /// assert_eq!(cst.text(src), Some(src));
    /// ```
    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start..self.end)
    }

    /// Drops spans and raw text, producing the value [`parse`](crate::parse)
    /// would have returned.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match &self.kind {
            CstKind::Literal(value) => value.clone(),
            CstKind::Array(items) => Value::Array(items.iter().map(CstNode::to_value).collect()),
            CstKind::Tuple(items) => Value::Tuple(items.iter().map(CstNode::to_value).collect()),
            CstKind::Object(members) => {
                let mut object = Object::with_capacity(members.len());
                for (key, value) in members {
                    if let CstKind::Literal(Value::String(key)) = &key.kind {
                        object.insert(key.clone(), value.to_value());
                    }
                }
                Value::Object(object)
            }
            CstKind::Map { entries, .. } => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_value(), v.to_value()))
                    .collect(),
            ),
            CstKind::Set { items, .. } => Value::Set(items.iter().map(CstNode::to_value).collect()),
        }
    }
}

pub(crate) struct CstBuilder;

impl Builder for CstBuilder {
    type Node = CstNode;

    fn literal(value: Value, raw: &str, span: Range<usize>) -> CstNode {
        CstNode {
            kind: CstKind::Literal(value),
            start: span.start,
            end: span.end,
            raw: Some(raw.to_string()),
        }
    }

    fn is_string(node: &CstNode) -> bool {
        matches!(node.kind, CstKind::Literal(Value::String(_)))
    }

    fn array(items: Vec<CstNode>, span: Range<usize>) -> CstNode {
        CstNode::container(CstKind::Array(items), span)
    }

    fn tuple(items: Vec<CstNode>, span: Range<usize>) -> CstNode {
        CstNode::container(CstKind::Tuple(items), span)
    }

    fn object(members: Vec<(CstNode, CstNode)>, span: Range<usize>) -> CstNode {
        CstNode::container(CstKind::Object(members), span)
    }

    fn map(entries: Vec<(CstNode, CstNode)>, explicit: bool, span: Range<usize>) -> CstNode {
        CstNode::container(CstKind::Map { entries, explicit }, span)
    }

    fn set(items: Vec<CstNode>, explicit: bool, span: Range<usize>) -> CstNode {
        CstNode::container(CstKind::Set { items, explicit }, span)
    }
}

#[cfg(test)]
mod tests {
    use crate::{parse_cst, CstKind};

    #[test]
    fn test_object_keys_keep_spans() {
        let cst = parse_cst("{ \"k\" : true }").unwrap();
        match &cst.kind {
            CstKind::Object(members) => {
                let (key, value) = &members[0];
                assert_eq!((key.start, key.end), (2, 5));
                assert_eq!(key.raw.as_deref(), Some("\"k\""));
                assert_eq!((value.start, value.end), (8, 12));
            }
            other => panic!("expected object, got {:?}", other),
        }
        assert_eq!((cst.start, cst.end), (0, 14));
        assert!(cst.raw.is_none());
    }
}
