//! RESQ query AST
//!
//! Tagged query tree shared by resource-side input and entity-side output.
//! Trees are immutable once built: translation always constructs new nodes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub mod decimal;
pub mod duration;
mod value;

pub use decimal::{Decimal, DecimalError};
pub use value::*;

/// Operation tag of a [`QueryNode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    // Logical
    And,
    Or,
    Values,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Pattern
    Like,
    Contains,
    Excludes,
    In,
    Out,
    // Shape
    Select,
    Sort,
    SortProperty,
    Property,
    Limit,
    Distinct,
    First,
    One,
    Count,
    Aggregate,
    Min,
    Max,
    Mean,
    Sum,
    Noop,
}

impl Op {
    pub fn is_logical(self) -> bool {
        matches!(self, Op::And | Op::Or | Op::Values)
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge)
    }

    pub fn is_pattern(self) -> bool {
        matches!(self, Op::Like | Op::Contains | Op::Excludes | Op::In | Op::Out)
    }

    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            Op::Count | Op::Aggregate | Op::Min | Op::Max | Op::Mean | Op::Sum
        )
    }
}

/// Sort direction carried by SORTPROPERTY nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A single child of a [`QueryNode`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arg {
    Node(QueryNode),
    Literal(Literal),
    Direction(SortDirection),
}

impl Arg {
    pub fn as_node(&self) -> Option<&QueryNode> {
        match self {
            Arg::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Arg::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}

impl From<QueryNode> for Arg {
    fn from(node: QueryNode) -> Self {
        Arg::Node(node)
    }
}

impl From<Literal> for Arg {
    fn from(literal: Literal) -> Self {
        Arg::Literal(literal)
    }
}

impl From<SortDirection> for Arg {
    fn from(direction: SortDirection) -> Self {
        Arg::Direction(direction)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("{op:?} expects {expected}, got {actual} argument(s)")]
    Arity {
        op: Op,
        expected: &'static str,
        actual: usize,
    },

    #[error("{op:?} argument {index} must be {expected}")]
    Argument {
        op: Op,
        index: usize,
        expected: &'static str,
    },
}

/// Query tree node: an operation tag plus ordered children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryNode {
    pub op: Op,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Arg>,
}

impl QueryNode {
    pub fn new(op: Op, args: Vec<Arg>) -> Self {
        Self { op, args }
    }

    pub fn noop() -> Self {
        Self::new(Op::Noop, vec![])
    }

    /// PROPERTY node for a single field name
    pub fn property(name: impl Into<String>) -> Self {
        Self::new(
            Op::Property,
            vec![Arg::Literal(Literal::Typed(Value::String(name.into())))],
        )
    }

    /// PROPERTY node for a dotted path, nesting one PROPERTY per segment
    pub fn property_path<S: AsRef<str>>(segments: &[S]) -> Option<Self> {
        let (last, rest) = segments.split_last()?;
        let mut node = Self::property(last.as_ref());
        for segment in rest.iter().rev() {
            let mut parent = Self::property(segment.as_ref());
            parent.args.push(Arg::Node(node));
            node = parent;
        }
        Some(node)
    }

    /// Binary node of the form `op(property(field), literal)`
    pub fn compare(op: Op, field: impl Into<String>, literal: Literal) -> Self {
        Self::new(
            op,
            vec![Arg::Node(Self::property(field)), Arg::Literal(literal)],
        )
    }

    pub fn and(children: Vec<QueryNode>) -> Self {
        Self::new(Op::And, children.into_iter().map(Arg::Node).collect())
    }

    pub fn or(children: Vec<QueryNode>) -> Self {
        Self::new(Op::Or, children.into_iter().map(Arg::Node).collect())
    }

    pub fn select<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            Op::Select,
            fields
                .into_iter()
                .map(|f| Arg::Node(Self::property(f)))
                .collect(),
        )
    }

    pub fn sort_property(direction: SortDirection, field: impl Into<String>) -> Self {
        Self::new(
            Op::SortProperty,
            vec![Arg::Direction(direction), Arg::Node(Self::property(field))],
        )
    }

    pub fn sort(items: Vec<QueryNode>) -> Self {
        Self::new(Op::Sort, items.into_iter().map(Arg::Node).collect())
    }

    pub fn limit(count: u64) -> Self {
        Self::new(
            Op::Limit,
            vec![Arg::Literal(Literal::Typed(Value::U64(count)))],
        )
    }

    /// Child nodes, skipping literals and direction tags
    pub fn nodes(&self) -> impl Iterator<Item = &QueryNode> {
        self.args.iter().filter_map(Arg::as_node)
    }

    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.args.iter().filter_map(Arg::as_literal)
    }

    /// Field name of a PROPERTY node
    pub fn property_name(&self) -> Option<&str> {
        if self.op != Op::Property {
            return None;
        }
        self.args.first()?.as_literal()?.as_str()
    }

    /// Nested sub-path of a PROPERTY node
    pub fn sub_path(&self) -> Option<&QueryNode> {
        if self.op != Op::Property {
            return None;
        }
        self.args.get(1)?.as_node()
    }

    /// Full dotted path of a PROPERTY chain
    pub fn property_segments(&self) -> Vec<&str> {
        let mut segments = Vec::new();
        let mut current = Some(self);
        while let Some(node) = current {
            match node.property_name() {
                Some(name) => segments.push(name),
                None => break,
            }
            current = node.sub_path();
        }
        segments
    }

    pub fn depth(&self) -> usize {
        1 + self.nodes().map(QueryNode::depth).max().unwrap_or(0)
    }

    /// Calculate fingerprint (SHA-256) for deterministic caching
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("query tree should always serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Check the fixed per-tag argument shape, recursively
    pub fn validate_shape(&self) -> Result<(), ShapeError> {
        let arity = |expected: &'static str, ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(ShapeError::Arity {
                    op: self.op,
                    expected,
                    actual: self.args.len(),
                })
            }
        };
        let argument = |index: usize, expected: &'static str| ShapeError::Argument {
            op: self.op,
            index,
            expected,
        };
        let is_property = |arg: &Arg| matches!(arg, Arg::Node(n) if n.op == Op::Property);

        match self.op {
            Op::And | Op::Or | Op::Sort | Op::Select => {
                for (index, arg) in self.args.iter().enumerate() {
                    match (self.op, arg) {
                        (Op::Sort, Arg::Node(n)) if n.op == Op::SortProperty => {}
                        (Op::Sort, _) => return Err(argument(index, "a SORTPROPERTY node")),
                        (Op::Select, arg) if is_property(arg) => {}
                        (Op::Select, _) => return Err(argument(index, "a PROPERTY node")),
                        (_, Arg::Node(_)) => {}
                        _ => return Err(argument(index, "a node")),
                    }
                }
            }
            Op::Values => {
                if let Some(index) = self.args.iter().position(|a| matches!(a, Arg::Direction(_))) {
                    return Err(argument(index, "a node or literal"));
                }
            }
            op if op.is_comparison() => {
                arity("2", self.args.len() == 2)?;
                if !is_property(&self.args[0]) {
                    return Err(argument(0, "a PROPERTY node"));
                }
                if self.args[1].as_literal().is_none() {
                    return Err(argument(1, "a literal"));
                }
            }
            op if op.is_pattern() => {
                arity("at least 2", self.args.len() >= 2)?;
                if !is_property(&self.args[0]) {
                    return Err(argument(0, "a PROPERTY node"));
                }
                if let Some(index) = self.args.iter().skip(1).position(|a| a.as_literal().is_none()) {
                    return Err(argument(index + 1, "a literal"));
                }
            }
            Op::SortProperty => {
                arity("2", self.args.len() == 2)?;
                if !matches!(self.args[0], Arg::Direction(_)) {
                    return Err(argument(0, "a sort direction"));
                }
                if !is_property(&self.args[1]) {
                    return Err(argument(1, "a PROPERTY node"));
                }
            }
            Op::Property => {
                arity("1 or 2", matches!(self.args.len(), 1 | 2))?;
                if self.property_name().is_none() {
                    return Err(argument(0, "a field name"));
                }
                if self.args.len() == 2 && !is_property(&self.args[1]) {
                    return Err(argument(1, "a PROPERTY node"));
                }
            }
            Op::Limit => {
                arity("1 or 2", matches!(self.args.len(), 1 | 2))?;
                if let Some(index) = self.args.iter().position(|a| a.as_literal().is_none()) {
                    return Err(argument(index, "a literal"));
                }
            }
            Op::Distinct | Op::First | Op::One | Op::Noop => {
                arity("0", self.args.is_empty())?;
            }
            _ => {}
        }

        for node in self.nodes() {
            node.validate_shape()?;
        }
        Ok(())
    }
}
