//! Mapping provider interface and transformation graph
//!
//! A transformation graph describes how one schema instance is computed from
//! another. The correlation analyzer walks these graphs; materialization runs
//! them over a concrete record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use resq_ast::Value;

mod eval;
mod provider;

pub use provider::{ExprMapping, TypeMap};

/// Schema instance keyed by field name
pub type Record = HashMap<String, Value>;

#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("No mapping from {from} to {to}")]
    NoMapping { from: String, to: String },

    #[error("Unsupported construct in mapping: {0}")]
    Unsupported(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

/// External mapping engine, shared read-only across translations
pub trait MappingProvider: Send + Sync {
    /// Graph computing a `resource` instance from an `entity` instance
    fn transformation(&self, resource: &str, entity: &str) -> Option<&MapExpr>;

    /// Compute the `entity` instance corresponding to a `resource` instance
    fn materialize(&self, resource: &str, entity: &str, instance: &Record)
        -> Result<Record, MappingError>;
}

/// Field of a named schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub schema: String,
    pub field: String,
}

impl FieldRef {
    pub fn new(schema: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            field: field.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic (Add concatenates when either side is text)
    Add,
    Sub,
    Mul,
    Div,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    Coalesce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    /// Type conversion wrapper, value-preserving for evaluation
    Convert,
}

/// Transformation graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MapExpr {
    Block {
        statements: Vec<MapExpr>,
    },
    Assign {
        target: FieldRef,
        value: Box<MapExpr>,
    },
    Field {
        field: FieldRef,
    },
    Constant {
        value: Value,
    },
    Parameter {
        name: String,
    },
    Conditional {
        test: Box<MapExpr>,
        if_true: Box<MapExpr>,
        if_false: Box<MapExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<MapExpr>,
        right: Box<MapExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<MapExpr>,
    },
    Call {
        method: String,
        #[serde(default)]
        args: Vec<MapExpr>,
    },
    Construct {
        schema: String,
        #[serde(default)]
        members: Vec<MapExpr>,
    },
    Lambda {
        #[serde(default)]
        params: Vec<String>,
        body: Box<MapExpr>,
    },
}

impl MapExpr {
    pub fn block(statements: Vec<MapExpr>) -> Self {
        MapExpr::Block { statements }
    }

    pub fn assign(schema: &str, field: &str, value: MapExpr) -> Self {
        MapExpr::Assign {
            target: FieldRef::new(schema, field),
            value: Box::new(value),
        }
    }

    pub fn field(schema: &str, field: &str) -> Self {
        MapExpr::Field {
            field: FieldRef::new(schema, field),
        }
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        MapExpr::Constant {
            value: value.into(),
        }
    }

    pub fn binary(op: BinaryOp, left: MapExpr, right: MapExpr) -> Self {
        MapExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: MapExpr) -> Self {
        MapExpr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn call(method: &str, args: Vec<MapExpr>) -> Self {
        MapExpr::Call {
            method: method.to_string(),
            args,
        }
    }

    pub fn conditional(test: MapExpr, if_true: MapExpr, if_false: MapExpr) -> Self {
        MapExpr::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    /// The field read by a plain (possibly converted) field access
    pub fn direct_field(&self) -> Option<&FieldRef> {
        match self {
            MapExpr::Field { field } => Some(field),
            MapExpr::Unary {
                op: UnaryOp::Convert,
                operand,
            } => operand.direct_field(),
            _ => None,
        }
    }

    /// Operand sub-expressions, in evaluation order
    pub fn children(&self) -> Vec<&MapExpr> {
        match self {
            MapExpr::Block { statements } => statements.iter().collect(),
            MapExpr::Assign { value, .. } => vec![&**value],
            MapExpr::Field { .. } | MapExpr::Constant { .. } | MapExpr::Parameter { .. } => vec![],
            MapExpr::Conditional {
                test,
                if_true,
                if_false,
            } => vec![&**test, &**if_true, &**if_false],
            MapExpr::Binary { left, right, .. } => vec![&**left, &**right],
            MapExpr::Unary { operand, .. } => vec![&**operand],
            MapExpr::Call { args, .. } => args.iter().collect(),
            MapExpr::Construct { members, .. } => members.iter().collect(),
            MapExpr::Lambda { body, .. } => vec![&**body],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_field_sees_through_conversions() {
        let plain = MapExpr::field("UserEntity", "Id");
        let converted = MapExpr::unary(UnaryOp::Convert, plain.clone());
        let computed = MapExpr::call("upper", vec![plain.clone()]);

        assert_eq!(plain.direct_field(), Some(&FieldRef::new("UserEntity", "Id")));
        assert_eq!(converted.direct_field(), Some(&FieldRef::new("UserEntity", "Id")));
        assert_eq!(computed.direct_field(), None);
    }

    #[test]
    fn test_graph_from_yaml() {
        let yaml = r#"
type: Block
statements:
  - type: Assign
    target: { schema: UserResource, field: Name }
    value:
      type: Binary
      op: Add
      left: { type: Field, field: { schema: UserEntity, field: First } }
      right: { type: Field, field: { schema: UserEntity, field: Last } }
"#;
        let graph: MapExpr = serde_yaml::from_str(yaml).unwrap();
        let MapExpr::Block { statements } = &graph else {
            panic!("expected a block");
        };
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].children()[0].children().len(), 2);
    }
}
