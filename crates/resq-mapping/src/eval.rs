//! Evaluator for transformation graphs over concrete records

use std::cmp::Ordering;
use std::collections::HashMap;

use resq_ast::Value;

use crate::{BinaryOp, MapExpr, MappingError, Record, UnaryOp};

const MAX_EVAL_DEPTH: usize = 256;

/// Runs a graph that reads `source` fields from `input` and assigns
/// `target` fields into a fresh output record.
pub(crate) struct Evaluator<'a> {
    source: &'a str,
    target: &'a str,
    input: &'a Record,
    output: Record,
    params: HashMap<String, Value>,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(source: &'a str, target: &'a str, input: &'a Record) -> Self {
        Self {
            source,
            target,
            input,
            output: Record::new(),
            params: HashMap::new(),
            depth: 0,
        }
    }

    pub(crate) fn run(mut self, graph: &MapExpr) -> Result<Record, MappingError> {
        self.eval(graph)?;
        Ok(self.output)
    }

    fn eval(&mut self, expr: &MapExpr) -> Result<Value, MappingError> {
        self.depth += 1;
        if self.depth > MAX_EVAL_DEPTH {
            return Err(MappingError::Evaluation(format!(
                "graph nesting exceeds {MAX_EVAL_DEPTH}"
            )));
        }
        let result = self.eval_inner(expr);
        self.depth -= 1;
        result
    }

    fn eval_inner(&mut self, expr: &MapExpr) -> Result<Value, MappingError> {
        match expr {
            MapExpr::Block { statements } => {
                for statement in statements {
                    self.eval(statement)?;
                }
                Ok(Value::Null)
            }
            MapExpr::Assign { target, value } => {
                let value = self.eval(value)?;
                if target.schema != self.target {
                    return Err(MappingError::Unsupported(format!(
                        "assignment to {}.{} while materializing {}",
                        target.schema, target.field, self.target
                    )));
                }
                self.output.insert(target.field.clone(), value.clone());
                Ok(value)
            }
            MapExpr::Field { field } => {
                let record = if field.schema == self.source {
                    self.input
                } else if field.schema == self.target {
                    &self.output
                } else {
                    return Err(MappingError::Unsupported(format!(
                        "read of {}.{}",
                        field.schema, field.field
                    )));
                };
                Ok(record.get(&field.field).cloned().unwrap_or(Value::Null))
            }
            MapExpr::Constant { value } => Ok(value.clone()),
            MapExpr::Parameter { name } => self
                .params
                .get(name)
                .cloned()
                .ok_or_else(|| MappingError::UnknownParameter(name.clone())),
            MapExpr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                if truthy(&self.eval(test)?) {
                    self.eval(if_true)
                } else {
                    self.eval(if_false)
                }
            }
            MapExpr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, left, right)
            }
            MapExpr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!truthy(&value))),
                    UnaryOp::Neg => arithmetic(BinaryOp::Sub, Value::I64(0), value),
                    UnaryOp::Convert => Ok(value),
                }
            }
            MapExpr::Call { method, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                call(method, args)
            }
            MapExpr::Construct { schema, .. } => Err(MappingError::Unsupported(format!(
                "construction of {schema}"
            ))),
            MapExpr::Lambda { .. } => Err(MappingError::Unsupported("lambda".to_string())),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        other => as_f64(other).map_or(true, |v| v != 0.0),
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::I8(v) => Some(*v as i64),
        Value::I16(v) => Some(*v as i64),
        Value::I32(v) => Some(*v as i64),
        Value::I64(v) => Some(*v),
        Value::U8(v) => Some(*v as i64),
        Value::U16(v) => Some(*v as i64),
        Value::U32(v) => Some(*v as i64),
        Value::U64(v) => i64::try_from(*v).ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::F32(v) => Some(*v as f64),
        Value::F64(v) => Some(*v),
        Value::Decimal(d) => Some(d.to_f64()),
        other => as_i64(other).map(|v| v as f64),
    }
}

/// Text form used for concatenation
fn plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Char(c) => c.to_string(),
        other => other.to_string(),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, MappingError> {
    match op {
        BinaryOp::Add if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) => {
            Ok(Value::String(plain_text(&left) + &plain_text(&right)))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            arithmetic(op, left, right)
        }
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&left, &right).ok_or_else(|| {
                MappingError::Evaluation(format!("cannot compare {left} with {right}"))
            })?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::And => Ok(Value::Bool(truthy(&left) && truthy(&right))),
        BinaryOp::Or => Ok(Value::Bool(truthy(&left) || truthy(&right))),
        BinaryOp::Coalesce => Ok(if left.is_null() { right } else { left }),
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::DateTime(l), Value::DateTime(r)) => Some(l.cmp(r)),
        (Value::DateTimeTz(l), Value::DateTimeTz(r)) => Some(l.cmp(r)),
        (Value::Duration(l), Value::Duration(r)) => Some(l.cmp(r)),
        (l, r) => as_f64(l)?.partial_cmp(&as_f64(r)?),
    }
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value, MappingError> {
    let overflow = || MappingError::Evaluation(format!("arithmetic overflow in {op:?}"));
    if let (Some(l), Some(r)) = (as_i64(&left), as_i64(&right)) {
        let result = match op {
            BinaryOp::Add => l.checked_add(r),
            BinaryOp::Sub => l.checked_sub(r),
            BinaryOp::Mul => l.checked_mul(r),
            _ if r == 0 => {
                return Err(MappingError::Evaluation("division by zero".to_string()))
            }
            _ => l.checked_div(r),
        };
        return result.map(Value::I64).ok_or_else(overflow);
    }
    match (as_f64(&left), as_f64(&right)) {
        (Some(l), Some(r)) => Ok(Value::F64(match op {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            _ => l / r,
        })),
        _ if left.is_null() || right.is_null() => Ok(Value::Null),
        _ => Err(MappingError::Evaluation(format!(
            "{op:?} is not defined for {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn call(method: &str, args: Vec<Value>) -> Result<Value, MappingError> {
    let arity = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(MappingError::Evaluation(format!(
                "{method} expects {n} argument(s), got {}",
                args.len()
            )))
        }
    };
    let text = |i: usize| plain_text(&args[i]);

    match method {
        "concat" => Ok(Value::String(args.iter().map(plain_text).collect())),
        "lower" => {
            arity(1)?;
            Ok(Value::String(text(0).to_lowercase()))
        }
        "upper" => {
            arity(1)?;
            Ok(Value::String(text(0).to_uppercase()))
        }
        "trim" => {
            arity(1)?;
            Ok(Value::String(text(0).trim().to_string()))
        }
        "to_string" => {
            arity(1)?;
            Ok(Value::String(text(0)))
        }
        "split" => {
            arity(3)?;
            let index = as_i64(&args[2])
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| MappingError::Evaluation("split index must be a non-negative integer".to_string()))?;
            let source = text(0);
            let separator = text(1);
            if separator.is_empty() {
                return Err(MappingError::Evaluation("split separator is empty".to_string()));
            }
            Ok(source
                .split(separator.as_str())
                .nth(index)
                .map(|part| Value::String(part.to_string()))
                .unwrap_or(Value::Null))
        }
        "coalesce" => Ok(args
            .iter()
            .find(|v| !v.is_null())
            .cloned()
            .unwrap_or(Value::Null)),
        other => Err(MappingError::Unsupported(format!("call to {other}"))),
    }
}
