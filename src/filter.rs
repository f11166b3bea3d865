/*!
Predicates and the key/value filter-splitting rule the Split Read Façade
applies before pushdown (spec.md §4.7, "Filter splitting").
*/
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::value::Value;

/// A comparison operator over a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// A predicate over row values, decomposable on top-level AND for the
/// key/value filter split (spec.md §4.7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// `field <op> value`.
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// Conjunction. Only this variant's children are eligible for
    /// independent key/value classification; an OR or NOT subtree is
    /// classified as a whole by the columns it touches.
    And(Vec<Predicate>),
    /// Disjunction.
    Or(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Names of every column this predicate references.
    pub fn columns(&self) -> HashSet<String> {
        let mut out = HashSet::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut HashSet<String>) {
        match self {
            Predicate::Compare { field, .. } => {
                out.insert(field.clone());
            }
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.collect_columns(out);
                }
            }
            Predicate::Not(inner) => inner.collect_columns(out),
        }
    }

    /// Whether every column this predicate touches is in `key_columns`.
    pub fn is_key_only(&self, key_columns: &[String]) -> bool {
        self.columns().iter().all(|c| key_columns.contains(c))
    }
}

/// The result of splitting a predicate by key/value eligibility.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitFilter {
    /// Conjuncts that reference only primary-key columns.
    pub key_filter: Option<Predicate>,
    /// Conjuncts that reference at least one non-key column.
    pub value_filter: Option<Predicate>,
}

/// Decompose `predicate` on top-level AND and classify each conjunct as a
/// key filter (mentions only `key_columns`) or a value filter (spec.md
/// §4.7). Rationale: pushing a value predicate into an overlapping
/// section's individual files can drop rows later superseded by a merge.
pub fn split_by_columns(predicate: &Predicate, key_columns: &[String]) -> SplitFilter {
    let conjuncts = match predicate {
        Predicate::And(children) => children.iter().collect::<Vec<_>>(),
        other => vec![other],
    };

    let mut key_parts = Vec::new();
    let mut value_parts = Vec::new();
    for conjunct in conjuncts {
        if conjunct.is_key_only(key_columns) {
            key_parts.push(conjunct.clone());
        } else {
            value_parts.push(conjunct.clone());
        }
    }

    SplitFilter {
        key_filter: combine(key_parts),
        value_filter: combine(value_parts),
    }
}

impl Predicate {
    /// Evaluate this predicate against a row, looking up column values by
    /// name through `get`. Used to apply a file-format layer's "unpushed"
    /// remainder post-decode (spec.md §4.4).
    pub fn evaluate(&self, get: &dyn Fn(&str) -> Option<Value>) -> bool {
        match self {
            Predicate::Compare { field, op, value } => match get(field) {
                Some(actual) => compare(op, &actual, value),
                None => false,
            },
            Predicate::And(children) => children.iter().all(|c| c.evaluate(get)),
            Predicate::Or(children) => children.iter().any(|c| c.evaluate(get)),
            Predicate::Not(inner) => !inner.evaluate(get),
        }
    }
}

fn compare(op: &CompareOp, actual: &Value, expected: &Value) -> bool {
    use std::cmp::Ordering;
    let ordering = match actual.partial_cmp(expected) {
        Some(ordering) => ordering,
        None => return false,
    };
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::NotEq => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::LtEq => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::GtEq => ordering != Ordering::Less,
    }
}

fn combine(parts: Vec<Predicate>) -> Option<Predicate> {
    match parts.len() {
        0 => None,
        1 => Some(parts.into_iter().next().unwrap()),
        _ => Some(Predicate::And(parts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compare(field: &str, value: i32) -> Predicate {
        Predicate::Compare {
            field: field.to_string(),
            op: CompareOp::GtEq,
            value: Value::Int(value),
        }
    }

    #[test]
    fn test_split_pure_key_filter() {
        let predicate = compare("id", 1);
        let split = split_by_columns(&predicate, &["id".to_string()]);
        assert_eq!(split.key_filter, Some(predicate));
        assert_eq!(split.value_filter, None);
    }

    #[test]
    fn test_split_conjunction_by_column() {
        let predicate = Predicate::And(vec![compare("id", 1), compare("value", 100)]);
        let split = split_by_columns(&predicate, &["id".to_string()]);
        assert_eq!(split.key_filter, Some(compare("id", 1)));
        assert_eq!(split.value_filter, Some(compare("value", 100)));
    }

    #[test]
    fn test_or_with_mixed_columns_is_value_only() {
        let predicate = Predicate::Or(vec![compare("id", 1), compare("value", 100)]);
        let split = split_by_columns(&predicate, &["id".to_string()]);
        assert_eq!(split.key_filter, None);
        assert_eq!(split.value_filter, Some(predicate));
    }
}
