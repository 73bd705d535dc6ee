//! Footer rules and aggregation
//!
//! Each column carries one `FooterRule` per footer row; values are computed
//! from the currently visible (unfiltered) rows only.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::datatype::Value;

/// What a footer cell shows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FooterRule {
    /// Nothing.
    #[default]
    None,
    /// A fixed value.
    Literal(Value),
    /// A built-in aggregate over the column's visible cells.
    Aggregate(AggregateKind),
    /// A registered footer formula, dispatched by tag.
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

/// A user-supplied footer formula over a column's visible values.
pub type FooterFormula = Box<dyn Fn(&[Value]) -> Value>;

/// Registry of custom footer formulas, dispatched by tag.
#[derive(Default)]
pub struct FooterFormulas {
    formulas: FxHashMap<String, FooterFormula>,
}

impl FooterFormulas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a formula. Replaces any previous formula for the same tag.
    pub fn register(&mut self, tag: impl Into<String>, formula: FooterFormula) {
        self.formulas.insert(tag.into(), formula);
    }

    pub fn get(&self, tag: &str) -> Option<&FooterFormula> {
        self.formulas.get(tag)
    }
}

/// Evaluate one footer rule over a column's visible values.
pub fn compute_footer(rule: &FooterRule, values: &[Value], formulas: &FooterFormulas) -> Value {
    match rule {
        FooterRule::None => Value::Empty,
        FooterRule::Literal(v) => v.clone(),
        FooterRule::Aggregate(kind) => aggregate(*kind, values),
        FooterRule::Custom(tag) => match formulas.get(tag) {
            Some(formula) => formula(values),
            None => Value::Empty,
        },
    }
}

/// Built-in aggregates. Sum/Avg/Min/Max see numeric cells only; Count counts
/// non-empty cells. Avg/Min/Max of no numeric cells is empty.
pub fn aggregate(kind: AggregateKind, values: &[Value]) -> Value {
    if kind == AggregateKind::Count {
        let count = values.iter().filter(|v| !v.is_empty()).count();
        return Value::Number(count as f64);
    }

    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    match kind {
        AggregateKind::Sum => Value::Number(numbers.iter().sum()),
        AggregateKind::Avg => {
            if numbers.is_empty() {
                Value::Empty
            } else {
                Value::Number(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
        AggregateKind::Min => numbers
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, n| {
                Some(match acc {
                    Some(m) => m.min(n),
                    None => n,
                })
            })
            .map(Value::Number)
            .unwrap_or(Value::Empty),
        AggregateKind::Max => numbers
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, n| {
                Some(match acc {
                    Some(m) => m.max(n),
                    None => n,
                })
            })
            .map(Value::Number)
            .unwrap_or(Value::Empty),
        AggregateKind::Count => unreachable!(),
    }
}
