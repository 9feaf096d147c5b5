//! Runtime metrics context and trigger-condition evaluation

use crate::dsl::ast::{Condition, Mutation, Operator, Organism, Value};
use regex::Regex;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Metric name to value mapping that conditions are evaluated against.
///
/// `matches` patterns are compiled once per context and reused; invalid
/// patterns are remembered as such.
#[derive(Debug, Clone, Default)]
pub struct MetricContext {
    metrics: BTreeMap<String, Value>,
    patterns: RefCell<HashMap<String, Option<Regex>>>,
}

impl PartialEq for MetricContext {
    fn eq(&self, other: &Self) -> bool {
        self.metrics == other.metrics
    }
}

impl MetricContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context holding only the organism's own state metrics.
    pub fn from_organism(organism: &Organism) -> Self {
        let mut context = Self::new();
        context.seed_from(organism);
        context
    }

    /// Overwrite the state metrics with the organism's current values.
    pub fn seed_from(&mut self, organism: &Organism) {
        self.insert("fitness", organism.fitness);
        self.insert("consciousness", organism.consciousness);
        self.insert("generation", organism.generation as i64);
        self.insert("mutation_count", organism.mutation_count as i64);
    }

    pub fn insert(&mut self, metric: impl Into<String>, value: impl Into<Value>) {
        self.metrics.insert(metric.into(), value.into());
    }

    pub fn get(&self, metric: &str) -> Option<&Value> {
        self.metrics.get(metric)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Drop every metric. Compiled patterns are kept.
    pub fn clear(&mut self) {
        self.metrics.clear();
    }

    pub fn cached_patterns(&self) -> usize {
        self.patterns.borrow().len()
    }

    fn is_match(&self, pattern: &str, text: &str) -> bool {
        let mut patterns = self.patterns.borrow_mut();
        let compiled = patterns.entry(pattern.to_string()).or_insert_with(|| {
            Regex::new(pattern)
                .map_err(|e| {
                    tracing::debug!(pattern, "invalid pattern in condition: {}", e);
                })
                .ok()
        });
        compiled.as_ref().is_some_and(|re| re.is_match(text))
    }
}

impl Condition {
    /// Compare the named metric against the condition value. A metric that
    /// is absent from the context never satisfies a condition.
    pub fn evaluate(&self, context: &MetricContext) -> bool {
        match context.get(&self.metric) {
            Some(actual) => compare(actual, self.operator, &self.value, context),
            None => false,
        }
    }
}

impl Mutation {
    /// All trigger conditions must hold. A mutation without conditions
    /// never triggers.
    pub fn should_trigger(&self, context: &MetricContext) -> bool {
        !self.trigger_conditions.is_empty()
            && self
                .trigger_conditions
                .iter()
                .all(|condition| condition.evaluate(context))
    }
}

fn compare(actual: &Value, operator: Operator, expected: &Value, context: &MetricContext) -> bool {
    match operator {
        Operator::Equal => values_equal(actual, expected),
        Operator::NotEqual => !values_equal(actual, expected),
        Operator::LessThan => ordering(actual, expected) == Some(Ordering::Less),
        Operator::LessThanOrEqual => matches!(
            ordering(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::GreaterThan => ordering(actual, expected) == Some(Ordering::Greater),
        Operator::GreaterThanOrEqual => matches!(
            ordering(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Contains => contains(actual, expected),
        Operator::Matches => context.is_match(&expected.to_string(), &actual.to_string()),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Numbers order numerically, strings lexicographically; nothing else orders.
fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
        _ => actual.to_string().contains(&expected.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> MetricContext {
        let mut context = MetricContext::new();
        context.insert("fitness", 0.5);
        context.insert("generation", 3i64);
        context.insert("state", "degraded");
        context.insert("healthy", false);
        context.insert(
            "alerts",
            Value::Array(vec!["disk".into(), "cpu".into()]),
        );
        context
    }

    fn holds(metric: &str, operator: Operator, value: impl Into<Value>) -> bool {
        Condition::new(metric, operator, value).evaluate(&context())
    }

    #[test]
    fn test_numeric_operators() {
        assert!(holds("fitness", Operator::LessThan, 0.6));
        assert!(!holds("fitness", Operator::LessThan, 0.5));
        assert!(holds("fitness", Operator::LessThanOrEqual, 0.5));
        assert!(holds("fitness", Operator::GreaterThan, 0.4));
        assert!(!holds("fitness", Operator::GreaterThan, 0.5));
        assert!(holds("fitness", Operator::GreaterThanOrEqual, 0.5));
        assert!(holds("fitness", Operator::Equal, 0.5));
        assert!(holds("fitness", Operator::NotEqual, 0.7));
    }

    #[test]
    fn test_integer_and_float_compare_numerically() {
        assert!(holds("generation", Operator::Equal, 3.0));
        assert!(holds("generation", Operator::GreaterThan, 2.5));
        assert!(holds("fitness", Operator::LessThan, 1i64));
    }

    #[test]
    fn test_string_operators() {
        assert!(holds("state", Operator::Equal, "degraded"));
        assert!(holds("state", Operator::NotEqual, "healthy"));
        assert!(holds("state", Operator::LessThan, "e"));
        assert!(holds("state", Operator::Contains, "grad"));
        assert!(!holds("state", Operator::Contains, "fail"));
        assert!(holds("state", Operator::Matches, "^deg.*d$"));
        assert!(!holds("state", Operator::Matches, "^ok"));
    }

    #[test]
    fn test_boolean_operators() {
        assert!(holds("healthy", Operator::Equal, false));
        assert!(holds("healthy", Operator::NotEqual, true));
        assert!(!holds("healthy", Operator::LessThan, true));
    }

    #[test]
    fn test_mixed_kinds() {
        assert!(!holds("state", Operator::Equal, 1i64));
        assert!(holds("state", Operator::NotEqual, 1i64));
        assert!(!holds("state", Operator::GreaterThan, 1i64));
        assert!(!holds("fitness", Operator::LessThan, "1"));
    }

    #[test]
    fn test_contains_on_array_metric() {
        assert!(holds("alerts", Operator::Contains, "cpu"));
        assert!(!holds("alerts", Operator::Contains, "net"));
    }

    #[test]
    fn test_invalid_pattern_is_false() {
        assert!(!holds("state", Operator::Matches, "(unclosed"));
    }

    #[test]
    fn test_patterns_compile_once() {
        let context = context();
        let condition = Condition::new("state", Operator::Matches, "^deg");
        let broken = Condition::new("state", Operator::Matches, "(unclosed");

        for _ in 0..3 {
            assert!(condition.evaluate(&context));
            assert!(!broken.evaluate(&context));
        }
        assert_eq!(context.cached_patterns(), 2);
    }

    #[test]
    fn test_clear_keeps_compiled_patterns() {
        let mut context = context();
        assert!(Condition::new("state", Operator::Matches, "grad").evaluate(&context));

        context.clear();
        assert!(context.is_empty());
        assert_eq!(context.cached_patterns(), 1);
        assert!(!Condition::new("state", Operator::Matches, "grad").evaluate(&context));
    }

    #[test]
    fn test_missing_metric_is_false_for_every_operator() {
        for operator in [
            Operator::LessThan,
            Operator::LessThanOrEqual,
            Operator::GreaterThan,
            Operator::GreaterThanOrEqual,
            Operator::Equal,
            Operator::NotEqual,
            Operator::Matches,
            Operator::Contains,
        ] {
            assert!(!holds("latency", operator, 1i64), "{} on missing metric", operator);
        }
    }

    #[test]
    fn test_trigger_requires_all_conditions() {
        let context = context();
        let mut mutation = Mutation::new("m");
        assert!(!mutation.should_trigger(&context));

        mutation.trigger_conditions = vec![
            Condition::new("fitness", Operator::LessThan, 0.6),
            Condition::new("generation", Operator::GreaterThan, 2i64),
        ];
        assert!(mutation.should_trigger(&context));

        mutation.trigger_conditions[1] = Condition::new("generation", Operator::GreaterThan, 5i64);
        assert!(!mutation.should_trigger(&context));
    }

    #[test]
    fn test_seed_from_organism() {
        let mut organism = Organism::new("X");
        organism.mutation_count = 4;
        let context = MetricContext::from_organism(&organism);
        assert_eq!(context.len(), 4);
        assert_eq!(context.get("fitness"), Some(&Value::Float(0.5)));
        assert_eq!(context.get("generation"), Some(&Value::Integer(1)));
        assert_eq!(context.get("mutation_count"), Some(&Value::Integer(4)));
    }
}
