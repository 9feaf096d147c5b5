//! Document model for parsed DNA-Lang organisms

use crate::error::DnaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Untyped literal produced by the generic `value` production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Numeric view of integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// Root document: configuration, genome, agents and the evolving state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    pub name: String,
    pub dna: Dna,
    pub genes: Vec<Gene>,
    pub agents: Vec<Agent>,
    pub collaboration: Option<Collaboration>,
    pub fitness: f64,
    pub consciousness: f64,
    pub generation: u64,
    pub mutation_count: u64,
    pub evolution_log: Vec<String>,
}

impl Organism {
    pub const INITIAL_FITNESS: f64 = 0.5;

    /// An empty organism with default DNA and fresh runtime state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dna: Dna::default(),
            genes: Vec::new(),
            agents: Vec::new(),
            collaboration: None,
            fitness: Self::INITIAL_FITNESS,
            consciousness: 0.0,
            generation: 1,
            mutation_count: 0,
            evolution_log: Vec::new(),
        }
    }

    pub fn gene(&self, name: &str) -> Option<&Gene> {
        self.genes.iter().find(|g| g.name == name)
    }

    pub fn expressed_genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.iter().filter(|g| g.is_expressed())
    }
}

/// Organism-wide configuration block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dna {
    pub domain: String,
    pub security_level: SecurityLevel,
    pub evolution_rate: EvolutionRate,
    pub immune_system: bool,
    pub consciousness_target: f64,
    pub fitness_threshold: f64,
}

impl Default for Dna {
    fn default() -> Self {
        Self {
            domain: "general".to_string(),
            security_level: SecurityLevel::Medium,
            evolution_rate: EvolutionRate::Adaptive,
            immune_system: true,
            consciousness_target: 0.0,
            fitness_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Low,
    Medium,
    High,
    Maximum,
}

impl FromStr for SecurityLevel {
    type Err = DnaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(SecurityLevel::Low),
            "medium" => Ok(SecurityLevel::Medium),
            "high" => Ok(SecurityLevel::High),
            "maximum" => Ok(SecurityLevel::Maximum),
            _ => Err(DnaError::configuration("security_level", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvolutionRate {
    Slow,
    Adaptive,
    Fast,
    Custom,
}

impl FromStr for EvolutionRate {
    type Err = DnaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "slow" => Ok(EvolutionRate::Slow),
            "adaptive" => Ok(EvolutionRate::Adaptive),
            "fast" => Ok(EvolutionRate::Fast),
            "custom" => Ok(EvolutionRate::Custom),
            _ => Err(DnaError::configuration("evolution_rate", s)),
        }
    }
}

/// A named, independently activatable unit of behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub name: String,
    pub purpose: String,
    pub expression_level: f64,
    pub active: bool,
    /// Informational only; the engine does not order genes by dependency.
    pub dependencies: Vec<String>,
    pub mutations: Vec<Mutation>,
    pub collaboration: Option<GeneCollaboration>,
}

impl Gene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            purpose: String::new(),
            expression_level: 1.0,
            active: true,
            dependencies: Vec::new(),
            mutations: Vec::new(),
            collaboration: None,
        }
    }

    /// Only expressed genes take part in evolution.
    pub fn is_expressed(&self) -> bool {
        self.active && self.expression_level > 0.0
    }
}

/// Gene-level collaboration descriptor. Not interpreted by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneCollaboration {
    pub with: Vec<String>,
    pub priority: Option<Value>,
    pub protocol: Option<String>,
}

/// A conditionally triggered set of built-in operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub name: String,
    pub trigger_conditions: Vec<Condition>,
    pub methods: Vec<MutationMethod>,
    /// Stored but not consulted when deciding whether to trigger.
    pub probability: f64,
    pub impact_level: String,
    pub safety_check: Option<SafetyCheck>,
    pub rollback_strategy: RollbackStrategy,
}

impl Mutation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trigger_conditions: Vec::new(),
            methods: Vec::new(),
            probability: 1.0,
            impact_level: "medium".to_string(),
            safety_check: None,
            rollback_strategy: RollbackStrategy::default(),
        }
    }
}

/// Built-in operations a mutation may invoke.
///
/// The set is closed. Names outside it parse to `Unrecognized` and make the
/// owning mutation fail when applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationMethod {
    Optimize,
    Adapt,
    Scale,
    IncreaseIntrospection,
    EnhanceMetaCognition,
    AdjustLearningRate,
    RefinePatterns,
    Unrecognized(String),
}

impl MutationMethod {
    pub fn from_name(name: &str) -> Self {
        match name {
            "optimize" => MutationMethod::Optimize,
            "adapt" => MutationMethod::Adapt,
            "scale" => MutationMethod::Scale,
            "increaseIntrospection" => MutationMethod::IncreaseIntrospection,
            "enhanceMetaCognition" => MutationMethod::EnhanceMetaCognition,
            "adjustLearningRate" => MutationMethod::AdjustLearningRate,
            "refinePatterns" => MutationMethod::RefinePatterns,
            other => MutationMethod::Unrecognized(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MutationMethod::Optimize => "optimize",
            MutationMethod::Adapt => "adapt",
            MutationMethod::Scale => "scale",
            MutationMethod::IncreaseIntrospection => "increaseIntrospection",
            MutationMethod::EnhanceMetaCognition => "enhanceMetaCognition",
            MutationMethod::AdjustLearningRate => "adjustLearningRate",
            MutationMethod::RefinePatterns => "refinePatterns",
            MutationMethod::Unrecognized(name) => name,
        }
    }
}

/// Named guard evaluated before a mutation's methods run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyCheck {
    /// `validateConsciousnessLevel`: passes while consciousness < 1.0
    ConsciousnessLevel,
    /// `validateFitnessLevel`: passes while fitness > 0.1
    FitnessLevel,
    /// Any other name; always passes.
    Other(String),
}

impl SafetyCheck {
    pub fn from_name(name: &str) -> Self {
        match name {
            "validateConsciousnessLevel" => SafetyCheck::ConsciousnessLevel,
            "validateFitnessLevel" => SafetyCheck::FitnessLevel,
            other => SafetyCheck::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SafetyCheck::ConsciousnessLevel => "validateConsciousnessLevel",
            SafetyCheck::FitnessLevel => "validateFitnessLevel",
            SafetyCheck::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackStrategy {
    Immediate,
    #[default]
    GradualRollback,
    None,
}

impl FromStr for RollbackStrategy {
    type Err = DnaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(RollbackStrategy::Immediate),
            "gradual_rollback" => Ok(RollbackStrategy::GradualRollback),
            "none" => Ok(RollbackStrategy::None),
            _ => Err(DnaError::configuration("rollback_strategy", s)),
        }
    }
}

/// A single `metric <operator> value` comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub metric: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new(metric: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            metric: metric.into(),
            operator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    Matches,
    Contains,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Matches => "matches",
            Operator::Contains => "contains",
        }
    }
}

impl FromStr for Operator {
    type Err = DnaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Operator::LessThan),
            "<=" => Ok(Operator::LessThanOrEqual),
            ">" => Ok(Operator::GreaterThan),
            ">=" => Ok(Operator::GreaterThanOrEqual),
            "==" => Ok(Operator::Equal),
            "!=" => Ok(Operator::NotEqual),
            "matches" => Ok(Operator::Matches),
            "contains" => Ok(Operator::Contains),
            _ => Err(DnaError::configuration("operator", s)),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Agent declaration. Declared only; nothing here executes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub agent_type: String,
    pub parameters: BTreeMap<String, String>,
}

/// Organism-level collaboration block, retained verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collaboration {
    pub participants: Vec<String>,
    pub protocol: Option<String>,
    pub consensus: Option<String>,
    pub workflow: Option<Workflow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: Option<String>,
    pub steps: Vec<WorkflowStep>,
    pub error_handling: Option<String>,
    pub retry_policy: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub action: String,
    pub timeout: Option<String>,
    pub condition: Option<String>,
    pub safety: Option<String>,
    pub priority: Option<Value>,
    /// Keys without a dedicated field.
    pub extra: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dna_defaults() {
        let dna = Dna::default();
        assert_eq!(dna.domain, "general");
        assert_eq!(dna.security_level, SecurityLevel::Medium);
        assert_eq!(dna.evolution_rate, EvolutionRate::Adaptive);
        assert!(dna.immune_system);
        assert_eq!(dna.consciousness_target, 0.0);
        assert_eq!(dna.fitness_threshold, 0.5);
    }

    #[test]
    fn test_gene_expression() {
        let mut gene = Gene::new("G");
        assert!(gene.is_expressed());

        gene.expression_level = 0.0;
        assert!(!gene.is_expressed());

        gene.expression_level = 0.4;
        gene.active = false;
        assert!(!gene.is_expressed());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("HIGH".parse::<SecurityLevel>().unwrap(), SecurityLevel::High);
        assert_eq!("fast".parse::<EvolutionRate>().unwrap(), EvolutionRate::Fast);
        assert_eq!(
            "immediate".parse::<RollbackStrategy>().unwrap(),
            RollbackStrategy::Immediate
        );
        assert_eq!(RollbackStrategy::default(), RollbackStrategy::GradualRollback);

        match "bogus".parse::<SecurityLevel>() {
            Err(DnaError::Configuration { field, value }) => {
                assert_eq!(field, "security_level");
                assert_eq!(value, "bogus");
            }
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_method_names_round_trip_through_closed_set() {
        for name in [
            "optimize",
            "adapt",
            "scale",
            "increaseIntrospection",
            "enhanceMetaCognition",
            "adjustLearningRate",
            "refinePatterns",
        ] {
            let method = MutationMethod::from_name(name);
            assert!(!matches!(method, MutationMethod::Unrecognized(_)));
            assert_eq!(method.name(), name);
        }

        assert_eq!(
            MutationMethod::from_name("teleport"),
            MutationMethod::Unrecognized("teleport".to_string())
        );
    }

    #[test]
    fn test_value_views() {
        assert_eq!(Value::String("x".to_string()).as_str(), Some("x"));
        assert_eq!(Value::Integer(1).as_str(), None);
        assert_eq!(Value::Boolean(false).as_bool(), Some(false));
        assert_eq!(Value::String("true".to_string()).as_bool(), None);
        assert_eq!(Value::Integer(2).as_f64(), Some(2.0));
    }

    #[test]
    fn test_gene_lookup_returns_first_match() {
        let mut organism = Organism::new("X");
        let mut first = Gene::new("A");
        first.expression_level = 0.2;
        organism.genes.push(first);
        organism.genes.push(Gene::new("A"));

        assert_eq!(organism.gene("A").map(|g| g.expression_level), Some(0.2));
        assert!(organism.gene("B").is_none());
    }

    #[test]
    fn test_value_display() {
        let value = Value::Array(vec![Value::Integer(1), Value::Float(0.5), "x".into()]);
        assert_eq!(value.to_string(), "[1, 0.5, x]");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }
}
