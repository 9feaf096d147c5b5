//! Parser for DNA-Lang
//!
//! Recursive descent over the flat token sequence produced by the lexer,
//! one production per block. Keys a block does not know are skipped
//! together with their value so that newer documents still load.

use crate::dsl::ast::*;
use crate::dsl::lexer::{tokenize, Token};
use crate::error::{DnaError, Result, SyntaxError};
use std::collections::{BTreeMap, HashSet};

/// Tokens shown on each side of the cursor in syntax errors.
const CONTEXT_RADIUS: usize = 3;

/// Deepest nesting of generic objects, arrays and call arguments.
const MAX_NESTING: usize = 256;

/// Parser behaviour switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject duplicate gene names and expression levels outside `[0, 1]`.
    pub strict: bool,
}

/// Parser for DNA-Lang
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    options: ParseOptions,
}

impl Parser {
    /// Create a new parser with the given tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_options(tokens, ParseOptions::default())
    }

    pub fn with_options(tokens: Vec<Token>, options: ParseOptions) -> Self {
        Self {
            tokens,
            current: 0,
            depth: 0,
            options,
        }
    }

    /// Parse the tokens into an organism
    pub fn parse(&mut self) -> Result<Organism> {
        let organism = self.parse_organism()?;

        if !self.is_at_end() {
            tracing::debug!(
                position = self.current,
                "ignoring {} tokens after organism '{}'",
                self.tokens.len() - self.current,
                organism.name
            );
        }

        if self.options.strict {
            validate_strict(&organism)?;
        }

        Ok(organism)
    }

    fn parse_organism(&mut self) -> Result<Organism> {
        self.expect("ORGANISM")?;
        let name = self.expect_name("organism name")?;
        let mut organism = Organism::new(name);

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            if self.match_literal("DNA") {
                organism.dna = self.parse_dna()?;
            } else if self.match_literal("GENOME") {
                organism.genes.extend(self.parse_genome()?);
            } else if self.match_literal("AGENTS") {
                organism.agents.extend(self.parse_agents()?);
            } else if self.match_literal("COLLABORATION") {
                let mut collaboration = self.parse_collaboration()?;
                if collaboration.workflow.is_none() {
                    collaboration.workflow = organism
                        .collaboration
                        .take()
                        .and_then(|existing| existing.workflow);
                }
                organism.collaboration = Some(collaboration);
            } else if self.match_literal("WORKFLOW") {
                let workflow = self.parse_workflow()?;
                organism
                    .collaboration
                    .get_or_insert_with(Collaboration::default)
                    .workflow = Some(workflow);
            } else {
                self.skip_unknown_entry("ORGANISM")?;
            }
        }
        self.expect("}")?;

        Ok(organism)
    }

    /// `DNA { key: value ... }`
    fn parse_dna(&mut self) -> Result<Dna> {
        let mut dna = Dna::default();

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            match self.peek_text().as_deref() {
                Some("domain") => {
                    self.advance();
                    self.expect(":")?;
                    dna.domain = self.parse_text()?;
                }
                Some("security_level") => {
                    self.advance();
                    self.expect(":")?;
                    dna.security_level = self.parse_text()?.parse()?;
                }
                Some("evolution_rate") => {
                    self.advance();
                    self.expect(":")?;
                    dna.evolution_rate = self.parse_text()?.parse()?;
                }
                Some("immune_system") => {
                    self.advance();
                    self.expect(":")?;
                    dna.immune_system = self.parse_bool("immune_system")?;
                }
                Some("consciousness_target") => {
                    self.advance();
                    self.expect(":")?;
                    dna.consciousness_target = self.parse_number("consciousness_target")?;
                }
                Some("fitness_threshold") => {
                    self.advance();
                    self.expect(":")?;
                    dna.fitness_threshold = self.parse_number("fitness_threshold")?;
                }
                _ => self.skip_unknown_entry("DNA")?,
            }
        }
        self.expect("}")?;

        Ok(dna)
    }

    /// `GENOME { GENE <name> { ... } ... }`
    fn parse_genome(&mut self) -> Result<Vec<Gene>> {
        let mut genes = Vec::new();

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            if self.match_literal("GENE") {
                genes.push(self.parse_gene()?);
            } else {
                self.skip_unknown_entry("GENOME")?;
            }
        }
        self.expect("}")?;

        Ok(genes)
    }

    fn parse_gene(&mut self) -> Result<Gene> {
        let mut gene = Gene::new(self.expect_name("gene name")?);

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            match self.peek_text().as_deref() {
                Some("purpose") => {
                    self.advance();
                    self.expect(":")?;
                    gene.purpose = self.parse_text()?;
                }
                Some("expression_level") => {
                    self.advance();
                    self.expect(":")?;
                    gene.expression_level = self.parse_number("expression_level")?;
                }
                Some("active") => {
                    self.advance();
                    self.expect(":")?;
                    gene.active = self.parse_bool("active")?;
                }
                Some("dependencies") => {
                    self.advance();
                    self.expect(":")?;
                    gene.dependencies = self.parse_string_list()?;
                }
                Some("MUTATIONS") => {
                    self.advance();
                    gene.mutations.extend(self.parse_mutations()?);
                }
                Some("COLLABORATION") => {
                    self.advance();
                    gene.collaboration = Some(self.parse_gene_collaboration()?);
                }
                _ => self.skip_unknown_entry("GENE")?,
            }
        }
        self.expect("}")?;

        Ok(gene)
    }

    /// `MUTATIONS { <name> { ... } ... }`
    fn parse_mutations(&mut self) -> Result<Vec<Mutation>> {
        let mut mutations = Vec::new();

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            if self.check_at(1, "{") || (self.check_at(1, ":") && self.check_at(2, "{")) {
                let name = self.expect_name("mutation name")?;
                self.match_literal(":");
                mutations.push(self.parse_mutation(name)?);
            } else {
                self.skip_unknown_entry("MUTATIONS")?;
            }
        }
        self.expect("}")?;

        Ok(mutations)
    }

    fn parse_mutation(&mut self, name: String) -> Result<Mutation> {
        let mut mutation = Mutation::new(name);

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            match self.peek_text().as_deref() {
                Some("trigger_conditions") => {
                    self.advance();
                    self.expect(":")?;
                    mutation.trigger_conditions = self.parse_trigger_conditions()?;
                }
                Some("methods") => {
                    self.advance();
                    self.expect(":")?;
                    mutation.methods = self
                        .parse_string_list()?
                        .iter()
                        .map(|name| MutationMethod::from_name(name))
                        .collect();
                }
                Some("probability") => {
                    self.advance();
                    self.expect(":")?;
                    mutation.probability = self.parse_number("probability")?;
                }
                Some("impact_level") | Some("impact") => {
                    self.advance();
                    self.expect(":")?;
                    mutation.impact_level = self.parse_text()?;
                }
                Some("safety_check") => {
                    self.advance();
                    self.expect(":")?;
                    let check = self.parse_text()?;
                    mutation.safety_check = match check.as_str() {
                        "" | "none" | "null" => None,
                        name => Some(SafetyCheck::from_name(name)),
                    };
                }
                Some("rollback_strategy") => {
                    self.advance();
                    self.expect(":")?;
                    mutation.rollback_strategy = self.parse_text()?.parse()?;
                }
                _ => self.skip_unknown_entry("mutation")?,
            }
        }
        self.expect("}")?;

        Ok(mutation)
    }

    /// `[ {metric: .., operator: .., value: ..}, ... ]`
    fn parse_trigger_conditions(&mut self) -> Result<Vec<Condition>> {
        let mut conditions = Vec::new();

        self.expect("[")?;
        while !self.check("]") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }
            conditions.push(self.parse_condition()?);
        }
        self.expect("]")?;

        Ok(conditions)
    }

    fn parse_condition(&mut self) -> Result<Condition> {
        let mut metric = None;
        let mut operator = None;
        let mut value = None;

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            match self.peek_text().as_deref() {
                Some("metric") => {
                    self.advance();
                    self.expect(":")?;
                    metric = Some(self.parse_text()?);
                }
                Some("operator") => {
                    self.advance();
                    self.expect(":")?;
                    operator = Some(self.parse_text()?.parse::<Operator>()?);
                }
                Some("value") => {
                    self.advance();
                    self.expect(":")?;
                    value = Some(self.parse_value()?);
                }
                _ => self.skip_unknown_entry("condition")?,
            }
        }

        self.expect("}")?;
        let metric = metric.ok_or_else(|| self.error_expected("metric"))?;
        let operator = operator.ok_or_else(|| self.error_expected("operator"))?;
        let value = value.ok_or_else(|| self.error_expected("value"))?;

        Ok(Condition {
            metric,
            operator,
            value,
        })
    }

    /// Gene-level `COLLABORATION { with: [...], priority: .., protocol: .. }`
    fn parse_gene_collaboration(&mut self) -> Result<GeneCollaboration> {
        let mut collaboration = GeneCollaboration::default();

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            match self.peek_text().as_deref() {
                Some("with") => {
                    self.advance();
                    self.expect(":")?;
                    collaboration.with = self.parse_string_list()?;
                }
                Some("priority") => {
                    self.advance();
                    self.expect(":")?;
                    collaboration.priority = Some(self.parse_value()?);
                }
                Some("protocol") => {
                    self.advance();
                    self.expect(":")?;
                    collaboration.protocol = Some(self.parse_text()?);
                }
                _ => self.skip_unknown_entry("COLLABORATION")?,
            }
        }
        self.expect("}")?;

        Ok(collaboration)
    }

    /// Organism-level `COLLABORATION { with: [...], protocol: .., WORKFLOW { .. } }`
    fn parse_collaboration(&mut self) -> Result<Collaboration> {
        let mut collaboration = Collaboration::default();

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            match self.peek_text().as_deref() {
                Some("with") | Some("participants") => {
                    self.advance();
                    self.expect(":")?;
                    collaboration.participants = self.parse_string_list()?;
                }
                Some("protocol") => {
                    self.advance();
                    self.expect(":")?;
                    collaboration.protocol = Some(self.parse_text()?);
                }
                Some("consensus") => {
                    self.advance();
                    self.expect(":")?;
                    collaboration.consensus = Some(self.parse_text()?);
                }
                Some("WORKFLOW") => {
                    self.advance();
                    collaboration.workflow = Some(self.parse_workflow()?);
                }
                _ => self.skip_unknown_entry("COLLABORATION")?,
            }
        }
        self.expect("}")?;

        Ok(collaboration)
    }

    /// `WORKFLOW { name: .., steps: [ {..}, .. ], error_handling: .., retry_policy: {..} }`
    fn parse_workflow(&mut self) -> Result<Workflow> {
        let mut workflow = Workflow::default();

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            match self.peek_text().as_deref() {
                Some("name") => {
                    self.advance();
                    self.expect(":")?;
                    workflow.name = Some(self.parse_text()?);
                }
                Some("steps") => {
                    self.advance();
                    self.expect(":")?;
                    workflow.steps = self.parse_workflow_steps()?;
                }
                Some("error_handling") => {
                    self.advance();
                    self.expect(":")?;
                    workflow.error_handling = Some(self.parse_text()?);
                }
                Some("retry_policy") => {
                    self.advance();
                    self.expect(":")?;
                    workflow.retry_policy = Some(self.parse_value()?);
                }
                _ => self.skip_unknown_entry("WORKFLOW")?,
            }
        }
        self.expect("}")?;

        Ok(workflow)
    }

    fn parse_workflow_steps(&mut self) -> Result<Vec<WorkflowStep>> {
        let mut steps = Vec::new();

        self.expect("[")?;
        while !self.check("]") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }
            steps.push(self.parse_workflow_step()?);
        }
        self.expect("]")?;

        Ok(steps)
    }

    fn parse_workflow_step(&mut self) -> Result<WorkflowStep> {
        let mut step = WorkflowStep::default();

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            let key = self.expect_name("step key")?;
            self.expect(":")?;
            match key.as_str() {
                "action" => step.action = self.parse_text()?,
                "timeout" => step.timeout = Some(self.parse_text()?),
                "condition" => step.condition = Some(self.parse_text()?),
                "safety" => step.safety = Some(self.parse_text()?),
                "priority" => step.priority = Some(self.parse_value()?),
                _ => {
                    let value = self.parse_value()?;
                    step.extra.insert(key, value);
                }
            }
        }
        self.expect("}")?;

        Ok(step)
    }

    /// `AGENTS { <name>: <type>(<param>: <value>, ...) ... }`
    fn parse_agents(&mut self) -> Result<Vec<Agent>> {
        let mut agents = Vec::new();

        self.expect("{")?;
        while !self.check("}") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            let name = self.expect_name("agent name")?;
            self.expect(":")?;
            let agent_type = self.expect_name("agent type")?;
            let parameters = if self.check("(") {
                self.parse_agent_parameters()?
            } else {
                BTreeMap::new()
            };

            agents.push(Agent {
                name,
                agent_type,
                parameters,
            });
        }
        self.expect("}")?;

        Ok(agents)
    }

    fn parse_agent_parameters(&mut self) -> Result<BTreeMap<String, String>> {
        let mut parameters = BTreeMap::new();

        self.expect("(")?;
        while !self.check(")") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            let key = self.expect_name("parameter name")?;
            self.expect(":")?;
            let value = self.parse_value()?;
            parameters.insert(key, value.to_string());
        }
        self.expect(")")?;

        Ok(parameters)
    }

    /// Skip an unrecognized key, an optional `:` and one generic value.
    fn skip_unknown_entry(&mut self, block: &str) -> Result<()> {
        let key = self.expect_name("key")?;
        self.match_literal(":");
        let skipped = self.parse_entry_value()?;
        tracing::debug!(
            block,
            key = %key,
            kind = skipped.type_name(),
            "skipping unrecognized key"
        );
        Ok(())
    }

    /// A value in entry position. Besides plain values this accepts named
    /// sub-blocks (`GENE X { .. }`) and call-like forms (`type(a: 1)`).
    fn parse_entry_value(&mut self) -> Result<Value> {
        let value = self.parse_value()?;
        if matches!(value, Value::Array(_) | Value::Object(_)) {
            return Ok(value);
        }

        if self.check("(") {
            let arguments = self.parse_delimited_object("(", ")")?;
            let mut call = BTreeMap::new();
            call.insert(value.to_string(), Value::Object(arguments));
            return Ok(Value::Object(call));
        }

        if self.check("{") {
            let body = self.parse_object()?;
            let mut block = BTreeMap::new();
            block.insert(value.to_string(), body);
            return Ok(Value::Object(block));
        }

        Ok(value)
    }

    /// Generic value: quoted string, object, array, boolean, number or bare word.
    fn parse_value(&mut self) -> Result<Value> {
        let token = match self.peek() {
            Some(token) if !token.is_structural() || token.is("{") || token.is("[") => {
                token.clone()
            }
            _ => return Err(self.error_expected("value")),
        };

        if token.is("{") {
            return self.parse_object();
        }
        if token.is("[") {
            return self.parse_array();
        }

        self.advance();
        Ok(scalar_value(&token))
    }

    fn parse_object(&mut self) -> Result<Value> {
        Ok(Value::Object(self.parse_delimited_object("{", "}")?))
    }

    fn parse_delimited_object(&mut self, open: &str, close: &str) -> Result<BTreeMap<String, Value>> {
        let mut entries = BTreeMap::new();

        self.descend()?;
        self.expect(open)?;
        while !self.check(close) && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }

            let key = self.expect_name("key")?;
            self.match_literal(":");
            let value = if self.check(",") || self.check(close) {
                Value::Boolean(true)
            } else {
                self.parse_entry_value()?
            };
            entries.insert(key, value);
        }
        self.expect(close)?;
        self.depth -= 1;

        Ok(entries)
    }

    fn parse_array(&mut self) -> Result<Value> {
        let mut items = Vec::new();

        self.descend()?;
        self.expect("[")?;
        while !self.check("]") && !self.is_at_end() {
            if self.match_literal(",") {
                continue;
            }
            items.push(self.parse_value()?);
        }
        self.expect("]")?;
        self.depth -= 1;

        Ok(Value::Array(items))
    }

    // Typed views over the generic value production

    fn parse_text(&mut self) -> Result<String> {
        Ok(self.parse_value()?.to_string())
    }

    fn parse_number(&mut self, field: &str) -> Result<f64> {
        let value = self.parse_value()?;
        value
            .as_f64()
            .ok_or_else(|| DnaError::configuration(field, value.to_string()))
    }

    fn parse_bool(&mut self, field: &str) -> Result<bool> {
        let value = self.parse_value()?;
        if let Some(b) = value.as_bool() {
            return Ok(b);
        }
        match value.as_str() {
            Some(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Some(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(DnaError::configuration(field, value.to_string())),
        }
    }

    fn parse_string_list(&mut self) -> Result<Vec<String>> {
        match self.parse_value()? {
            Value::Array(items) => Ok(items.iter().map(Value::to_string).collect()),
            other => Ok(vec![other.to_string()]),
        }
    }

    // Cursor helpers

    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_expected("shallower nesting"));
        }
        self.depth += 1;
        Ok(())
    }

    fn expect(&mut self, literal: &str) -> Result<()> {
        if self.check(literal) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_expected(literal))
        }
    }

    /// A non-structural token used as a name; quotes are removed.
    fn expect_name(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            Some(token) if !token.is_structural() => {
                let name = token.unquoted().to_string();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_expected(what)),
        }
    }

    fn match_literal(&mut self, literal: &str) -> bool {
        if self.check(literal) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, literal: &str) -> bool {
        self.check_at(0, literal)
    }

    fn check_at(&self, offset: usize, literal: &str) -> bool {
        self.tokens
            .get(self.current + offset)
            .is_some_and(|t| t.is(literal))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn peek_text(&self) -> Option<String> {
        self.peek().map(|t| t.text.clone())
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn error_expected(&self, expected: &str) -> DnaError {
        DnaError::Syntax(SyntaxError {
            expected: expected.to_string(),
            found: self.peek().map(|t| t.text.clone()),
            position: self.current,
            context: self.context_window(),
        })
    }

    /// Tokens around the cursor with the current one marked.
    fn context_window(&self) -> String {
        let start = self.current.saturating_sub(CONTEXT_RADIUS);
        let end = (self.current + CONTEXT_RADIUS + 1).min(self.tokens.len());

        let mut parts: Vec<String> = Vec::new();
        for index in start..end.max(start) {
            if index == self.current {
                parts.push(format!(">>>{}<<<", self.tokens[index]));
            } else {
                parts.push(self.tokens[index].text.clone());
            }
        }
        if self.is_at_end() {
            parts.push(">>><EOF><<<".to_string());
        }

        parts.join(" ")
    }
}

/// Type a single non-structural token.
fn scalar_value(token: &Token) -> Value {
    if token.is_quoted() {
        return Value::String(token.unquoted().to_string());
    }

    let text = token.as_str();
    match text {
        "true" => return Value::Boolean(true),
        "false" => return Value::Boolean(false),
        _ => {}
    }

    if text.contains('.') {
        if let Ok(float) = text.parse::<f64>() {
            return Value::Float(float);
        }
    } else if let Ok(integer) = text.parse::<i64>() {
        return Value::Integer(integer);
    }

    Value::String(text.to_string())
}

fn validate_strict(organism: &Organism) -> Result<()> {
    let mut seen = HashSet::new();
    for gene in &organism.genes {
        if !seen.insert(gene.name.as_str()) {
            return Err(DnaError::Validation(format!(
                "duplicate gene name '{}'",
                gene.name
            )));
        }
        if !(0.0..=1.0).contains(&gene.expression_level) {
            return Err(DnaError::Validation(format!(
                "expression_level {} of gene '{}' is outside [0, 1]",
                gene.expression_level, gene.name
            )));
        }
    }
    Ok(())
}

/// Parse DNA-Lang source text into an organism.
pub fn parse(source: &str) -> Result<Organism> {
    parse_with(source, &ParseOptions::default())
}

pub fn parse_with(source: &str, options: &ParseOptions) -> Result<Organism> {
    Parser::with_options(tokenize(source), options.clone()).parse()
}
