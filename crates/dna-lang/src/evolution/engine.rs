//! Single-step evolution of an organism

use crate::config::EngineConfig;
use crate::dsl::ast::{Gene, Organism, RollbackStrategy, Value};
use crate::evolution::context::MetricContext;
use crate::evolution::sink::{EvolutionEvent, EvolutionSink, TracingSink};
use crate::evolution::EvolutionStatus;
use std::collections::BTreeMap;

const EXPRESSION_WEIGHT: f64 = 0.7;
const CONSCIOUSNESS_WEIGHT: f64 = 0.3;
const CONSCIOUSNESS_GROWTH: f64 = 0.01;

/// State captured before a mutation dispatches its methods.
struct Snapshot {
    gene: Gene,
    fitness: f64,
    consciousness: f64,
}

/// Evaluates mutation rules against a metrics context and advances
/// organisms one generation at a time.
///
/// The engine owns no organism; callers pass the one they are driving to
/// each call and decide themselves when to stop.
pub struct EvolutionEngine<S: EvolutionSink = TracingSink> {
    config: EngineConfig,
    /// Caller-supplied telemetry, kept across steps.
    injected: BTreeMap<String, Value>,
    /// Reused across steps so compiled `matches` patterns survive.
    context: MetricContext,
    sink: S,
}

impl EvolutionEngine<TracingSink> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_sink(config, TracingSink)
    }
}

impl Default for EvolutionEngine<TracingSink> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<S: EvolutionSink> EvolutionEngine<S> {
    pub fn with_sink(config: EngineConfig, sink: S) -> Self {
        Self {
            config,
            injected: BTreeMap::new(),
            context: MetricContext::new(),
            sink,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Feed an external metric into every following step's context.
    /// Organism state metrics of the same name take precedence.
    pub fn set_metric(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.injected.insert(name.into(), value.into());
    }

    pub fn clear_metric(&mut self, name: &str) -> Option<Value> {
        self.injected.remove(name)
    }

    /// Build the context a step would evaluate conditions against.
    pub fn context_for(&self, organism: &Organism) -> MetricContext {
        let mut context = MetricContext::new();
        fill_context(&mut context, &self.config, &self.injected, organism);
        context
    }

    pub fn status(&self, organism: &Organism) -> EvolutionStatus {
        organism.status()
    }

    /// Advance `organism` by one generation.
    ///
    /// Returns whether any mutation was applied. Failures (safety checks,
    /// unknown methods, unmet conditions) are never surfaced as errors; they
    /// only show up in the sink.
    pub fn evolve_step(&mut self, organism: &mut Organism) -> bool {
        let span = tracing::debug_span!(
            "evolve_step",
            organism = %organism.name,
            generation = organism.generation
        );
        let _enter = span.enter();

        self.context.clear();
        fill_context(&mut self.context, &self.config, &self.injected, organism);
        let context = &self.context;

        let triggered: Vec<(usize, usize)> = organism
            .genes
            .iter()
            .enumerate()
            .filter(|(_, gene)| gene.is_expressed())
            .flat_map(|(gene_index, gene)| {
                gene.mutations
                    .iter()
                    .enumerate()
                    .filter(|(_, mutation)| mutation.should_trigger(context))
                    .map(move |(mutation_index, _)| (gene_index, mutation_index))
            })
            .collect();

        let mut applied = 0;
        for &(gene_index, mutation_index) in &triggered {
            if self.apply_mutation(organism, gene_index, mutation_index) {
                applied += 1;
            }
        }

        recompute_fitness(organism);
        organism.consciousness = (organism.consciousness
            + CONSCIOUSNESS_GROWTH * organism.generation as f64 * organism.fitness)
            .clamp(0.0, 1.0);

        self.sink.record(&EvolutionEvent::GenerationCompleted {
            generation: organism.generation,
            fitness: organism.fitness,
            consciousness: organism.consciousness,
            triggered: triggered.len(),
            applied,
        });
        organism.generation += 1;

        applied > 0
    }

    fn apply_mutation(
        &mut self,
        organism: &mut Organism,
        gene_index: usize,
        mutation_index: usize,
    ) -> bool {
        let gene_name = organism.genes[gene_index].name.clone();
        let mutation = organism.genes[gene_index].mutations[mutation_index].clone();
        let generation = organism.generation;

        if let Some(check) = &mutation.safety_check {
            if !check.passes(organism) {
                self.sink.record(&EvolutionEvent::SafetyCheckFailed {
                    generation,
                    gene: gene_name,
                    mutation: mutation.name,
                    check: check.name().to_string(),
                });
                return false;
            }
        }

        let snapshot = Snapshot {
            gene: organism.genes[gene_index].clone(),
            fitness: organism.fitness,
            consciousness: organism.consciousness,
        };

        for method in &mutation.methods {
            tracing::debug!(gene = %gene_name, method = method.name(), "dispatching method");
            if !method.apply(organism, gene_index) {
                self.sink.record(&EvolutionEvent::UnknownMethod {
                    generation,
                    gene: gene_name.clone(),
                    mutation: mutation.name.clone(),
                    method: method.name().to_string(),
                });

                if mutation.rollback_strategy == RollbackStrategy::Immediate {
                    organism.genes[gene_index] = snapshot.gene;
                    organism.fitness = snapshot.fitness;
                    organism.consciousness = snapshot.consciousness;
                    self.sink.record(&EvolutionEvent::RolledBack {
                        generation,
                        gene: gene_name,
                        mutation: mutation.name,
                    });
                }
                return false;
            }
        }

        organism.mutation_count += 1;
        organism.evolution_log.push(format!(
            "Gen {}: Applied {} to {}",
            generation, mutation.name, gene_name
        ));
        self.sink.record(&EvolutionEvent::MutationApplied {
            generation,
            gene: gene_name,
            mutation: mutation.name,
        });
        true
    }
}

/// Static metrics first, then injected ones, then organism state.
fn fill_context(
    context: &mut MetricContext,
    config: &EngineConfig,
    injected: &BTreeMap<String, Value>,
    organism: &Organism,
) {
    for (name, value) in &config.static_metrics {
        context.insert(name.clone(), *value);
    }
    for (name, value) in injected {
        context.insert(name.clone(), value.clone());
    }
    context.seed_from(organism);
}

/// Weighted mean expression of expressed genes plus current consciousness.
/// Left unchanged when no gene is expressed.
fn recompute_fitness(organism: &mut Organism) {
    let (sum, count) = organism
        .expressed_genes()
        .fold((0.0, 0usize), |(sum, count), gene| {
            (sum + gene.expression_level, count + 1)
        });
    if count == 0 {
        return;
    }

    let average = sum / count as f64;
    organism.fitness = (EXPRESSION_WEIGHT * average + CONSCIOUSNESS_WEIGHT * organism.consciousness)
        .clamp(0.0, 1.0);
}

/// Advance `organism` one generation with a default engine.
pub fn evolve_step(organism: &mut Organism) -> bool {
    EvolutionEngine::default().evolve_step(organism)
}
