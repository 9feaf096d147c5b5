//! Evolution engine for parsed organisms
//!
//! Each step evaluates the trigger conditions of every expressed gene's
//! mutations against a metrics context, applies the ones that hold, then
//! recomputes fitness and consciousness and advances the generation.

pub mod builtins;
pub mod context;
pub mod engine;
pub mod sink;

pub use context::MetricContext;
pub use engine::{evolve_step, EvolutionEngine};
pub use sink::{EvolutionEvent, EvolutionSink, MemorySink, TracingSink};

use crate::dsl::ast::Organism;
use serde::{Deserialize, Serialize};

/// Point-in-time summary of an organism's evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionStatus {
    pub generation: u64,
    pub fitness: f64,
    pub consciousness: f64,
    pub mutation_count: u64,
    pub active_gene_count: usize,
    pub consciousness_target: f64,
    pub consciousness_achieved: bool,
}

impl Organism {
    pub fn status(&self) -> EvolutionStatus {
        EvolutionStatus {
            generation: self.generation,
            fitness: self.fitness,
            consciousness: self.consciousness,
            mutation_count: self.mutation_count,
            active_gene_count: self.genes.iter().filter(|g| g.active).count(),
            consciousness_target: self.dna.consciousness_target,
            consciousness_achieved: self.consciousness >= self.dna.consciousness_target,
        }
    }
}
