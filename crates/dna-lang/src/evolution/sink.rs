//! Evolution event sinks
//!
//! The engine reports what happened during a step through an explicit sink
//! handed to it at construction, never through global logger state.

use serde::{Deserialize, Serialize};

/// Something notable that happened while evolving an organism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EvolutionEvent {
    MutationApplied {
        generation: u64,
        gene: String,
        mutation: String,
    },
    SafetyCheckFailed {
        generation: u64,
        gene: String,
        mutation: String,
        check: String,
    },
    UnknownMethod {
        generation: u64,
        gene: String,
        mutation: String,
        method: String,
    },
    RolledBack {
        generation: u64,
        gene: String,
        mutation: String,
    },
    GenerationCompleted {
        generation: u64,
        fitness: f64,
        consciousness: f64,
        triggered: usize,
        applied: usize,
    },
}

/// Receiver for evolution events.
pub trait EvolutionSink {
    fn record(&mut self, event: &EvolutionEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EvolutionSink for TracingSink {
    fn record(&mut self, event: &EvolutionEvent) {
        match event {
            EvolutionEvent::MutationApplied {
                generation,
                gene,
                mutation,
            } => {
                tracing::info!(generation, gene = %gene, mutation = %mutation, "mutation applied");
            }
            EvolutionEvent::SafetyCheckFailed {
                generation,
                gene,
                mutation,
                check,
            } => {
                tracing::warn!(
                    generation,
                    gene = %gene,
                    mutation = %mutation,
                    check = %check,
                    "safety check failed, mutation skipped"
                );
            }
            EvolutionEvent::UnknownMethod {
                generation,
                gene,
                mutation,
                method,
            } => {
                tracing::warn!(
                    generation,
                    gene = %gene,
                    mutation = %mutation,
                    method = %method,
                    "unrecognized method, mutation failed"
                );
            }
            EvolutionEvent::RolledBack {
                generation,
                gene,
                mutation,
            } => {
                tracing::warn!(generation, gene = %gene, mutation = %mutation, "mutation rolled back");
            }
            EvolutionEvent::GenerationCompleted {
                generation,
                fitness,
                consciousness,
                triggered,
                applied,
            } => {
                tracing::info!(
                    generation,
                    fitness,
                    consciousness,
                    triggered,
                    applied,
                    "generation completed"
                );
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Vec<EvolutionEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[EvolutionEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EvolutionSink for MemorySink {
    fn record(&mut self, event: &EvolutionEvent) {
        self.events.push(event.clone());
    }
}

impl<S: EvolutionSink + ?Sized> EvolutionSink for Box<S> {
    fn record(&mut self, event: &EvolutionEvent) {
        (**self).record(event);
    }
}

impl<S: EvolutionSink + ?Sized> EvolutionSink for &mut S {
    fn record(&mut self, event: &EvolutionEvent) {
        (**self).record(event);
    }
}
