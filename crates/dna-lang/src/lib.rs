//! DNA-Lang core
//!
//! Parses organism descriptions (`ORGANISM name { DNA { .. } GENOME { .. } .. }`)
//! into a typed model and evolves them generation by generation.
//!
//! ```no_run
//! use dna_lang::{parse, EvolutionEngine};
//!
//! let mut organism = parse("ORGANISM Demo { DNA { consciousness_target: 0.5 } }")?;
//! let mut engine = EvolutionEngine::default();
//! while !organism.status().consciousness_achieved {
//!     engine.evolve_step(&mut organism);
//! }
//! # Ok::<(), dna_lang::DnaError>(())
//! ```

pub mod config;
pub mod dsl;
pub mod error;
pub mod evolution;

pub use config::{Config, ConfigError, EngineConfig, LogFormat, LoggingConfig, ParserConfig};
pub use dsl::{
    parse, parse_with, tokenize, Agent, Collaboration, Condition, Dna, EvolutionRate, Gene,
    Mutation, MutationMethod, Operator, Organism, ParseOptions, RollbackStrategy, SafetyCheck,
    SecurityLevel, Token, Value, Workflow, WorkflowStep,
};
pub use error::{DnaError, Result, SyntaxError};
pub use evolution::{
    evolve_step, EvolutionEngine, EvolutionEvent, EvolutionSink, EvolutionStatus, MemorySink,
    MetricContext, TracingSink,
};
