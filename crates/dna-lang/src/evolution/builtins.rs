//! Built-in mutation methods and safety checks
//!
//! Every scalar a method touches stays within `[0, 1]`.

use crate::dsl::ast::{MutationMethod, Organism, SafetyCheck};

fn bump(value: &mut f64, delta: f64) {
    *value = (*value + delta).clamp(0.0, 1.0);
}

impl MutationMethod {
    /// Run the method against `organism`, on behalf of the gene at
    /// `gene_index`. Returns `false` for names outside the built-in set,
    /// leaving the organism untouched.
    pub fn apply(&self, organism: &mut Organism, gene_index: usize) -> bool {
        match self {
            MutationMethod::Optimize => bump(&mut organism.fitness, 0.05),
            MutationMethod::Adapt => {
                bump(&mut organism.fitness, 0.03);
                bump(&mut organism.consciousness, 0.02);
            }
            MutationMethod::Scale => {
                if let Some(gene) = organism.genes.get_mut(gene_index) {
                    gene.expression_level = (gene.expression_level * 1.1).min(1.0);
                }
            }
            MutationMethod::IncreaseIntrospection => bump(&mut organism.consciousness, 0.05),
            MutationMethod::EnhanceMetaCognition => bump(&mut organism.consciousness, 0.03),
            MutationMethod::AdjustLearningRate => bump(&mut organism.fitness, 0.02),
            MutationMethod::RefinePatterns => {
                bump(&mut organism.fitness, 0.01);
                bump(&mut organism.consciousness, 0.01);
            }
            MutationMethod::Unrecognized(_) => return false,
        }
        true
    }
}

impl SafetyCheck {
    pub fn passes(&self, organism: &Organism) -> bool {
        match self {
            SafetyCheck::ConsciousnessLevel => organism.consciousness < 1.0,
            SafetyCheck::FitnessLevel => organism.fitness > 0.1,
            SafetyCheck::Other(name) => {
                tracing::debug!(check = %name, "unknown safety check treated as passing");
                true
            }
        }
    }
}
