//! `dnalang check`: parse and report problems without evolving.

use anyhow::Result;
use dna_lang::{parse_with, Config, MutationMethod, Organism};
use tracing::warn;

pub fn run(source: &str, config: &Config, label: &str) -> Result<()> {
    let organism = parse_with(source, &config.parse_options())?;
    let warnings = lint(&organism);

    let mutations: usize = organism.genes.iter().map(|g| g.mutations.len()).sum();
    println!(
        "{}: ok ({} gene(s), {} mutation(s), {} warning(s))",
        label,
        organism.genes.len(),
        mutations,
        warnings
    );
    Ok(())
}

/// Warn about mutations that can never fire or always fail. Returns the
/// number of warnings.
pub fn lint(organism: &Organism) -> usize {
    let mut warnings = 0;
    for gene in &organism.genes {
        for mutation in &gene.mutations {
            if mutation.trigger_conditions.is_empty() {
                warn!(gene = %gene.name, mutation = %mutation.name, "mutation has no trigger conditions and never fires");
                warnings += 1;
            }
            for method in &mutation.methods {
                if let MutationMethod::Unrecognized(name) = method {
                    warn!(gene = %gene.name, mutation = %mutation.name, method = %name, "unrecognized method, mutation will always fail");
                    warnings += 1;
                }
            }
        }
    }
    warnings
}
