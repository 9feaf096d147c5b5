//! `dnalang parse`: print the parsed organism.

use anyhow::Result;
use dna_lang::{parse_with, Config, Organism};

pub fn run(source: &str, config: &Config, json: bool) -> Result<()> {
    let organism = parse_with(source, &config.parse_options())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&organism)?);
    } else {
        print_summary(&organism);
    }
    Ok(())
}

fn print_summary(organism: &Organism) {
    println!("Organism: {}", organism.name);
    println!(
        "  DNA: domain={} security={:?} rate={:?} immune={} target={} threshold={}",
        organism.dna.domain,
        organism.dna.security_level,
        organism.dna.evolution_rate,
        organism.dna.immune_system,
        organism.dna.consciousness_target,
        organism.dna.fitness_threshold
    );

    println!("  Genes: {}", organism.genes.len());
    for gene in &organism.genes {
        let state = if gene.is_expressed() { "expressed" } else { "silent" };
        println!(
            "    {} ({}, expression {}): {} mutation(s)",
            gene.name,
            state,
            gene.expression_level,
            gene.mutations.len()
        );
        for mutation in &gene.mutations {
            let methods: Vec<_> = mutation.methods.iter().map(|m| m.name()).collect();
            println!(
                "      {} [{} condition(s)] -> {}",
                mutation.name,
                mutation.trigger_conditions.len(),
                methods.join(", ")
            );
        }
    }

    if !organism.agents.is_empty() {
        println!("  Agents: {}", organism.agents.len());
        for agent in &organism.agents {
            println!("    {}: {}", agent.name, agent.agent_type);
        }
    }

    if let Some(collaboration) = &organism.collaboration {
        println!(
            "  Collaboration: {} participant(s)",
            collaboration.participants.len()
        );
        if let Some(workflow) = &collaboration.workflow {
            println!(
                "    Workflow {}: {} step(s)",
                workflow.name.as_deref().unwrap_or("<unnamed>"),
                workflow.steps.len()
            );
        }
    }
}
