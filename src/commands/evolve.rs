//! `dnalang evolve`: run the evolution loop.
//!
//! The engine only advances one generation at a time; stopping is decided
//! here, on the consciousness target or the configured generation cap.

use anyhow::Result;
use dna_lang::{parse_with, Config, EngineConfig, EvolutionEngine, EvolutionSink, Organism};
use tracing::info;

pub fn run(source: &str, config: &Config, json: bool) -> Result<()> {
    let mut organism = parse_with(source, &config.parse_options())?;
    let mut engine = EvolutionEngine::new(config.engine.clone());

    info!(
        organism = %organism.name,
        target = organism.dna.consciousness_target,
        cap = config.engine.max_generations,
        "starting evolution"
    );

    let steps = drive(&mut organism, &mut engine, &config.engine);

    let status = engine.status(&organism);
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    for line in &organism.evolution_log {
        println!("{}", line);
    }
    println!();
    println!("Organism:       {}", organism.name);
    println!("Generations run: {}", steps);
    println!("Generation:     {}", status.generation);
    println!("Fitness:        {:.4}", status.fitness);
    println!(
        "Consciousness:  {:.4} / {:.4}{}",
        status.consciousness,
        status.consciousness_target,
        if status.consciousness_achieved {
            " (achieved)"
        } else {
            ""
        }
    );
    println!("Mutations:      {}", status.mutation_count);
    println!("Active genes:   {}", status.active_gene_count);
    Ok(())
}

/// Step `organism` until the target is reached (when `stop_on_target`) or
/// `max_generations` steps have run. Returns the number of steps taken.
pub fn drive<S: EvolutionSink>(
    organism: &mut Organism,
    engine: &mut EvolutionEngine<S>,
    config: &EngineConfig,
) -> u64 {
    let mut steps = 0;
    while steps < config.max_generations {
        if config.stop_on_target && organism.status().consciousness_achieved {
            break;
        }
        engine.evolve_step(organism);
        steps += 1;
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use dna_lang::{parse, MemorySink};

    const GROWER: &str = r#"
    ORGANISM Grower {
        DNA { consciousness_target: 0.2 }
        GENOME {
            GENE Mind {
                MUTATIONS {
                    think {
                        trigger_conditions: [{metric: "consciousness", operator: "<", value: 1.0}]
                        methods: ["increaseIntrospection"]
                    }
                }
            }
        }
    }
    "#;

    fn run_with(source: &str, config: &EngineConfig) -> (Organism, u64) {
        let mut organism = parse(source).unwrap();
        let mut engine = EvolutionEngine::with_sink(config.clone(), MemorySink::new());
        let steps = drive(&mut organism, &mut engine, config);
        (organism, steps)
    }

    #[test]
    fn test_stops_at_target() {
        let config = EngineConfig::default();
        let (organism, steps) = run_with(GROWER, &config);

        assert!(organism.status().consciousness_achieved);
        assert!(steps > 0 && steps < config.max_generations);
        assert_eq!(organism.generation, steps + 1);
    }

    #[test]
    fn test_runs_to_cap_without_stop_on_target() {
        let config = EngineConfig {
            max_generations: 12,
            stop_on_target: false,
            ..EngineConfig::default()
        };
        let (organism, steps) = run_with(GROWER, &config);

        assert_eq!(steps, 12);
        assert_eq!(organism.generation, 13);
        assert!(organism.status().consciousness_achieved);
    }

    #[test]
    fn test_target_already_met_runs_nothing() {
        let source = "ORGANISM Idle { DNA { consciousness_target: 0.0 } }";
        let (organism, steps) = run_with(source, &EngineConfig::default());

        assert_eq!(steps, 0);
        assert_eq!(organism.generation, 1);
    }

    #[test]
    fn test_cap_bounds_unreachable_target() {
        let source = "ORGANISM Stuck { DNA { consciousness_target: 0.9 } }";
        let config = EngineConfig {
            max_generations: 5,
            ..EngineConfig::default()
        };
        let (organism, steps) = run_with(source, &config);

        assert_eq!(steps, 5);
        assert!(!organism.status().consciousness_achieved);
    }
}
