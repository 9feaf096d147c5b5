mod common;

use dna_lang::{
    parse, DnaError, EvolutionRate, MutationMethod, RollbackStrategy, SafetyCheck, SecurityLevel,
};

#[test]
fn test_sentinel_parses() {
    let source = common::read_file("tests/samples/sentinel.dna");
    let organism = parse(&source).unwrap();

    assert_eq!(organism.name, "Sentinel");
    assert_eq!(organism.dna.domain, "infrastructure");
    assert_eq!(organism.dna.security_level, SecurityLevel::High);
    assert_eq!(organism.dna.evolution_rate, EvolutionRate::Fast);
    assert_eq!(organism.dna.consciousness_target, 0.3);
    assert_eq!(organism.dna.fitness_threshold, 0.8);

    let names: Vec<_> = organism.genes.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Monitor", "Reflect", "Dormant"]);
    assert_eq!(organism.genes[0].dependencies, vec!["Alerting"]);
    assert!(!organism.genes[2].active);
    assert_eq!(
        organism.gene("Reflect").map(|g| g.expression_level),
        Some(0.6)
    );

    let deepen = &organism.genes[1].mutations[0];
    assert_eq!(
        deepen.methods,
        vec![
            MutationMethod::IncreaseIntrospection,
            MutationMethod::EnhanceMetaCognition
        ]
    );
    assert_eq!(deepen.safety_check, Some(SafetyCheck::ConsciousnessLevel));
    assert_eq!(deepen.rollback_strategy, RollbackStrategy::Immediate);
    assert_eq!(
        organism.genes[0].mutations[0].rollback_strategy,
        RollbackStrategy::GradualRollback
    );
    assert!(organism.genes[1].collaboration.is_some());

    assert_eq!(organism.agents.len(), 2);
    assert_eq!(organism.agents[0].agent_type, "HealthProbe");
    assert_eq!(
        organism.agents[0].parameters.get("endpoint").map(String::as_str),
        Some("/healthz")
    );

    let collaboration = organism.collaboration.unwrap();
    assert_eq!(collaboration.participants, vec!["probe", "scribe"]);
    assert_eq!(collaboration.workflow.unwrap().steps.len(), 2);
}

#[test]
fn test_single_gene_parses() {
    let source = common::read_file("tests/samples/single_gene.dna");
    let organism = parse(&source).unwrap();
    assert_eq!(organism.genes.len(), 1);
    assert_eq!(organism.genes[0].mutations[0].name, "M");
}

#[test]
fn test_empty_organism_defaults() {
    let organism = parse("ORGANISM X {}").unwrap();
    assert_eq!(organism.dna.domain, "general");
    assert_eq!(organism.dna.security_level, SecurityLevel::Medium);
    assert_eq!(organism.dna.evolution_rate, EvolutionRate::Adaptive);
    assert!(organism.dna.immune_system);
    assert_eq!(organism.dna.consciousness_target, 0.0);
    assert_eq!(organism.dna.fitness_threshold, 0.5);
    assert!(organism.genes.is_empty());
    assert!(organism.agents.is_empty());
    assert_eq!(organism.fitness, 0.5);
    assert_eq!(organism.consciousness, 0.0);
    assert_eq!(organism.generation, 1);
}

#[test]
fn test_bogus_security_level() {
    let result = parse(r#"ORGANISM X { DNA { security_level: "bogus" } }"#);
    match result {
        Err(DnaError::Configuration { field, value }) => {
            assert_eq!(field, "security_level");
            assert_eq!(value, "bogus");
        }
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[test]
fn test_syntax_error_reports_location() {
    let err = parse("ORGANISM X { GENOME { GENE { } } }").unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Syntax error:"));
    assert!(message.contains(">>>{<<<"));
}
