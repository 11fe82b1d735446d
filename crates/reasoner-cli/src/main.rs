//! Demo binary: wires a [`reasoner_core::Session`] together from a
//! hard-coded theory and walks it through `learn`, `query`, `prove` and
//! `inspect`, logging each step. Exists to give a host a worked example of
//! embedding the crate, not as a general-purpose runtime.

use anyhow::{Context, Result};
use reasoner_core::algebra::StrategyId;
use reasoner_core::config::{ReasoningPriority, SessionConfig};
use reasoner_core::statement::{ParsedArg, ParsedAtomPattern, ParsedStatement, Polarity, RelationProperty};
use reasoner_core::Session;
use tracing::info;

fn fact(operator: &str, args: &[&str]) -> ParsedStatement {
    ParsedStatement::Fact {
        operator: operator.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        polarity: Polarity::Asserted,
    }
}

fn declare(operator: &str, property: RelationProperty) -> ParsedStatement {
    ParsedStatement::Declare {
        operator: operator.to_string(),
        property,
    }
}

fn pattern(operator: &str, args: &[ParsedArg]) -> ParsedAtomPattern {
    ParsedAtomPattern {
        operator: operator.to_string(),
        args: args.to_vec(),
    }
}

fn const_pattern(operator: &str, args: &[&str]) -> ParsedAtomPattern {
    pattern(operator, &args.iter().map(|a| ParsedArg::Const(a.to_string())).collect::<Vec<_>>())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = SessionConfig::new(16_384, StrategyId::DenseBipolar, ReasoningPriority::Symbolic);
    let mut session = Session::new("animal-kingdom", config);

    load_fixtures(&mut session).context("loading demo fixtures")?;

    let snapshot = session.inspect();
    info!(
        facts = snapshot.fact_count,
        rules = snapshot.rule_count,
        vocabulary = snapshot.vocabulary_size,
        "fixtures loaded"
    );

    let proof = session.prove(&const_pattern("isA", &["dog", "livingThing"]))?;
    info!(valid = proof.valid, confidence = proof.confidence, steps = proof.steps.len(), "prove isA(dog, livingThing)");

    let results = session.query(&pattern(
        "sell",
        &[ParsedArg::Var("Who".to_string()), ParsedArg::Const("book".to_string()), ParsedArg::Var("To".to_string())],
    ))?;
    info!(matches = results.len(), "query sell(?Who, book, ?To)");

    let flight_proof = session.prove(&const_pattern("can", &["penguin", "fly"]))?;
    info!(valid = flight_proof.valid, "prove can(penguin, fly)");

    let stats = session.stats();
    info!(
        queries = stats.queries.get(),
        proofs = stats.proofs.get(),
        transitive_steps = stats.transitive_steps.get(),
        "session stats"
    );

    session.close();
    Ok(())
}

/// A small animal-taxonomy theory exercising transitive `isA`, property
/// inheritance with an explicit-negation override, a Horn rule over a
/// compound antecedent, and a multi-hole fact pattern.
fn load_fixtures(session: &mut Session) -> Result<()> {
    session.learn(declare("isA", RelationProperty::Transitive))?;
    session.learn(declare("isA", RelationProperty::Inheritable))?;
    session.learn(declare("can", RelationProperty::Inheritable))?;

    session.learn(fact("isA", &["dog", "animal"]))?;
    session.learn(fact("isA", &["animal", "livingThing"]))?;
    session.learn(fact("isA", &["penguin", "bird"]))?;
    session.learn(fact("can", &["bird", "fly"]))?;
    session.learn(ParsedStatement::Fact {
        operator: "can".to_string(),
        args: vec!["penguin".to_string(), "fly".to_string()],
        polarity: Polarity::Negated,
    })?;

    session.learn(fact("isA", &["sally", "yumpus"]))?;
    session.learn(fact("isA", &["sally", "rompus"]))?;
    session.learn(ParsedStatement::Rule {
        premises: vec![
            pattern("isA", &[ParsedArg::Var("X".to_string()), ParsedArg::Const("yumpus".to_string())]),
            pattern("isA", &[ParsedArg::Var("X".to_string()), ParsedArg::Const("rompus".to_string())]),
        ],
        conclusion: pattern("isA", &[ParsedArg::Var("X".to_string()), ParsedArg::Const("tumpus".to_string())]),
        confidence: 1.0,
    })?;

    session.learn(fact("sell", &["alice", "book", "bob"]))?;
    session.learn(fact("sell", &["carol", "car", "dave"]))?;

    Ok(())
}
