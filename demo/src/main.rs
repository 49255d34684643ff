//! FIDES Trust Engine — Demo CLI
//!
//! Runs one or all of the three trust-lifecycle scenarios. Each scenario
//! wires real FIDES components (engine, in-memory store, event
//! subscriptions) and drives them with synthetic agent behavior.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- earn-trust
//!   cargo run -p demo -- failure-spiral
//!   cargo run -p demo -- hard-tasks

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fides_contracts::{
    entity::EntityId, error::FidesResult, event::TrustEvent, signal::TrustSignal, tier::TrustTier,
};
use fides_engine::{EngineConfig, TrustEngine};
use fides_store::InMemoryTrustStore;

// ── CLI definition ────────────────────────────────────────────────────────────

/// FIDES — behavioral trust runtime demo.
///
/// Each subcommand runs one or all of the three trust scenarios,
/// demonstrating signal-driven scoring, tier transitions, failure
/// clustering, and complexity-aware decay dampening.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "FIDES trust engine demo",
    long_about = "Runs FIDES trust engine scenarios showing recency-weighted scoring,\n\
                  tier promotion and demotion, accelerated decay under failure\n\
                  clustering, and complexity-earned decay dampening."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: an agent earns its way from Provisional to Standard.
    EarnTrust,
    /// Scenario 2: clustered failures trigger accelerated decay.
    FailureSpiral,
    /// Scenario 3: hard-task successes slow an agent's decay.
    HardTasks,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging. Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::EarnTrust => run_earn_trust(),
        Command::FailureSpiral => run_failure_spiral(),
        Command::HardTasks => run_hard_tasks(),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> FidesResult<()> {
    run_earn_trust()?;
    run_failure_spiral()?;
    run_hard_tasks()?;
    Ok(())
}

/// Build an engine with an in-memory store and a wildcard subscriber that
/// prints every emitted event.
fn build_engine() -> TrustEngine {
    let engine = TrustEngine::new(EngineConfig::default())
        .with_store(Box::new(InMemoryTrustStore::new()));
    engine.subscribe_all(|event| println!("    event: {}", describe(event)));
    engine
}

fn run_earn_trust() -> FidesResult<()> {
    println!("Scenario 1: earning trust");
    println!("-------------------------");

    let engine = build_engine();
    let agent = EntityId::from("research-agent");
    engine.initialize_entity(agent.clone(), TrustTier::Provisional)?;

    for task in ["summarize", "classify", "extract", "review", "plan"] {
        let signal = TrustSignal::new(
            agent.clone(),
            format!("behavioral.{}", task).parse()?,
            0.9,
            Utc::now(),
        );
        engine.record_signal(signal)?;
    }

    let record = engine
        .get_score(&agent)?
        .expect("record exists after signals");
    println!(
        "  {} finished at score {} ({})",
        agent, record.score, record.level
    );
    println!();
    engine.close()
}

fn run_failure_spiral() -> FidesResult<()> {
    println!("Scenario 2: failure spiral");
    println!("--------------------------");

    let engine = build_engine();
    let agent = EntityId::from("flaky-agent");
    engine.initialize_entity(agent.clone(), TrustTier::Standard)?;

    for _ in 0..3 {
        let signal =
            TrustSignal::new(agent.clone(), "behavioral.error".parse()?, 0.1, Utc::now());
        engine.record_signal(signal)?;
    }

    println!(
        "  failures in window: {}, accelerated decay: {}",
        engine.failure_count(&agent),
        engine.is_accelerated_decay_active(&agent)
    );
    let record = engine.get_score(&agent)?.expect("record exists");
    println!(
        "  {} now at score {} ({})",
        agent, record.score, record.level
    );
    println!();
    engine.close()
}

fn run_hard_tasks() -> FidesResult<()> {
    println!("Scenario 3: hard tasks dampen decay");
    println!("-----------------------------------");

    let engine = build_engine();
    let agent = EntityId::from("veteran-agent");
    engine.initialize_entity(agent.clone(), TrustTier::Trusted)?;

    for _ in 0..5 {
        engine.record_task_complexity(&agent, 5, true, Some("migration".to_string()))?;
    }

    println!(
        "  complexity bonus after 5 hard successes: {:.2}",
        engine.complexity_bonus(&agent)
    );
    if let Some(stats) = engine.complexity_stats(&agent) {
        println!(
            "  tasks: {}, success rate: {:.0}%, avg complexity: {:.1}",
            stats.task_count,
            stats.success_rate * 100.0,
            stats.average_complexity
        );
    }
    println!("  decay rate shrinks by the bonus: effective = base × (1 − bonus)");
    println!();
    engine.close()
}

// ── Event rendering ───────────────────────────────────────────────────────────

fn describe(event: &TrustEvent) -> String {
    match event {
        TrustEvent::Initialized {
            entity_id,
            level,
            score,
            ..
        } => {
            format!("{} initialized at {} (score {})", entity_id, level, score)
        }
        TrustEvent::SignalRecorded {
            entity_id,
            kind,
            new_score,
            ..
        } => {
            format!("{} signal {} → score {}", entity_id, kind, new_score)
        }
        TrustEvent::ScoreChanged {
            entity_id,
            delta,
            new_score,
            ..
        } => {
            format!("{} score changed by {} to {}", entity_id, delta, new_score)
        }
        TrustEvent::TierChanged {
            entity_id,
            previous_level,
            new_level,
            ..
        } => {
            format!("{} tier {} → {}", entity_id, previous_level, new_level)
        }
        TrustEvent::DecayApplied {
            entity_id,
            previous_score,
            new_score,
            periods,
            ..
        } => {
            format!(
                "{} decayed {} → {} over {} periods",
                entity_id, previous_score, new_score, periods
            )
        }
        TrustEvent::FailureDetected {
            entity_id,
            failure_count,
            accelerated,
            ..
        } => {
            format!(
                "{} failure #{} (accelerated: {})",
                entity_id, failure_count, accelerated
            )
        }
    }
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("FIDES — Behavioral Trust Runtime");
    println!("Trust Engine Demo");
    println!("================================");
    println!();
    println!("FIDES scoring pipeline per signal:");
    println!("  [1] Signal routed to its component (behavioral / compliance / identity / context)");
    println!("  [2] Recency-weighted component averages → weighted 0–1000 score");
    println!("  [3] Tier derived from the score band; transitions emit events");
    println!("  [4] Below-threshold signals cluster toward accelerated decay");
    println!("  [5] Decay applied lazily on read, dampened by hard-task success");
    println!();
}
