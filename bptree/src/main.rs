#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use bptree::config::SimulationSettings;
use bptree::simulation::{Simulator, SimulatorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bptree=info,bptree_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let settings = match SimulationSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: seed={}, operations={}, key_space={}, fanout={}",
        settings.seed,
        settings.operations,
        settings.key_space,
        settings.tree.fanout()
    );

    let mut simulator = Simulator::new(SimulatorConfig::from_settings(&settings));
    let result = simulator.run(settings.operations);
    let stats = simulator.history().stats();

    tracing::info!(
        "Applied {} operations: {} inserts, {} updates, {} removals ({} missed), {} lookups, {} clears; {} entries remain",
        result.operations_applied,
        stats.inserts,
        stats.updates,
        stats.removals,
        stats.missed_removals,
        stats.lookups,
        stats.clears,
        result.final_len
    );

    if let Some(error) = &result.error {
        tracing::error!("Simulation with seed {} panicked: {error}", result.seed);
        std::process::exit(1);
    }
    if !result.passed() {
        for violation in &result.invariant_violations {
            tracing::error!(
                "operation {}: {} ({})",
                violation.operation_index,
                violation.description,
                violation.context
            );
        }
        tracing::error!(
            "Simulation with seed {} found {} violations",
            result.seed,
            result.invariant_violations.len()
        );
        std::process::exit(1);
    }

    tracing::info!("Simulation with seed {} passed", result.seed);
}
