//! Adaptive-MIPI radio simulation
//!
//! Boots a panel context from a JSON device tree, then replays a scenario of
//! cell reports through the debug injector and prints each panel's clock.
//!
//! Run with:
//!   cargo run -p usdm --example radio_sim --features emulator
//!   cargo run -p usdm --example radio_sim --features emulator -- <tree.json> <scenario.json>
//!
//! `RUST_LOG=adaptive_mipi=debug` adds the per-cell score breakdown.

#![allow(clippy::print_stdout)]

use platform::config;
use platform::devtree_local::DeviceTree;
use ril_bridge::{CellReport, RadioBus};
use tracing_subscriber::EnvFilter;
use usdm::{PanelContext, SimulatedPanel, BUS_CAPACITY};

const DEFAULT_TREE: &str = include_str!("../tests/fixtures/display.json");
const DEFAULT_SCENARIO: &str = include_str!("../assets/scenario.json");
const NAMES: [&str; config::MAX_PANELS] = ["panel0", "panel1", "panel2", "panel3"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("{} v{}", config::sim_banner(), config::SUBSYSTEM_VERSION);

    let mut args = std::env::args().skip(1);
    let tree = match args.next() {
        Some(path) => DeviceTree::from_json_file(path)?,
        None => DeviceTree::from_json_str(DEFAULT_TREE)?,
    };
    let scenario: Vec<Vec<CellReport>> = match args.next() {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => serde_json::from_str(DEFAULT_SCENARIO)?,
    };

    let mut ctx: PanelContext<SimulatedPanel> = PanelContext::default();
    let probed = ctx.probe_children(&tree.root(), |i| {
        SimulatedPanel::new(NAMES.get(i).copied().unwrap_or("panel"))
    })?;
    println!("{probed} panels probed\n");
    for entry in ctx.registry().panels() {
        println!("[{}] {}\n{}", entry.name(), entry.feature().variant(), entry.feature());
    }

    let (registry, injector) = ctx.split();
    let mut bus: RadioBus<'_, BUS_CAPACITY> = RadioBus::new();
    let registration = registry.register(&mut bus)?;

    for (step, cells) in scenario.iter().enumerate() {
        injector.clear();
        for cell in cells {
            injector.push(*cell)?;
        }
        let consumed = injector.fire(&bus);
        println!("step {step}: {} cells, {consumed} panels switched", cells.len());
        for entry in registry.panels() {
            let panel = entry.feature().panel();
            match panel.last_applied() {
                Some(p) => println!(
                    "  {:8} dsi {:>9} osc {:>6} ({} hops)",
                    panel.name(),
                    p.dsi_freq,
                    p.osc_freq,
                    panel.apply_count()
                ),
                None => println!("  {:8} unchanged", panel.name()),
            }
        }
    }

    registry.remove(&mut bus, registration)?;
    println!("\nlisteners removed");
    Ok(())
}
