//! Two devices editing the same mind map offline, then reconciling.
//!
//! Demonstrates fast-forward, conflict detection and resolution.
//!
//! Run with: cargo run --example two_devices

use flowstate::merge::Choice;
use flowstate::storage::MemoryStore;
use flowstate::{ClientId, MergeOutcome, NewEdge, NewNode, NodeUpdate, StateManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Flowstate Two Devices Example");
    println!("=============================\n");

    let mut laptop = StateManager::new(ClientId::new("laptop"), MemoryStore::new());
    laptop.load_state().await?;
    let idea = laptop.add_node(NewNode::new().with_data("label", "Idea").at(200.0, 0.0))?;
    laptop.add_edge(NewEdge::new("root", idea.id.clone()))?;
    println!("Laptop vector: {}", laptop.get_state().version_vector);

    // The phone syncs once, then both go offline.
    let mut phone = StateManager::new(ClientId::new("phone"), MemoryStore::new());
    phone.load_state().await?;
    match phone.merge_state(laptop.get_state().clone()).await? {
        MergeOutcome::Conflict(conflicts) => {
            // A fresh phone graph is concurrent with everything; take the laptop's.
            phone.apply_resolution(conflicts.keep_remote().with_remote_additions(&conflicts))?;
        }
        outcome => println!("Phone merge: {:?}", outcome),
    }
    println!("Phone vector:  {}", phone.get_state().version_vector);

    let mut renamed = idea.data.clone();
    renamed.insert("label".into(), "Idea (laptop)".into());
    laptop.update_node(&idea.id, NodeUpdate::new().data(renamed))?;

    let mut renamed = idea.data.clone();
    renamed.insert("label".into(), "Idea (phone)".into());
    phone.update_node(&idea.id, NodeUpdate::new().data(renamed))?;

    println!("\nBack online, laptop receives the phone's copy:");
    let outcome = laptop.merge_state(phone.get_state().clone()).await?;
    if let Some(conflicts) = outcome.conflict() {
        for item in &conflicts.conflicting_nodes {
            println!(
                "  {} local={:?} remote={:?}",
                item.local.id, item.local.data["label"], item.remote.data["label"]
            );
        }
        let resolution = conflicts.resolve(|_| Choice::Remote, |_| Choice::Local);
        let applied = laptop.apply_resolution(resolution)?;
        println!("  applied {} resolved entities", applied);
    }

    println!("\nPhone receives the resolved copy:");
    let outcome = phone.merge_state(laptop.get_state().clone()).await?;
    println!("  outcome: {:?}", outcome.causality());
    println!("  laptop vector: {}", laptop.get_state().version_vector);
    println!("  phone vector:  {}", phone.get_state().version_vector);

    laptop.flush().await?;
    phone.flush().await?;
    Ok(())
}
