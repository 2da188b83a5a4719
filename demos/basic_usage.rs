//! Basic usage example of the IIT library.
//!
//! This example demonstrates how to build a small network and compute its
//! integrated information (Φ) and cause-effect structure.

use iit::{feedforward_system, fully_connected_system, IITSystem, IITSystemBuilder, Result};

fn main() -> Result<()> {
    println!("=== IIT Library Basic Usage ===\n");

    println!("Example 1: 3-node fully connected system");
    println!("{}", "-".repeat(50));

    let mut system = fully_connected_system(3);
    system.set_state(vec![1, 0, 1]);

    let phi = system.calculate_phi()?;
    println!("State: {:?}", system.state());
    println!("Phi = {:.4}", phi);
    println!();

    println!("Example 2: Using the builder pattern");
    println!("{}", "-".repeat(50));

    let system = IITSystemBuilder::new()
        .nodes(2)
        .connect(0, 1)
        .connect(1, 0)
        .state(vec![1, 1])
        .build();

    let mip = system.analyze()?;
    println!("State: {:?}", system.state());
    println!("Phi = {:.4}", mip.phi);
    println!("Winning cut: {:?}", mip.cut);
    println!();

    println!("Example 3: Identifying concepts");
    println!("{}", "-".repeat(50));

    let mut system = IITSystem::new(3);
    for i in 0..3 {
        for j in 0..3 {
            if i != j {
                system.set_connection(i, j, true);
            }
        }
    }
    system.set_state(vec![1, 1, 0]);

    let ces = system.identify_concepts()?;
    println!("Total concepts: {}", ces.len());
    for concept in &ces.concepts {
        println!("  Mechanism {:?}: phi = {:.4}", concept.mechanism, concept.phi);
    }
    println!();

    println!("Example 4: Feedforward vs recurrent networks");
    println!("{}", "-".repeat(50));

    let mut ff_system = feedforward_system(4);
    ff_system.set_state(vec![1, 1, 1, 0]);
    let ff_phi = ff_system.calculate_phi()?;

    let mut rec_system = feedforward_system(4);
    rec_system.set_connection(3, 0, true);
    rec_system.set_state(vec![1, 1, 1, 0]);
    let rec_phi = rec_system.calculate_phi()?;

    println!("Feedforward Phi: {:.4}", ff_phi);
    println!("Recurrent Phi: {:.4}", rec_phi);
    println!();

    println!("Example 5: Exploring all states of a 3-node system");
    println!("{}", "-".repeat(50));
    println!("State  | Phi");
    println!("-------|-------");

    let mut system = fully_connected_system(3);
    for state_idx in 0..8 {
        let state = vec![(state_idx >> 2) & 1, (state_idx >> 1) & 1, state_idx & 1];
        system.set_state(state.clone());
        let phi = system.calculate_phi()?;
        println!("{:?} | {:.4}", state, phi);
    }

    println!("\n=== Examples completed successfully! ===");
    Ok(())
}
