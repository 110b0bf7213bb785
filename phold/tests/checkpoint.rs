//! Checkpoint/restore must leave future behavior untouched.

mod common;

use common::{RecordingKernel, incoming, init_tracing};
use phold::{
    CheckpointCodec, DelayModel, GridWorld, LinkSlots, MovementKind, MovementPolicy, NodeConfig,
    PholdNode, PayloadConfig, WorldSnapshot,
};

fn config(movement: MovementKind, delay: DelayModel) -> NodeConfig {
    NodeConfig {
        movement,
        delay,
        event_density: 1.5,
        payload: PayloadConfig {
            small_size: 8,
            large_size: 512,
            large_fraction: 0.3,
        },
        ..NodeConfig::at(3, 4, 6, 7)
    }
}

fn boundary_slots() -> LinkSlots {
    let mut present = vec![true; 9];
    present[0] = false;
    present[3] = false;
    present[6] = false;
    LinkSlots::new(present).unwrap()
}

/// Drive `node` with `count` events and return what it sent.
fn drive(node: &mut PholdNode, count: usize) -> RecordingKernel {
    let mut kernel = RecordingKernel::default();
    for step in 0..count {
        kernel.now = step as u64 * 1_000;
        node.handle_event(incoming(8), &mut kernel);
    }
    kernel
}

fn assert_twin_behavior(movement: MovementKind, delay: DelayModel) {
    let cfg = config(movement, delay);
    let mut original = PholdNode::new(&cfg, boundary_slots()).unwrap();
    let mut twin = PholdNode::new(&cfg, boundary_slots()).unwrap();

    let mut setup_a = RecordingKernel::default();
    let mut setup_b = RecordingKernel::default();
    original.setup(&mut setup_a);
    twin.setup(&mut setup_b);
    drive(&mut original, 37);
    drive(&mut twin, 37);

    // Pause the twin: encode, drop, decode, rebuild.
    let bytes = CheckpointCodec.encode(&twin.checkpoint()).unwrap();
    drop(twin);
    let snapshot = CheckpointCodec.decode(&bytes).unwrap();
    let mut resumed = PholdNode::restore(&snapshot, boundary_slots()).unwrap();

    assert_eq!(resumed.recv_count(), original.recv_count());
    assert_eq!(resumed.rng_state(), original.rng_state());
    assert_eq!(resumed.movement(), original.movement());

    let expected = drive(&mut original, 250);
    let actual = drive(&mut resumed, 250);
    assert_eq!(actual.sends, expected.sends);
    assert_eq!(resumed.recv_count(), original.recv_count());
    assert_eq!(resumed.rng_state(), original.rng_state());
}

#[test]
fn random_constant_resumes_identically() {
    assert_twin_behavior(MovementKind::Random, DelayModel::Constant);
}

#[test]
fn random_exponential_resumes_identically() {
    assert_twin_behavior(
        MovementKind::Random,
        DelayModel::Exponential { multiplier: 1.5 },
    );
}

#[test]
fn cyclic_uniform_resumes_identically() {
    assert_twin_behavior(
        MovementKind::Cyclic,
        DelayModel::Uniform { min: 0.5, max: 2.0 },
    );
}

#[test]
fn cyclic_counter_survives_restore() {
    let cfg = config(MovementKind::Cyclic, DelayModel::Constant);
    let mut node = PholdNode::new(&cfg, LinkSlots::all_present(1).unwrap()).unwrap();
    drive(&mut node, 5);
    assert_eq!(node.movement(), &MovementPolicy::Cyclic { next: 5 });

    let restored = PholdNode::restore(&node.checkpoint(), LinkSlots::all_present(1).unwrap()).unwrap();
    assert_eq!(restored.movement(), &MovementPolicy::Cyclic { next: 5 });
}

#[test]
fn unknown_movement_tag_diverges_with_warning() {
    init_tracing();

    let cfg = config(MovementKind::Cyclic, DelayModel::Constant);
    let mut original = PholdNode::new(&cfg, LinkSlots::all_present(1).unwrap()).unwrap();
    drive(&mut original, 3);

    let mut snapshot = original.checkpoint();
    snapshot.movement.tag = "hilbert".to_string();
    let mut restored = PholdNode::restore(&snapshot, LinkSlots::all_present(1).unwrap()).unwrap();
    assert_eq!(restored.movement(), &MovementPolicy::Random);

    // The fallback draws from the random stream, so the twins drift apart.
    let expected = drive(&mut original, 50);
    let actual = drive(&mut restored, 50);
    assert_ne!(actual.sends, expected.sends);
    assert_ne!(restored.rng_state(), original.rng_state());
}

fn grid_template() -> NodeConfig {
    NodeConfig {
        event_density: 1.5,
        num_rings: 1,
        delay: DelayModel::Exponential { multiplier: 2.0 },
        payload: PayloadConfig {
            small_size: 8,
            large_size: 256,
            large_fraction: 0.1,
        },
        verbose: true,
        ..NodeConfig::at(0, 0, 5, 6)
    }
}

#[test]
fn grid_resume_matches_uninterrupted_run() {
    const LINK_DELAY: u64 = 1_000;
    const HALF: u64 = 200_000;
    const END: u64 = 400_000;

    let template = grid_template();

    let mut straight = GridWorld::new(&template, LINK_DELAY).unwrap();
    straight.setup();
    straight.run_until(END);

    let mut paused = GridWorld::new(&template, LINK_DELAY).unwrap();
    paused.setup();
    paused.run_until(HALF);
    let bytes = serde_json::to_vec(&paused.checkpoint()).unwrap();
    drop(paused);

    let snapshot: WorldSnapshot = serde_json::from_slice(&bytes).unwrap();
    let mut resumed = GridWorld::restore(&template, LINK_DELAY, &snapshot).unwrap();
    resumed.run_until(END);

    assert_eq!(resumed.summaries(), straight.summaries());
    assert_eq!(resumed.events_processed(), straight.events_processed());
    assert_eq!(resumed.pending_event_count(), straight.pending_event_count());
    assert_eq!(resumed.checkpoint(), straight.checkpoint());

    let lines: Vec<String> = resumed.finish().iter().map(ToString::to_string).collect();
    assert_eq!(lines.len(), 30);
    assert_eq!(lines[0].split(':').next(), Some("0,0"));
}
