use kestrel_particle_worker::protocol::{ParticleUpdate, UpdateRequest};
use kestrel_particle_worker::{Bounds, SimulationEngine, WorkerCommand, WorkerReply};
use std::collections::BTreeSet;

const DELTA_MS: f32 = 16.0;

fn update(engine: &mut SimulationEngine) -> Vec<ParticleUpdate> {
    match engine.handle(WorkerCommand::update_particles(0.0, 0.0, DELTA_MS)) {
        WorkerReply::ParticlesUpdated(updates) => updates,
        other => panic!("unexpected reply: {other:?}"),
    }
}

fn indices(updates: &[ParticleUpdate]) -> Vec<usize> {
    updates.iter().map(|update| update.index).collect()
}

#[test]
fn four_ticks_cover_every_particle() {
    let mut engine = SimulationEngine::with_seed(100);
    assert_eq!(
        engine.handle(WorkerCommand::init_particles(100, Bounds::cube(100.0))),
        WorkerReply::ParticlesInitialized
    );

    let mut seen = BTreeSet::new();
    for tick in 1..=4u64 {
        let updates = update(&mut engine);
        assert_eq!(engine.tick(), tick);
        let touched = indices(&updates);
        if tick % 4 == 0 {
            assert_eq!(touched, (0..100).collect::<Vec<_>>(), "sweep tick lists each index once");
        } else {
            let slice = tick as usize % 4;
            assert_eq!(touched.len(), 25, "slice size is ceil(100 / 4)");
            assert_eq!(touched, (slice * 25..(slice + 1) * 25).collect::<Vec<_>>());
        }
        seen.extend(touched);
    }
    assert_eq!(seen.len(), 100);
}

#[test]
fn uneven_slices_stay_inside_population() {
    let mut engine = SimulationEngine::with_seed(7);
    engine.init_particles(10, &Bounds::cube(100.0));
    // ceil(10 / 4) = 3 -> slices [0,3) [3,6) [6,9) [9,10)
    let expected: [&[usize]; 3] = [&[3, 4, 5], &[6, 7, 8], &[9]];
    for slice in expected {
        assert_eq!(indices(&update(&mut engine)), slice.to_vec());
    }
    assert_eq!(indices(&update(&mut engine)), (0..10).collect::<Vec<_>>());
}

#[test]
fn positions_stay_wrapped_inside_the_box() {
    let mut engine = SimulationEngine::with_seed(55);
    engine.init_particles(64, &Bounds::cube(100.0));
    for _ in 0..4_000 {
        for particle in update(&mut engine) {
            for coordinate in [particle.x, particle.y, particle.z] {
                assert!((-50.0..=50.0).contains(&coordinate), "particle escaped: {particle:?}");
            }
        }
    }
    for particle in engine.store().particles() {
        assert!(particle.position.abs().max_element() <= 50.0);
    }
}

#[test]
fn particles_spawned_outside_the_box_wrap_on_first_touch() {
    let mut engine = SimulationEngine::with_seed(9);
    engine.init_particles(40, &Bounds::cube(300.0));
    for _ in 0..4 {
        update(&mut engine);
    }
    // Tick 4 swept everything, so every particle has been wrapped at least once.
    for particle in engine.store().particles() {
        assert!(particle.position.abs().max_element() <= 50.0, "unwrapped particle: {particle:?}");
    }
}

#[test]
fn slice_zero_advances_half_as_often_as_the_rest() {
    let mut engine = SimulationEngine::with_seed(3);
    engine.init_particles(8, &Bounds::cube(10.0));
    let start: Vec<_> = engine.store().particles().iter().map(|p| p.position).collect();
    for _ in 0..4 {
        engine.update_particles(&UpdateRequest { delta_time: DELTA_MS, ..UpdateRequest::default() });
    }
    // Slice size 2: slice 0 = [0, 2) moved once, the other slices moved twice.
    for (index, particle) in engine.store().particles().iter().enumerate() {
        let steps = if index < 2 { 1.0 } else { 2.0 };
        let expected = start[index] + particle.velocity * steps;
        assert!((particle.position - expected).abs().max_element() < 1e-5, "index {index}");
    }
}
