use kestrel_particle_worker::protocol::StarUpdate;
use kestrel_particle_worker::{Bounds, SimulationEngine, WorkerCommand, WorkerReply};
use std::collections::HashMap;

const DELTA_MS: f32 = 16.0;

fn update_stars(engine: &mut SimulationEngine, pointer_x: f32, pointer_y: f32) -> Vec<StarUpdate> {
    match engine.handle(WorkerCommand::update_stars(pointer_x, pointer_y, DELTA_MS)) {
        WorkerReply::StarsUpdated(updates) => updates,
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn responses_only_hold_the_active_slice() {
    let mut engine = SimulationEngine::with_seed(30);
    engine.handle(WorkerCommand::init_stars(30, Bounds::cube(100.0)));
    for tick in 1..=12u64 {
        let updates = update_stars(&mut engine, 0.0, 0.0);
        let slice = (tick % 3) as usize;
        let touched: Vec<usize> = updates.iter().map(|update| update.index).collect();
        assert_eq!(touched, (slice * 10..(slice + 1) * 10).collect::<Vec<_>>(), "tick {tick}");
    }
}

#[test]
fn rotation_only_advances_on_even_ticks() {
    let mut engine = SimulationEngine::with_seed(31);
    engine.handle(WorkerCommand::init_stars(30, Bounds::cube(100.0)));
    let mut last_rotation: HashMap<usize, [f32; 3]> = HashMap::new();

    for tick in 1..=6u64 {
        let updates = update_stars(&mut engine, 0.0, 0.0);
        let active = (tick % 3) as usize * 10..(tick % 3) as usize * 10 + 10;
        for index in 0..30 {
            let reported = updates.iter().find(|update| update.index == index);
            if !active.contains(&index) {
                assert!(reported.is_none(), "inactive star {index} reported on tick {tick}");
                continue;
            }
            let update = reported.expect("active star reported");
            let rotation = [update.rotation.x, update.rotation.y, update.rotation.z];
            let before = last_rotation.get(&index).copied().unwrap_or([0.0; 3]);
            if tick % 2 == 0 {
                assert!(
                    rotation.iter().zip(before).all(|(after, before)| *after > before),
                    "star {index} should rotate on even tick {tick}"
                );
            } else {
                assert_eq!(rotation, before, "star {index} should hold rotation on odd tick {tick}");
            }
            last_rotation.insert(index, rotation);
        }
    }
}

#[test]
fn particle_updates_share_the_star_tick_counter() {
    let mut engine = SimulationEngine::with_seed(32);
    engine.init_stars(9, &Bounds::cube(100.0));
    engine.handle(WorkerCommand::update_particles(0.0, 0.0, DELTA_MS));
    // Second command overall -> tick 2 -> slice 2 of ceil(9 / 3) = 3.
    let updates = update_stars(&mut engine, 0.0, 0.0);
    assert_eq!(updates.iter().map(|u| u.index).collect::<Vec<_>>(), vec![6, 7, 8]);
    assert!(updates.iter().all(|u| u.rotation.x > 0.0), "tick 2 is a rotation tick");
}

#[test]
fn far_stars_keep_base_opacity() {
    let mut engine = SimulationEngine::with_seed(33);
    engine.init_stars(3, &Bounds::cube(2.0));
    // Top-left pointer maps to world (-15, 15), far outside the 12 unit radius.
    for _ in 0..3 {
        for update in update_stars(&mut engine, 0.0, 0.0) {
            assert_eq!(update.opacity, 0.6);
        }
    }
}

#[test]
fn stars_near_the_pointer_brighten() {
    let mut engine = SimulationEngine::with_seed(34);
    engine.init_stars(3, &Bounds::cube(2.0));
    // Viewport centre maps to the world origin.
    for _ in 0..3 {
        for update in update_stars(&mut engine, 960.0, 540.0) {
            assert!(update.opacity > 0.6 && update.opacity <= 1.0, "opacity {}", update.opacity);
        }
    }
}

#[test]
fn reported_viewport_changes_pointer_mapping() {
    let mut engine = SimulationEngine::with_seed(35);
    engine.init_stars(3, &Bounds::cube(2.0));
    engine.handle(WorkerCommand::set_viewport(400.0, 200.0));
    // (960, 540) is now far off the right edge of a 400x200 viewport.
    for _ in 0..3 {
        for update in update_stars(&mut engine, 960.0, 540.0) {
            assert_eq!(update.opacity, 0.6);
        }
    }
}

#[test]
fn star_positions_stay_near_origin() {
    let mut engine = SimulationEngine::with_seed(36);
    engine.init_stars(30, &Bounds::cube(100.0));
    let origins: Vec<_> = engine.store().stars().iter().map(|star| star.origin).collect();
    for step in 0..300 {
        let pointer = (step * 7 % 1920) as f32;
        for update in update_stars(&mut engine, pointer, 540.0) {
            let origin = origins[update.index];
            // Vibration amplitude < 0.4 plus pointer push < 0.7 * 1.5.
            assert!((update.x - origin.x).abs() < 1.5);
            assert!((update.y - origin.y).abs() < 1.5);
            assert!((update.z - origin.z).abs() <= 0.2 + 1e-4);
            assert!((0.8 - 1e-4..=1.2 + 1e-4).contains(&update.scale));
        }
    }
}

#[test]
fn same_seed_produces_identical_replies() {
    let run = || {
        let mut engine = SimulationEngine::with_seed(77);
        engine.init_stars(12, &Bounds::cube(40.0));
        (0..9).flat_map(|_| update_stars(&mut engine, 800.0, 400.0)).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
