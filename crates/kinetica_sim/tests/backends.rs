use kinetica_core::{Body, ConfigError, SimConfig};
use kinetica_sim::{BackendKind, SimulationEngine};

/// Build a body with explicit motion state and an explicit radius
/// (overriding the mass-derived one) for precise fixtures.
pub fn body(id: u32, x: f32, y: f32, mass: f32, radius: f32, vx: f32, vy: f32) -> Body {
    let mut body = Body::new(id, x, y, mass);
    body.radius = radius;
    body.vx = vx;
    body.vy = vy;
    body
}

/// Small arena config shared by the fixtures.
pub fn test_config(workers: usize) -> SimConfig {
    SimConfig {
        body_count: 4,
        width: 800.0,
        height: 600.0,
        seed: 42,
        restitution: 0.9,
        workers,
    }
}

/// Engine on `kind` preloaded with `bodies` replacing the spawned set.
pub fn engine_with(kind: BackendKind, config: SimConfig, bodies: Vec<Body>) -> SimulationEngine {
    let mut engine = SimulationEngine::with_backend(config, kind).expect("engine construction");
    engine.set_bodies(bodies).expect("fixture bodies");
    engine
}

/// A spread of collision situations with no body in more than one contact:
/// an intra-cell pair, a cross-cell pair, a heavier off-axis pair, a wall
/// offender and an untouched drifter.
pub fn collision_fixture() -> Vec<Body> {
    vec![
        // Intra-cell pair, the reference values case.
        body(0, 100.0, 100.0, 1.0, 1.0, 2.0, 0.0),
        body(1, 101.5, 100.0, 1.0, 1.0, -1.0, 0.0),
        // Pair straddling the border between cells 0 and 1 of a row.
        body(2, 18.0, 250.0, 1.0, 4.0, 0.5, 0.0),
        body(3, 24.0, 250.0, 1.0, 4.0, -0.5, 0.0),
        // Unequal masses, diagonal contact normal.
        body(4, 400.0, 400.0, 2.0, 3.0, 1.0, 1.0),
        body(5, 403.0, 404.0, 4.0, 3.0, -1.0, 0.0),
        // Out past the right wall, inbound correction expected.
        body(6, 795.0, 520.0, 1.0, 5.0, 50.0, 0.0),
        // Far from everything.
        body(7, 600.0, 80.0, 1.0, 5.0, -20.0, 4.0),
    ]
}

// ==================================================================================
// Backend equivalence
// ==================================================================================

#[test]
fn worker_parallel_matches_sequential() {
    let mut sequential = engine_with(BackendKind::Sequential, test_config(1), collision_fixture());
    let mut parallel = engine_with(BackendKind::WorkerParallel, test_config(2), collision_fixture());

    for _ in 0..3 {
        sequential.step(0.016);
        parallel.step(0.016);
    }

    let expected = sequential.bodies().to_vec();
    let actual = parallel.bodies().to_vec();
    assert_eq!(expected.len(), actual.len());

    for (e, a) in expected.iter().zip(&actual) {
        assert_eq!(e.id, a.id);
        assert!((e.x - a.x).abs() < 1e-5, "body {}: x {} vs {}", e.id, e.x, a.x);
        assert!((e.y - a.y).abs() < 1e-5, "body {}: y {} vs {}", e.id, e.y, a.y);
        assert!((e.vx - a.vx).abs() < 1e-5, "body {}: vx {} vs {}", e.id, e.vx, a.vx);
        assert!((e.vy - a.vy).abs() < 1e-5, "body {}: vy {} vs {}", e.id, e.vy, a.vy);
    }
}

#[test]
fn worker_count_does_not_change_results() {
    let mut two = engine_with(BackendKind::WorkerParallel, test_config(2), collision_fixture());
    let mut five = engine_with(BackendKind::WorkerParallel, test_config(5), collision_fixture());

    two.step(0.016);
    five.step(0.016);

    for (a, b) in two.bodies().to_vec().iter().zip(five.bodies()) {
        assert!((a.x - b.x).abs() < 1e-5);
        assert!((a.vx - b.vx).abs() < 1e-5);
        assert!((a.vy - b.vy).abs() < 1e-5);
    }
}

#[test]
fn gpu_matches_sequential_when_available() {
    let mut gpu = SimulationEngine::with_backend(test_config(1), BackendKind::GpuCompute)
        .expect("engine construction");
    if gpu.backend_name() != "gpu-compute" {
        eprintln!("no GPU adapter available; skipping");
        return;
    }
    gpu.set_bodies(collision_fixture()).expect("fixture bodies");

    let mut sequential = engine_with(BackendKind::Sequential, test_config(1), collision_fixture());

    gpu.step(0.016);
    sequential.step(0.016);

    for (e, a) in sequential.bodies().to_vec().iter().zip(gpu.bodies()) {
        assert!((e.x - a.x).abs() < 1e-3, "body {}: x {} vs {}", e.id, e.x, a.x);
        assert!((e.y - a.y).abs() < 1e-3, "body {}: y {} vs {}", e.id, e.y, a.y);
        assert!((e.vx - a.vx).abs() < 1e-3, "body {}: vx {} vs {}", e.id, e.vx, a.vx);
        assert!((e.vy - a.vy).abs() < 1e-3, "body {}: vy {} vs {}", e.id, e.vy, a.vy);
    }
}

// ==================================================================================
// Engine behavior
// ==================================================================================

#[test]
fn frame_advances_position_by_velocity() {
    let mut engine = engine_with(
        BackendKind::Sequential,
        test_config(1),
        vec![body(0, 10.0, 10.0, 1.0, 5.0, 100.0, 0.0)],
    );

    engine.step(0.016);

    let b = &engine.bodies()[0];
    assert!((b.x - 11.6).abs() < 1e-4, "got {}", b.x);
    assert_eq!(b.y, 10.0);
}

#[test]
fn static_separated_set_is_unchanged_by_stepping() {
    let bodies = vec![
        body(0, 100.0, 100.0, 1.0, 5.0, 0.0, 0.0),
        body(1, 300.0, 200.0, 2.0, 7.5, 0.0, 0.0),
        body(2, 500.0, 400.0, 3.0, 10.0, 0.0, 0.0),
    ];
    let mut engine = engine_with(BackendKind::Sequential, test_config(1), bodies.clone());

    for _ in 0..10 {
        engine.step(0.016);
    }

    assert_eq!(engine.bodies(), bodies.as_slice());
}

#[test]
fn snapshot_preserves_store_order() {
    let mut engine = engine_with(BackendKind::Sequential, test_config(1), collision_fixture());
    let expected: Vec<(f32, f32)> = engine
        .bodies()
        .iter()
        .map(|b| (b.x, b.radius))
        .collect();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), expected.len());
    for (snap, (x, radius)) in snapshot.iter().zip(expected) {
        assert_eq!(snap.x, x);
        assert_eq!(snap.radius, radius);
    }
}

#[test]
fn frame_snapshot_carries_arena_dimensions() {
    let mut engine = engine_with(BackendKind::Sequential, test_config(1), collision_fixture());

    let frame = engine.frame_snapshot();
    assert_eq!(frame.width, 800.0);
    assert_eq!(frame.height, 600.0);
    assert_eq!(frame.bodies.len(), engine.body_count());
}

#[test]
fn spawned_population_matches_config() {
    let config = SimConfig {
        body_count: 123,
        ..test_config(1)
    };
    let mut engine = SimulationEngine::new(config).unwrap();
    assert_eq!(engine.body_count(), 123);
    assert_eq!(engine.backend_name(), "sequential");

    // Same seed, same population.
    let mut again = SimulationEngine::new(SimConfig {
        body_count: 123,
        ..test_config(1)
    })
    .unwrap();
    assert_eq!(engine.bodies(), again.bodies());
}

// ==================================================================================
// Construction and reconfiguration errors
// ==================================================================================

#[test]
fn construction_rejects_invalid_config() {
    let bad_dims = SimConfig {
        width: 0.0,
        ..test_config(1)
    };
    assert!(matches!(
        SimulationEngine::new(bad_dims),
        Err(ConfigError::InvalidDimensions { .. })
    ));

    let bad_restitution = SimConfig {
        restitution: 2.0,
        ..test_config(1)
    };
    assert!(matches!(
        SimulationEngine::new(bad_restitution),
        Err(ConfigError::InvalidRestitution(_))
    ));
}

#[test]
fn bulk_set_rejects_invalid_bodies_and_keeps_state() {
    let mut engine = engine_with(BackendKind::Sequential, test_config(1), collision_fixture());
    let before = engine.bodies().to_vec();

    let mut invalid = body(0, 10.0, 10.0, 1.0, 5.0, 0.0, 0.0);
    invalid.mass = -1.0;
    assert!(matches!(
        engine.set_bodies(vec![invalid]),
        Err(ConfigError::InvalidBody { id: 0, .. })
    ));

    assert_eq!(engine.bodies(), before.as_slice());
}
