use criterion::{criterion_group, criterion_main, Criterion};
use orbgrip::*;
use std::hint::black_box;

const DT: f64 = 1.0 / 60.0;

fn prepare_world(config: SimulationConfig) -> PhysicsWorld {
    let mut world = PhysicsWorld::new(config);
    for i in 0..3 {
        let mut body = Body::new(DVec2::new(i as f64 * 0.9 - 0.9, 2.0 - i as f64 * 0.2));
        body.velocity = DVec2::new(0.5 - i as f64 * 0.4, -1.0);
        let _ = world.add_body(body);
    }
    world
}

fn bench_physics_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("physics_step");
    for (label, config) in [
        ("walls_2d", SimulationConfig::default()),
        (
            "wrap_2d",
            SimulationConfig {
                boundary: BoundaryMode::Wrap,
                ..Default::default()
            },
        ),
        (
            "stack_1d",
            SimulationConfig {
                constrain_to_axis: true,
                ..Default::default()
            },
        ),
    ] {
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut world = prepare_world(config);
                for _ in 0..60 {
                    world.step_physics(black_box(DT));
                }
            })
        });
    }
    group.finish();
}

struct IdentityPlane;

impl PlaneProjector for IdentityPlane {
    fn project(&self, landmark: Landmark) -> Option<DVec2> {
        Some(DVec2::new(
            (landmark.x - 0.5) * 8.0,
            (0.5 - landmark.y) * 8.0,
        ))
    }
}

fn bench_full_update(c: &mut Criterion) {
    use orbgrip::gesture::landmarks::{FINGERTIP_SOURCES, INDEX_MCP, PINKY_MCP, WRIST};

    let mut frame = HandFrame::default();
    frame.landmarks[WRIST] = Landmark::new(0.5, 0.6, 0.0);
    frame.landmarks[INDEX_MCP] = Landmark::new(0.45, 0.45, 0.0);
    frame.landmarks[PINKY_MCP] = Landmark::new(0.55, 0.45, 0.0);
    for (i, (_, tip)) in FINGERTIP_SOURCES.iter().enumerate() {
        frame.landmarks[*tip] = Landmark::new(0.45 + 0.03 * i as f64, 0.4, 0.0);
    }
    let hands = [Some(frame)];

    c.bench_function("full_update_one_hand", |b| {
        b.iter(|| {
            let mut world = prepare_world(SimulationConfig::default());
            for _ in 0..60 {
                world.update(black_box(DT), &hands, &IdentityPlane);
            }
        })
    });
}

criterion_group!(benches, bench_physics_step, bench_full_update);
criterion_main!(benches);
