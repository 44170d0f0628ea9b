use ecosim_core::config::SimConfig;
use ecosim_core::kind::Kind;
use ecosim_core::world::{PopulationStats, World};
use std::time::{Duration, Instant};

const GRIDS: [(usize, usize); 3] = [(80, 120), (200, 300), (400, 600)];
const STEPS: u32 = 100;

fn describe(stats: &PopulationStats) -> String {
    Kind::ALL
        .iter()
        .map(|&kind| format!("{kind}={}", stats.count(kind)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Time `STEPS` ticks, returning the elapsed time and the ticks that had
/// the fewest and most live entities.
fn time_steps(world: &mut World) -> (Duration, usize, usize) {
    let mut fewest = usize::MAX;
    let mut most = 0;
    let start = Instant::now();
    for _ in 0..STEPS {
        world.step();
        let live = world.live_count();
        fewest = fewest.min(live);
        most = most.max(live);
    }
    (start.elapsed(), fewest, most)
}

fn main() {
    for (depth, width) in GRIDS {
        let mut world = World::new(SimConfig {
            depth,
            width,
            seed: 42,
            ..SimConfig::default()
        });
        let seeded = world.population();
        println!("{depth}x{width}: seeded {} ({})", seeded.total, describe(&seeded));

        let (elapsed, fewest, most) = time_steps(&mut world);
        let per_step = elapsed / STEPS;
        let per_entity_ns = per_step.as_nanos() / most.max(1) as u128;
        println!(
            "  {STEPS} steps in {elapsed:?} ({per_step:?}/step, ~{per_entity_ns} ns per entity at peak)"
        );
        println!(
            "  live range {fewest}..={most}, births {} deaths {}",
            world.total_births(),
            world.total_deaths()
        );
        println!("  final ({})", describe(&world.population()));
    }
}
