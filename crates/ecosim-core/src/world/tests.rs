use super::*;
use crate::config::SeedingConfig;
use crate::disease::DiseaseConfig;
use std::collections::HashSet;

/// No seeding and no events: only hand-placed entities.
fn quiet_config(depth: usize, width: usize) -> SimConfig {
    SimConfig {
        depth,
        width,
        seed: 11,
        seeding: SeedingConfig::empty(),
        diseases: Vec::new(),
        weathers: Vec::new(),
        ..SimConfig::default()
    }
}

fn small_world(seed: u64) -> World {
    World::new(SimConfig {
        depth: 24,
        width: 30,
        seed,
        ..SimConfig::default()
    })
}

fn assert_exclusive(world: &World) {
    let mut seen = HashSet::new();
    for &id in &world.live {
        let entity = world.population.get(id).expect("live id has a slot");
        assert!(entity.is_alive());
        assert!(entity.energy() >= 1);
        let loc = entity.location().expect("live entity has a location");
        assert_eq!(world.grid().at(loc), Some(id));
        assert!(seen.insert(id), "entity listed twice");
    }
    assert_eq!(world.grid().occupied().count(), world.live.len());
}

#[test]
fn predator_eats_adjacent_prey() {
    let mut config = quiet_config(10, 10);
    config.kinds.human.food_value = 5;
    let mut world = World::new(config);
    let zombie_at = world.location(4, 4).unwrap();
    let human_at = world.location(4, 5).unwrap();
    let zombie = world
        .spawn_at(Kind::Zombie, zombie_at, 0, 20, Sex::Male)
        .unwrap();
    let human = world
        .spawn_at(Kind::Human, human_at, 0, 10, Sex::Female)
        .unwrap();

    let status = world.step();

    assert_eq!(status.tick, 1);
    assert!(world.entity(human).is_none());
    let zombie = world.entity(zombie).unwrap();
    // One point of hunger, then the meal.
    assert_eq!(zombie.energy(), 20 - 1 + 5);
    assert_eq!(zombie.location(), Some(human_at));
    assert!(world.grid().is_free(zombie_at));
    assert_eq!(world.deaths_last_step, 1);
    assert_eq!(world.live_count(), 1);
}

#[test]
fn sleeping_plant_only_ages_at_night() {
    let mut world = World::new(quiet_config(6, 6));
    for _ in 0..4 {
        world.step();
    }
    assert!(world.is_day());
    let loc = world.location(2, 2).unwrap();
    let grass = world.spawn_at(Kind::Grass, loc, 3, 7, Sex::Female).unwrap();

    let status = world.step();

    assert!(!status.is_day);
    let grass = world.entity(grass).unwrap();
    assert_eq!(grass.age(), 4);
    assert_eq!(grass.energy(), 7);
    assert_eq!(grass.location(), Some(loc));
    assert_eq!(world.live_count(), 1);
}

#[test]
fn released_ids_name_later_spawns() {
    let mut world = World::new(quiet_config(5, 5));
    let starving = world
        .spawn_at(Kind::Human, world.location(0, 0).unwrap(), 0, 1, Sex::Male)
        .unwrap();
    world.step();
    assert!(world.entity(starving).is_none());
    assert_eq!(world.deaths_last_step, 1);

    let dragon = world
        .spawn_at(Kind::Dragon, world.location(4, 4).unwrap(), 0, 40, Sex::Female)
        .unwrap();
    assert_eq!(dragon, starving, "the freed slot is reused");
    let reused = world.entity(starving).unwrap();
    assert_eq!(reused.kind(), Kind::Dragon);
    assert_eq!(world.live_count(), 1);
}

#[test]
fn day_flips_every_day_length_ticks() {
    let mut world = World::new(quiet_config(4, 4));
    let flags: Vec<bool> = (0..12).map(|_| world.step().is_day).collect();
    let expected = [
        true, true, true, true, false, false, false, false, false, true, true, true,
    ];
    assert_eq!(flags, expected);
}

#[test]
fn newborns_wait_for_the_next_tick() {
    let mut config = quiet_config(3, 3);
    config.kinds.grass.breeding_age = 0;
    config.kinds.grass.breeding_probability = 1.0;
    let mut world = World::new(config);
    let center = world.location(1, 1).unwrap();
    let parent = world
        .spawn_at(Kind::Grass, center, 0, 15, Sex::Male)
        .unwrap();

    world.step();

    assert_eq!(world.births_last_step, 2);
    assert_eq!(world.live_count(), 3);
    assert_eq!(world.entity(parent).unwrap().energy(), 14);
    for &id in &world.live[1..] {
        let child = world.entity(id).unwrap();
        assert_eq!(child.age(), 0);
        assert_eq!(child.energy(), 10);
    }
    assert_exclusive(&world);
}

#[test]
fn exclusivity_holds_over_a_long_run() {
    let mut world = small_world(3);
    assert_exclusive(&world);
    for _ in 0..150 {
        world.step();
        assert_exclusive(&world);
    }
    assert_eq!(
        world.population().total,
        world.live_count(),
        "every live entity is visible on the grid"
    );
}

#[test]
fn same_seed_same_history() {
    let mut a = small_world(99);
    let mut b = small_world(99);
    for _ in 0..80 {
        assert_eq!(a.step(), b.step());
        assert!(a.cells().eq(b.cells()));
    }
    assert_eq!(a.total_births, b.total_births);
    assert_eq!(a.total_deaths, b.total_deaths);
}

#[test]
fn different_seeds_diverge() {
    let a = small_world(1);
    let b = small_world(2);
    assert!(!a.cells().eq(b.cells()));
}

#[test]
fn seeding_respects_probabilities() {
    let mut config = quiet_config(10, 10);
    config.seeding.human = 1.0;
    config.seeding.grass = 1.0;
    let world = World::new(config);
    let stats = world.population();
    assert_eq!(stats.count(Kind::Human), 100);
    assert_eq!(stats.count(Kind::Grass), 0);

    let world = World::new(quiet_config(10, 10));
    assert_eq!(world.population().total, 0);
}

#[test]
fn reset_reseeds_and_rewinds() {
    let mut world = small_world(5);
    for _ in 0..30 {
        world.step();
    }
    let status = world.reset();
    assert_eq!(
        status,
        StepStatus {
            tick: 0,
            is_day: true,
            disease: None,
            weather: None,
        }
    );
    assert_eq!(world.tick(), 0);
    assert!(world.live_count() > 0);
    assert_eq!(world.population().total, world.live_count());
    assert_eq!(world.population().infected, 0);
    assert_exclusive(&world);
}

#[test]
fn non_positive_dimensions_use_defaults() {
    let world = World::initialize(0, -5, 1);
    assert_eq!(world.grid().depth(), SimConfig::DEFAULT_DEPTH);
    assert_eq!(world.grid().width(), SimConfig::DEFAULT_WIDTH);
    let world = World::initialize(7, 9, 1);
    assert_eq!((world.grid().depth(), world.grid().width()), (7, 9));
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = SimConfig::default();
    config.day_length = 0;
    let err = World::try_new(config).err().unwrap();
    assert_eq!(err, WorldInitError::Config(SimConfigError::InvalidDayLength));
    assert!(err.source().is_some());

    let config = SimConfig {
        depth: 5000,
        width: 5000,
        ..SimConfig::default()
    };
    assert!(matches!(
        World::try_new(config),
        Err(WorldInitError::TooManyCells { .. })
    ));
}

#[test]
fn finished_outbreak_leaves_no_carriers() {
    let mut ebola = DiseaseConfig::ebola();
    ebola.timing.probability = 1.0;
    ebola.timing.cooldown = 0;
    let mut world = World::new(SimConfig {
        depth: 20,
        width: 20,
        seed: 8,
        diseases: vec![ebola],
        weathers: Vec::new(),
        ..SimConfig::default()
    });

    let first = world.step();
    assert_eq!(first.disease_label(), "Ebola");
    let mut ended = false;
    for _ in 0..40 {
        let status = world.step();
        if status.disease.is_none() {
            assert_eq!(world.population().infected, 0);
            ended = true;
            break;
        }
    }
    assert!(ended, "outbreak outlived its maximum duration");
}

#[test]
fn try_run_samples_on_interval_and_last_step() {
    let mut world = small_world(12);
    let summary = world.try_run(10, 3).unwrap();
    let ticks: Vec<u64> = summary.samples.iter().map(|s| s.tick).collect();
    assert_eq!(ticks, vec![3, 6, 9, 10]);
    assert_eq!(summary.steps, 10);
    assert_eq!(summary.final_population, world.population());
    assert_eq!(summary.total_births, world.total_births);

    assert_eq!(
        world.try_run(5, 0).err(),
        Some(ExperimentError::InvalidSampleEvery)
    );
    assert!(matches!(
        world.try_run(World::MAX_EXPERIMENT_STEPS + 1, 1),
        Err(ExperimentError::TooManySteps { .. })
    ));
}
