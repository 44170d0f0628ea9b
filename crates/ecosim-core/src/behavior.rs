use crate::disease::Disease;
use crate::entity::EntityId;
use crate::grid::Location;
use crate::kind::{KindConfig, Role};
use crate::population::Population;
use crate::weather::Weather;
use rand::Rng;

/// Energy a predator burns every waking tick.
const HUNGER_PER_TICK: i32 = 1;
/// Energy a plant loses every waking tick without restorative weather.
const WILT_PER_TICK: i32 = 1;

/// Global state an entity consults while acting.
#[derive(Clone, Copy, Debug)]
pub struct TickContext<'a> {
    pub is_day: bool,
    pub disease: Option<&'a Disease>,
    pub weather: Option<&'a Weather>,
}

/// What one entity's action produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActOutcome {
    /// Newborns placed on the grid this tick. They act from the next tick on.
    pub spawned: Vec<EntityId>,
    pub died: bool,
}

/// Run one tick of `id`'s behavior, dispatching on its kind's role.
pub fn act<R: Rng + ?Sized>(
    pop: &mut Population,
    id: EntityId,
    ctx: &TickContext<'_>,
    rng: &mut R,
) -> ActOutcome {
    let Some(kind) = pop.get(id).filter(|e| e.is_alive()).map(|e| e.kind()) else {
        return ActOutcome {
            spawned: Vec::new(),
            died: true,
        };
    };
    let cfg = *pop.config(kind);
    let spawned = match cfg.role {
        Role::Predator { .. } => act_predator(pop, id, &cfg, ctx, rng),
        Role::Plant => act_plant(pop, id, &cfg, ctx, rng),
    };
    ActOutcome {
        spawned,
        died: !pop.is_alive(id),
    }
}

fn asleep(cfg: &KindConfig, ctx: &TickContext<'_>) -> bool {
    cfg.sleeps && !ctx.is_day
}

/// Spread the active disease from `id` if it carries it, then apply the
/// active weather.
fn suffer_events<R: Rng + ?Sized>(
    pop: &mut Population,
    id: EntityId,
    ctx: &TickContext<'_>,
    rng: &mut R,
) {
    if let Some(disease) = ctx.disease {
        if pop.get(id).is_some_and(|e| e.carries(disease.id())) {
            disease.spread(pop, id, rng);
        }
    }
    if let Some(weather) = ctx.weather {
        weather.apply(pop, id);
    }
}

fn act_predator<R: Rng + ?Sized>(
    pop: &mut Population,
    id: EntityId,
    cfg: &KindConfig,
    ctx: &TickContext<'_>,
    rng: &mut R,
) -> Vec<EntityId> {
    if !pop.increment_age(id) || asleep(cfg, ctx) {
        return Vec::new();
    }
    if !pop.change_energy(id, -HUNGER_PER_TICK) {
        return Vec::new();
    }
    suffer_events(pop, id, ctx, rng);
    if !pop.is_alive(id) {
        return Vec::new();
    }

    let births = predator_births(pop, id, cfg, rng);
    let spawned = give_birth(pop, id, births, rng);

    let target = match hunt(pop, id, cfg, rng) {
        Some(prey_cell) => Some(prey_cell),
        None => current_location(pop, id)
            .and_then(|loc| pop.grid().free_neighbors(loc, rng).first().copied()),
    };
    if !pop.is_alive(id) {
        return spawned;
    }
    match target {
        Some(loc) => pop.move_to(id, loc),
        // Boxed in with nothing to eat.
        None => pop.kill(id),
    }
    spawned
}

fn act_plant<R: Rng + ?Sized>(
    pop: &mut Population,
    id: EntityId,
    cfg: &KindConfig,
    ctx: &TickContext<'_>,
    rng: &mut R,
) -> Vec<EntityId> {
    if !pop.increment_age(id) || asleep(cfg, ctx) {
        return Vec::new();
    }
    let births = plant_births(pop, id, cfg, rng);
    let spawned = give_birth(pop, id, births, rng);
    suffer_events(pop, id, ctx, rng);
    if !ctx.weather.is_some_and(Weather::is_restorative) {
        pop.change_energy(id, -WILT_PER_TICK);
    }
    spawned
}

fn current_location(pop: &Population, id: EntityId) -> Option<Location> {
    pop.get(id).and_then(|e| e.location())
}

/// Mate required; on a successful roll, `1..=birth_limit` births.
pub fn predator_births<R: Rng + ?Sized>(
    pop: &Population,
    id: EntityId,
    cfg: &KindConfig,
    rng: &mut R,
) -> u32 {
    let Some(entity) = pop.get(id) else {
        return 0;
    };
    if entity.can_breed(cfg)
        && pop.has_mate(id, rng)
        && rng.random::<f64>() <= cfg.breeding_probability
    {
        rng.random_range(1..=cfg.birth_limit)
    } else {
        0
    }
}

/// No mate needed; on a successful roll, exactly `birth_limit` births.
pub fn plant_births<R: Rng + ?Sized>(
    pop: &Population,
    id: EntityId,
    cfg: &KindConfig,
    rng: &mut R,
) -> u32 {
    let Some(entity) = pop.get(id) else {
        return 0;
    };
    if entity.can_breed(cfg) && rng.random::<f64>() <= cfg.breeding_probability {
        cfg.birth_limit
    } else {
        0
    }
}

/// Place up to `births` newborns of the parent's kind into the free cells
/// around it, one per cell.
pub fn give_birth<R: Rng + ?Sized>(
    pop: &mut Population,
    parent: EntityId,
    births: u32,
    rng: &mut R,
) -> Vec<EntityId> {
    if births == 0 {
        return Vec::new();
    }
    let Some((kind, loc)) = pop
        .get(parent)
        .and_then(|e| e.location().map(|loc| (e.kind(), loc)))
    else {
        return Vec::new();
    };
    let free = pop.grid().free_neighbors(loc, rng);
    free.into_iter()
        .take(births as usize)
        .filter_map(|cell| pop.spawn_newborn(kind, cell, rng))
        .collect()
}

/// Eat the first live prey found among the shuffled neighbors. Returns the
/// cell it occupied.
fn hunt<R: Rng + ?Sized>(
    pop: &mut Population,
    id: EntityId,
    cfg: &KindConfig,
    rng: &mut R,
) -> Option<Location> {
    let loc = current_location(pop, id)?;
    let prey = cfg.prey();
    let (where_, victim, food) = pop.grid().neighbors(loc, 1, rng).into_iter().find_map(|n| {
        let (victim, entity) = pop.occupant(n)?;
        (entity.is_alive() && prey.contains(entity.kind()))
            .then(|| (n, victim, pop.config(entity.kind()).food_value))
    })?;
    pop.kill(victim);
    pop.change_energy(id, food);
    Some(where_)
}
