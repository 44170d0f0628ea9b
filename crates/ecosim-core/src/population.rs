use crate::disease::DiseaseId;
use crate::entity::{Entity, EntityId, Sex};
use crate::grid::{Grid, Location};
use crate::kind::{Kind, KindConfig, KindTable};
use rand::Rng;

/// Entity slots plus the grid that references them.
///
/// Every operation that can kill an entity clears its cell in the same call,
/// so a cell never points at a dead entity.
#[derive(Clone, Debug)]
pub struct Population {
    grid: Grid,
    kinds: KindTable,
    slots: Vec<Option<Entity>>,
    free_slots: Vec<u32>,
}

impl Population {
    pub fn new(depth: usize, width: usize, kinds: KindTable) -> Self {
        Self {
            grid: Grid::new(depth, width),
            kinds,
            slots: Vec::new(),
            free_slots: Vec::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self, kind: Kind) -> &KindConfig {
        self.kinds.get(kind)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(Entity::is_alive)
    }

    /// Entity occupying `loc`, if any.
    pub fn occupant(&self, loc: Location) -> Option<(EntityId, &Entity)> {
        let id = self.grid.at(loc)?;
        self.get(id).map(|e| (id, e))
    }

    /// Number of allocated slots, live or awaiting release.
    pub fn slot_count(&self) -> usize {
        self.slots.len() - self.free_slots.len()
    }

    /// Create an entity at an empty cell. Returns `None` if the cell is taken
    /// or `energy` would leave it dead on arrival.
    pub fn spawn(
        &mut self,
        kind: Kind,
        loc: Location,
        age: u32,
        energy: i32,
        sex: Sex,
    ) -> Option<EntityId> {
        if !self.grid.is_free(loc) || energy < 1 {
            return None;
        }
        let energy = energy.min(self.kinds.get(kind).max_energy);
        let entity = Entity::new(kind, loc, age, energy, sex);
        let id = match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(entity);
                EntityId(slot)
            }
            None => {
                let slot = u32::try_from(self.slots.len()).ok()?;
                self.slots.push(Some(entity));
                EntityId(slot)
            }
        };
        self.grid.place(id, loc);
        Some(id)
    }

    /// Age 0, the kind's newborn energy, random sex.
    pub fn spawn_newborn<R: Rng + ?Sized>(
        &mut self,
        kind: Kind,
        loc: Location,
        rng: &mut R,
    ) -> Option<EntityId> {
        let energy = self.kinds.get(kind).newborn_energy;
        let sex = Sex::random(rng);
        self.spawn(kind, loc, 0, energy, sex)
    }

    /// Random age in `[0, max_age)` and energy in `[1, max_energy]`.
    pub fn spawn_seeded<R: Rng + ?Sized>(
        &mut self,
        kind: Kind,
        loc: Location,
        rng: &mut R,
    ) -> Option<EntityId> {
        let cfg = *self.kinds.get(kind);
        let age = rng.random_range(0..cfg.max_age);
        let energy = rng.random_range(1..=cfg.max_energy);
        let sex = Sex::random(rng);
        self.spawn(kind, loc, age, energy, sex)
    }

    /// Mark dead and clear the occupied cell. No-op on an already dead entity.
    pub fn kill(&mut self, id: EntityId) {
        let Some(entity) = self.get_mut(id) else {
            return;
        };
        if let Some(loc) = entity.mark_dead() {
            if self.grid.at(loc) == Some(id) {
                self.grid.clear(loc);
            }
        }
    }

    /// Returns whether the entity is still alive afterwards.
    pub fn change_energy(&mut self, id: EntityId, delta: i32) -> bool {
        let Some(entity) = self.slots.get_mut(id.0 as usize).and_then(Option::as_mut) else {
            return false;
        };
        if !entity.is_alive() {
            return false;
        }
        let cfg = self.kinds.get(entity.kind());
        if entity.shift_energy(delta, cfg) {
            true
        } else {
            self.kill(id);
            false
        }
    }

    /// Returns whether the entity is still alive afterwards.
    pub fn increment_age(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.slots.get_mut(id.0 as usize).and_then(Option::as_mut) else {
            return false;
        };
        if !entity.is_alive() {
            return false;
        }
        let cfg = self.kinds.get(entity.kind());
        if entity.grow_older(cfg) {
            true
        } else {
            self.kill(id);
            false
        }
    }

    /// Move to `to`, clearing the old cell. Any occupant of `to` is dropped
    /// from the grid, so callers only pass cells that are free or whose
    /// occupant was just killed.
    pub fn move_to(&mut self, id: EntityId, to: Location) {
        let Some(entity) = self.get_mut(id) else {
            return;
        };
        let Some(from) = entity.location() else {
            return;
        };
        entity.set_location(to);
        self.grid.clear(from);
        self.grid.place(id, to);
    }

    /// True when a same-kind, opposite-sex, breeding-age entity sits in an
    /// adjacent cell.
    pub fn has_mate<R: Rng + ?Sized>(&self, id: EntityId, rng: &mut R) -> bool {
        let Some(entity) = self.get(id) else {
            return false;
        };
        let Some(loc) = entity.location() else {
            return false;
        };
        let cfg = self.kinds.get(entity.kind());
        let wanted = entity.sex().opposite();
        self.grid.neighbors(loc, 1, rng).into_iter().any(|n| {
            self.occupant(n).is_some_and(|(_, other)| {
                other.kind() == entity.kind() && other.sex() == wanted && other.can_breed(cfg)
            })
        })
    }

    pub fn infect(&mut self, id: EntityId, disease: DiseaseId) {
        if let Some(entity) = self.get_mut(id).filter(|e| e.is_alive()) {
            entity.infect(disease);
        }
    }

    /// Detach `disease` from every carrier on the grid. Returns how many were
    /// cured.
    pub fn cure_all(&mut self, disease: DiseaseId) -> usize {
        let carriers: Vec<EntityId> = self.grid.occupied().map(|(_, id)| id).collect();
        let mut cured = 0;
        for id in carriers {
            if let Some(entity) = self.get_mut(id) {
                if entity.cure(disease) {
                    cured += 1;
                }
            }
        }
        cured
    }

    /// Free the slot of a dead entity so its id can be reused.
    pub fn release(&mut self, id: EntityId) {
        let slot = id.0 as usize;
        if self.slots.get(slot).and_then(Option::as_ref).is_some_and(|e| !e.is_alive()) {
            self.slots[slot] = None;
            self.free_slots.push(id.0);
        }
    }

    pub fn clear(&mut self) {
        self.grid.clear_all();
        self.slots.clear();
        self.free_slots.clear();
    }
}
