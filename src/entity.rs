use serde::{Deserialize, Serialize};

/// Stable handle to an entity. The generation field invalidates stale references.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Kinds of things that live on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Animal,
    Plant,
    Pond,
    Jeep,
    Tourist,
    Ranger,
    Poacher,
}

/// Non-owning reference to an entity in one of the board's arenas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }
}

/// Arena-based storage with generational indices and free list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityArena<T> {
    entities: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
    count: usize,
}

impl<T> Default for EntityArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityArena<T> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            count: 0,
        }
    }

    #[cfg(test)]
    pub fn spawn(&mut self, entity: T) -> EntityId {
        self.spawn_with(|_| entity)
    }

    /// Spawn an entity that needs to know its own id.
    pub fn spawn_with(&mut self, build: impl FnOnce(EntityId) -> T) -> EntityId {
        self.count += 1;
        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            let id = EntityId::new(index, self.generations[idx]);
            self.entities[idx] = Some(build(id));
            id
        } else {
            // Grow the arena
            let index = self.entities.len() as u32;
            let id = EntityId::new(index, 0);
            self.entities.push(Some(build(id)));
            self.generations.push(0);
            id
        }
    }

    /// Remove an entity. Returns None (and does nothing) for stale or already
    /// removed handles, so two systems may race to remove the same entity.
    pub fn despawn(&mut self, id: EntityId) -> Option<T> {
        let idx = id.index as usize;
        if idx < self.entities.len() && self.generations[idx] == id.generation {
            let removed = self.entities[idx].take()?;
            self.generations[idx] += 1;
            self.free_list.push(id.index);
            self.count -= 1;
            Some(removed)
        } else {
            None
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        let idx = id.index as usize;
        if idx < self.entities.len() && self.generations[idx] == id.generation {
            self.entities[idx].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let idx = id.index as usize;
        if idx < self.entities.len() && self.generations[idx] == id.generation {
            self.entities[idx].as_mut()
        } else {
            None
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Get two distinct entities mutably at once.
    pub fn pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut T, &mut T)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let (lo, hi, swapped) = if a.index < b.index {
            (a.index as usize, b.index as usize, false)
        } else {
            (b.index as usize, a.index as usize, true)
        };
        let (head, tail) = self.entities.split_at_mut(hi);
        let first = head[lo].as_mut()?;
        let second = tail[0].as_mut()?;
        if swapped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    /// Iterate over (id, &T) for every live slot.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entities
            .iter()
            .zip(self.generations.iter())
            .enumerate()
            .filter_map(|(i, (slot, gen))| slot.as_ref().map(|e| (EntityId::new(i as u32, *gen), e)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.entities
            .iter_mut()
            .zip(self.generations.iter())
            .enumerate()
            .filter_map(|(i, (slot, gen))| slot.as_mut().map(|e| (EntityId::new(i as u32, *gen), e)))
    }

    /// Snapshot of the live ids, safe to hold while mutating the arena.
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
