use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Stable body identifier with generation tracking. Grips and contact keys
/// hold these as non-owning references; a lookup with a stale generation
/// returns `None` instead of aliasing a recycled slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId {
    index: usize,
    generation: u32,
}

impl BodyId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Generational arena holding the live body set. Iteration is in slot order,
/// which keeps collision resolution order reproducible.
pub struct Arena<T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: VecDeque<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: VecDeque::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> BodyId {
        if let Some(index) = self.free_list.pop_front() {
            let generation = self.generations[index];
            self.items[index] = Some(item);
            return BodyId::new(index, generation);
        }

        let index = self.items.len();
        self.items.push(Some(item));
        self.generations.push(0);
        BodyId::new(index, 0)
    }

    pub fn get(&self, id: BodyId) -> Option<&T> {
        if self.is_valid(id) {
            self.items.get(id.index()).and_then(|slot| slot.as_ref())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut T> {
        if self.is_valid(id) {
            self.items.get_mut(id.index()).and_then(|slot| slot.as_mut())
        } else {
            None
        }
    }

    /// Mutable access to two distinct slots at once; the pair primitive the
    /// contact solver is built on.
    pub fn get2_mut(&mut self, id_a: BodyId, id_b: BodyId) -> Option<(&mut T, &mut T)> {
        if id_a.index() == id_b.index() {
            return None;
        }

        if !self.is_valid(id_a) || !self.is_valid(id_b) {
            return None;
        }

        let (first, second, flipped) = if id_a.index() < id_b.index() {
            (id_a, id_b, false)
        } else {
            (id_b, id_a, true)
        };

        let second_index = second.index();
        if second_index >= self.items.len() {
            return None;
        }

        let (left, right) = self.items.split_at_mut(second_index);
        let first_slot = left.get_mut(first.index()).and_then(|slot| slot.as_mut())?;
        let second_slot = right.get_mut(0).and_then(|slot| slot.as_mut())?;

        if flipped {
            Some((second_slot, first_slot))
        } else {
            Some((first_slot, second_slot))
        }
    }

    pub fn remove(&mut self, id: BodyId) -> Option<T> {
        if !self.is_valid(id) {
            return None;
        }
        let slot = self.items.get_mut(id.index())?;
        if slot.is_some() {
            self.generations[id.index()] = self.generations[id.index()].wrapping_add(1);
            self.free_list.push_back(id.index());
        }
        slot.take()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut().filter_map(|slot| slot.as_mut())
    }

    /// Live ids in ascending slot order.
    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.items.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|_| BodyId::new(index, self.generations[index]))
        })
    }

    pub fn len(&self) -> usize {
        self.items.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_valid(&self, id: BodyId) -> bool {
        self.generations
            .get(id.index())
            .copied()
            .map(|generation| generation == id.generation())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_ids_go_stale() {
        let mut arena = Arena::new();
        let id = arena.insert(7u32);
        assert_eq!(arena.get(id), Some(&7));

        arena.remove(id);
        assert!(arena.get(id).is_none());

        let recycled = arena.insert(9u32);
        assert_eq!(recycled.index(), id.index());
        assert!(arena.get(id).is_none(), "stale generation must not alias");
        assert_eq!(arena.get(recycled), Some(&9));
    }

    #[test]
    fn ids_iterate_in_slot_order() {
        let mut arena = Arena::new();
        let a = arena.insert(0u32);
        let b = arena.insert(1u32);
        let c = arena.insert(2u32);
        let ids: Vec<BodyId> = arena.ids().collect();
        assert_eq!(ids, vec![a, b, c]);
    }
}
