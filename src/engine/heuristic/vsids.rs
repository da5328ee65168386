//! VSIDS (Variable State Independent Decaying Sum) branching heuristic.
//!
//! Keeps an activity value per variable, bumped for every variable touched during conflict
//! analysis and decayed once per conflict. Unassigned variables are kept in a binary max-heap
//! ordered by activity so the next decision is a constant-time peek.

use ordered_float::OrderedFloat;

use crate::basic_types::KeyedVec;
use crate::basic_types::Var;

#[derive(Debug)]
pub struct Vsids {
    activity: KeyedVec<Var, OrderedFloat<f32>>,
    heap: Vec<Var>,
    position: KeyedVec<Var, Option<usize>>,
    bump: f32,
    inv_decay: f32,
}

impl Default for Vsids {
    fn default() -> Self {
        Vsids {
            activity: KeyedVec::default(),
            heap: Vec::new(),
            position: KeyedVec::default(),
            bump: 1.0,
            inv_decay: 1.0 / 0.95,
        }
    }
}

impl Vsids {
    fn rescale_limit() -> f32 {
        f32::MAX / 16.0
    }

    pub fn set_var_count(&mut self, count: usize) {
        let old_count = self.activity.len();
        self.activity.resize(count, OrderedFloat(0.0));
        self.position.resize(count, None);
        for i in old_count..count {
            self.make_available(Var::from_index(i));
        }
    }

    pub fn set_decay(&mut self, decay: f32) {
        debug_assert!((0.0..1.0).contains(&decay));
        self.inv_decay = 1.0 / decay;
    }

    pub fn bump(&mut self, var: Var) {
        let rescale = {
            let value = &mut self.activity[var];
            value.0 += self.bump;
            value.0 >= Self::rescale_limit()
        };
        if rescale {
            self.rescale();
        }
        if let Some(pos) = self.position[var] {
            self.sift_up(pos);
        }
    }

    pub fn decay(&mut self) {
        self.bump *= self.inv_decay;
        if self.bump >= Self::rescale_limit() {
            self.rescale();
        }
    }

    fn rescale(&mut self) {
        let factor = 1.0 / Self::rescale_limit();
        for value in self.activity.iter_mut() {
            value.0 *= factor;
        }
        self.bump *= factor;
    }

    /// Makes `var` eligible for selection again, e.g. after it is unassigned by backtracking.
    pub fn make_available(&mut self, var: Var) {
        if self.position[var].is_none() {
            let position = self.heap.len();
            self.position[var] = Some(position);
            self.heap.push(var);
            self.sift_up(position);
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        let var = self.heap[pos];
        while pos > 0 {
            let parent_pos = (pos - 1) / 2;
            let parent_var = self.heap[parent_pos];
            if self.activity[parent_var] >= self.activity[var] {
                return;
            }
            self.position[var] = Some(parent_pos);
            self.heap[parent_pos] = var;
            self.position[parent_var] = Some(pos);
            self.heap[pos] = parent_var;
            pos = parent_pos;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let var = self.heap[pos];
        loop {
            let mut largest_pos = pos;
            let mut largest_var = var;

            let left = pos * 2 + 1;
            if left < self.heap.len() && self.activity[largest_var] < self.activity[self.heap[left]] {
                largest_pos = left;
                largest_var = self.heap[left];
            }
            let right = pos * 2 + 2;
            if right < self.heap.len() && self.activity[largest_var] < self.activity[self.heap[right]] {
                largest_pos = right;
                largest_var = self.heap[right];
            }
            if largest_pos == pos {
                return;
            }
            self.position[var] = Some(largest_pos);
            self.heap[largest_pos] = var;
            self.position[largest_var] = Some(pos);
            self.heap[pos] = largest_var;
            pos = largest_pos;
        }
    }

    /// Removes and returns the highest-activity variable, or `None` if all variables are
    /// currently assigned.
    pub fn select(&mut self) -> Option<Var> {
        if self.heap.is_empty() {
            return None;
        }
        let var = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            let top = self.heap[0];
            self.position[top] = Some(0);
            self.sift_down(0);
        }
        self.position[var] = None;
        Some(var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_returns_highest_activity_first() {
        let mut vsids = Vsids::default();
        vsids.set_var_count(4);
        for _ in 0..4 {
            vsids.select();
        }
        for i in 0..4 {
            for _ in 0..i {
                vsids.bump(Var::from_index(i));
            }
            vsids.make_available(Var::from_index(i));
        }
        for i in (0..4).rev() {
            assert_eq!(vsids.select(), Some(Var::from_index(i)));
        }
        assert_eq!(vsids.select(), None);
    }

    #[test]
    fn decay_shrinks_future_bump_effect() {
        let mut vsids = Vsids::default();
        vsids.set_var_count(2);
        vsids.select();
        vsids.select();
        vsids.set_decay(0.5);
        vsids.bump(Var::from_index(0));
        for _ in 0..4 {
            vsids.decay();
        }
        vsids.bump(Var::from_index(1));
        vsids.make_available(Var::from_index(0));
        vsids.make_available(Var::from_index(1));
        assert_eq!(vsids.select(), Some(Var::from_index(1)));
    }
}
