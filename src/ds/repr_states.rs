use log::debug;

use crate::metric::metric_lp;

/// A bounded, append-only set of representative states
///
/// Continuous states are quantized online: each one is mapped to the closest
/// representative, and a new representative is allocated at its coordinates when
/// it lies at least `min_dist` away from all existing ones. Storage for all
/// `capacity` points is allocated up front and never resized; only the first
/// [`len`](Self::len) are active, and their coordinates never change.
///
/// Once the capacity is exhausted, every state falls back to its nearest existing
/// representative, however far away it is.
#[derive(Debug, Clone)]
pub struct RepresentativeStates {
    coords: Vec<f64>,
    dim: usize,
    capacity: usize,
    len: usize,
    lp_metric: f64,
    scaling: Vec<f64>,
    min_dist: f64,
}

impl RepresentativeStates {
    /// Initialize an empty set
    ///
    /// ### Parameters
    /// - `capacity` - The maximum number of representative states
    /// - `lp_metric` - The exponent `p` of the Lp distance used to compare states
    /// - `scaling` - Per-dimension divisor applied before computing distances, its length is the state dimension
    /// - `min_dist` - Novelty threshold for allocating a new representative
    pub fn new(capacity: usize, lp_metric: f64, scaling: Vec<f64>, min_dist: f64) -> Self {
        let dim = scaling.len();
        Self {
            coords: vec![0.0; capacity * dim],
            dim,
            capacity,
            len: 0,
            lp_metric,
            scaling,
            min_dist,
        }
    }

    /// Number of active representative states
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Coordinates of the active representative `index`
    ///
    /// **Panics** if `index` is not active
    pub fn get(&self, index: usize) -> &[f64] {
        assert!(
            index < self.len,
            "Representative state {} is not active ({} active)",
            index,
            self.len
        );
        &self.coords[index * self.dim..(index + 1) * self.dim]
    }

    /// Iterate over the coordinates of all active representatives
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.coords[..self.len * self.dim].chunks_exact(self.dim.max(1))
    }

    /// Distance between two points under the configured metric
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        metric_lp(a, b, self.lp_metric, &self.scaling)
    }

    /// Distance between two active representatives
    pub fn distance_between(&self, i: usize, j: usize) -> f64 {
        self.distance(self.get(i), self.get(j))
    }

    /// The active representative closest to `state` and its distance
    ///
    /// The lowest index wins ties. Returns `None` when the set is empty.
    pub fn nearest(&self, state: &[f64]) -> Option<(usize, f64)> {
        let mut closest: Option<(usize, f64)> = None;
        for (i, repr) in self.iter().enumerate() {
            let dist = self.distance(state, repr);
            match closest {
                Some((_, d)) if dist >= d => {}
                _ => closest = Some((i, dist)),
            }
        }
        closest
    }

    /// Map `state` to a representative state index
    ///
    /// A new representative is appended at `state` when `allow_create` is set, the
    /// capacity is not exhausted, and the closest existing one is at least `min_dist`
    /// away. Otherwise the closest existing index is returned.
    ///
    /// Returns `None` only if the set is empty and no representative could be created.
    ///
    /// **Panics** if `state` does not have the dimension of the set
    pub fn resolve(&mut self, state: &[f64], allow_create: bool) -> Option<usize> {
        assert_eq!(state.len(), self.dim, "State dimension mismatch");
        let closest = self.nearest(state);
        let dist_to_closest = closest.map_or(f64::INFINITY, |(_, d)| d);

        if allow_create && self.len < self.capacity && dist_to_closest >= self.min_dist {
            let index = self.len;
            self.coords[index * self.dim..(index + 1) * self.dim].copy_from_slice(state);
            self.len += 1;
            debug!("New representative state {} at {:?}", index, state);
            return Some(index);
        }
        closest.map(|(i, _)| i)
    }

    /// Drop all representatives, keeping the allocated storage
    pub fn clear(&mut self) {
        self.coords.fill(0.0);
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn line(capacity: usize, min_dist: f64) -> RepresentativeStates {
        RepresentativeStates::new(capacity, 2.0, vec![1.0], min_dist)
    }

    #[test]
    fn resolve_functional() {
        let mut reprs = line(10, 0.5);
        assert_eq!(reprs.resolve(&[0.1], true), Some(0));
        assert_eq!(reprs.resolve(&[0.6], true), Some(1));
        assert_eq!(reprs.len(), 2, "Two representative states exist");

        assert_eq!(reprs.resolve(&[0.55], true), Some(1), "Maps to the nearest");
        assert_eq!(reprs.len(), 2, "No new representative for a close state");
        assert_eq!(reprs.get(1), &[0.6]);
    }

    #[test]
    fn resolve_without_creation() {
        let mut reprs = line(10, 0.1);
        assert_eq!(reprs.resolve(&[0.3], false), None, "Nothing to map to");

        reprs.resolve(&[0.0], true);
        assert_eq!(reprs.resolve(&[0.9], false), Some(0));
        assert_eq!(reprs.len(), 1);
    }

    #[test]
    fn capacity_fallback() {
        let mut reprs = line(1, 0.1);
        assert_eq!(reprs.resolve(&[0.0], true), Some(0));
        for x in [0.3, 0.7, 1.0, 100.0] {
            assert_eq!(reprs.resolve(&[x], true), Some(0), "Collapses onto the only state");
        }
        assert_eq!(reprs.len(), 1);
    }

    #[test]
    fn nearest_ties_take_lowest_index() {
        let mut reprs = line(10, 0.5);
        reprs.resolve(&[0.0], true);
        reprs.resolve(&[1.0], true);
        assert_eq!(reprs.nearest(&[0.5]), Some((0, 0.5)));
    }

    #[test]
    fn scaled_metric() {
        let mut reprs = RepresentativeStates::new(10, f64::INFINITY, vec![1.0, 10.0], 0.5);
        reprs.resolve(&[0.0, 0.0], true);
        assert_eq!(reprs.resolve(&[0.1, 4.0], true), Some(0), "Second axis is scaled down");
        assert_eq!(reprs.resolve(&[0.1, 6.0], true), Some(1));
        assert_eq!(reprs.distance_between(0, 1), 0.6);
    }

    #[test]
    fn clear_functional() {
        let mut reprs = line(3, 0.1);
        reprs.resolve(&[0.0], true);
        reprs.resolve(&[0.5], true);
        reprs.clear();
        assert!(reprs.is_empty());
        assert_eq!(reprs.iter().count(), 0);
        assert_eq!(reprs.resolve(&[0.5], true), Some(0));
    }

    proptest! {
        #[test]
        fn resolve_stays_within_capacity(
            states in prop::collection::vec((0.0f64..1.0, 0.0f64..1.0), 1..60),
            capacity in 1usize..20,
        ) {
            let mut reprs = RepresentativeStates::new(capacity, 2.0, vec![1.0, 1.0], 0.2);
            for (x, y) in states {
                let before = reprs.len();
                let index = reprs.resolve(&[x, y], true).unwrap();
                let after = reprs.len();
                prop_assert!(index < after);
                prop_assert!(after <= capacity);
                prop_assert!(after - before <= 1);
            }
        }

        #[test]
        fn representatives_are_immutable(
            states in prop::collection::vec(-5.0f64..5.0, 2..40),
        ) {
            let mut reprs = line(8, 0.3);
            reprs.resolve(&[states[0]], true);
            let first = reprs.get(0).to_vec();
            for x in &states[1..] {
                reprs.resolve(&[*x], true);
                prop_assert_eq!(reprs.get(0), first.as_slice());
            }
        }
    }
}
