//! Per-frequency-step solve cache with staleness tracking.
//!
//! Every configuration mutation bumps a generation counter. A cached solve
//! or result is fresh only while its generation matches the current one, so
//! one counter increment invalidates every step at once.

use std::collections::BTreeMap;

use nec_results::ResultKey;
use nec_solver::{CurrentDistribution, FactoredSystem};

/// Whether the solution for a frequency step reflects the latest configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveState {
    Fresh,
    Stale,
}

#[derive(Debug)]
pub(crate) struct CachedSolve {
    pub system: FactoredSystem,
    pub currents: CurrentDistribution,
}

#[derive(Debug, Default)]
pub(crate) struct SolveCache {
    generation: u64,
    solves: BTreeMap<usize, (u64, CachedSolve)>,
    results: BTreeMap<ResultKey, u64>,
}

impl SolveCache {
    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mark every step stale and drop the cached systems.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.solves.clear();
    }

    pub fn state(&self, step: usize) -> SolveState {
        match self.solves.get(&step) {
            Some((generation, _)) if *generation == self.generation => SolveState::Fresh,
            _ => SolveState::Stale,
        }
    }

    pub fn get(&self, step: usize) -> Option<&CachedSolve> {
        match self.solves.get(&step) {
            Some((generation, solve)) if *generation == self.generation => Some(solve),
            _ => None,
        }
    }

    pub fn store(&mut self, step: usize, solve: CachedSolve) {
        self.solves.insert(step, (self.generation, solve));
    }

    pub fn result_is_fresh(&self, key: &ResultKey) -> bool {
        self.results.get(key) == Some(&self.generation)
    }

    pub fn mark_result(&mut self, key: ResultKey) {
        self.results.insert(key, self.generation);
    }

    pub fn clear(&mut self) {
        self.invalidate();
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nec_core::RequestId;

    #[test]
    fn invalidate_makes_results_stale() {
        let mut cache = SolveCache::default();
        let key = ResultKey::new(0, RequestId::from_index(0));
        assert_eq!(cache.state(0), SolveState::Stale);
        assert!(!cache.result_is_fresh(&key));
        cache.mark_result(key);
        assert!(cache.result_is_fresh(&key));
        cache.invalidate();
        assert!(!cache.result_is_fresh(&key));
        assert_eq!(cache.generation(), 1);
    }
}
