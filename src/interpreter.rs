use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::{DirectedGraph, Fow, Frc};

/// Translates the raw attributes of the edges of a network into OpenLR attributes.
/// Should be implemented for each network the decoder runs on.
pub trait NetworkInterpreter<A: ?Sized> {
    /// Extracts the Functional Road Class and the Form of Way of an edge.
    /// Returns None if the attributes cannot be interpreted.
    fn extract(&self, attributes: &A) -> Option<(Frc, Fow)>;

    /// Rates in [0, 1] how well the attributes of an edge match the expected FRC and FOW.
    /// Attributes that cannot be interpreted don't match at all.
    fn match_score(&self, attributes: &A, frc: Frc, fow: Fow) -> f64 {
        match self.extract(attributes) {
            Some((actual_frc, actual_fow)) => {
                let frc_score = 1.0 - actual_frc.value().abs_diff(frc.value()) as f64 / 7.0;
                let fow_score = if actual_fow == fow || fow == Fow::Undefined {
                    1.0
                } else {
                    0.0
                };
                0.5 * frc_score + 0.5 * fow_score
            }
            None => 0.0,
        }
    }
}

/// Interpreter of networks whose edges are already attributed with FRC and FOW.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenLrAttributesInterpreter;

impl NetworkInterpreter<(Frc, Fow)> for OpenLrAttributesInterpreter {
    fn extract(&self, &(frc, fow): &(Frc, Fow)) -> Option<(Frc, Fow)> {
        Some((frc, fow))
    }
}

/// Memoizes the match scores of edge types.
///
/// Slots are indexed by edge type, FRC and FOW. The array of slots is replaced as a whole
/// when it needs to grow, so concurrent readers only see fully initialized arrays.
#[derive(Debug)]
pub struct MatchScoreCache {
    slots: RwLock<Arc<[AtomicU64]>>,
}

impl Default for MatchScoreCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchScoreCache {
    /// NaN pattern never produced by a match score.
    const EMPTY: u64 = u64::MAX;
    /// Number of slots of each edge type.
    const SLOTS_PER_TYPE: usize = 64;
    const CAPACITY_INCREMENT: usize = 16 * Self::SLOTS_PER_TYPE;
    /// Edge types beyond this id are not cached.
    const MAX_SLOTS: usize = 1 << 20;

    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Arc::from([])),
        }
    }

    fn slot(type_id: usize, frc: Frc, fow: Fow) -> Option<usize> {
        type_id
            .checked_mul(Self::SLOTS_PER_TYPE)?
            .checked_add(frc.value() as usize * 8 + fow.value() as usize)
            .filter(|&index| index < Self::MAX_SLOTS)
    }

    /// Number of slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn get(&self, type_id: usize, frc: Frc, fow: Fow) -> Option<f64> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let bits = slots.get(Self::slot(type_id, frc, fow)?)?.load(Ordering::Relaxed);
        (bits != Self::EMPTY).then(|| f64::from_bits(bits))
    }

    pub fn insert(&self, type_id: usize, frc: Frc, fow: Fow, score: f64) {
        let Some(index) = Self::slot(type_id, frc, fow) else {
            return;
        };

        {
            // a store under the read lock cannot race with a growth
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(index) {
                slot.store(score.to_bits(), Ordering::Relaxed);
                return;
            }
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if index >= slots.len() {
            let mut capacity = slots.len().max(Self::CAPACITY_INCREMENT);
            while capacity <= index {
                capacity *= 2;
            }
            trace!("Growing match score cache {} -> {capacity}", slots.len());

            let grown: Arc<[AtomicU64]> = (0..capacity)
                .map(|i| {
                    let bits = slots
                        .get(i)
                        .map_or(Self::EMPTY, |slot| slot.load(Ordering::Relaxed));
                    AtomicU64::new(bits)
                })
                .collect();
            *slots = grown;
        }

        if let Some(slot) = slots.get(index) {
            slot.store(score.to_bits(), Ordering::Relaxed);
        }
    }
}

/// Rates network edges against expected OpenLR attributes, through a network interpreter
/// and its match score cache.
#[derive(Debug, Default)]
pub struct EdgeMatcher<I> {
    interpreter: I,
    cache: MatchScoreCache,
}

impl<I> EdgeMatcher<I> {
    pub fn new(interpreter: I) -> Self {
        Self {
            interpreter,
            cache: MatchScoreCache::new(),
        }
    }

    pub const fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub const fn cache(&self) -> &MatchScoreCache {
        &self.cache
    }

    /// Returns the match score of the edge against the expected FRC and FOW.
    /// Edges without a type ID bypass the cache.
    pub fn match_edge<G>(
        &self,
        graph: &G,
        edge: G::EdgeId,
        frc: Frc,
        fow: Fow,
    ) -> Result<f64, G::Error>
    where
        G: DirectedGraph + ?Sized,
        I: NetworkInterpreter<G::EdgeAttributes>,
    {
        let type_id = graph.get_edge_type_id(edge)?;

        if let Some(type_id) = type_id
            && let Some(score) = self.cache.get(type_id, frc, fow)
        {
            return Ok(score);
        }

        let attributes = graph.get_edge_attributes(edge)?;
        let score = self.interpreter.match_score(&attributes, frc, fow);

        if let Some(type_id) = type_id {
            self.cache.insert(type_id, frc, fow, score);
        }

        Ok(score)
    }

    /// Returns the FRC of the edge, None if it cannot be interpreted.
    pub fn edge_frc<G>(&self, graph: &G, edge: G::EdgeId) -> Result<Option<Frc>, G::Error>
    where
        G: DirectedGraph + ?Sized,
        I: NetworkInterpreter<G::EdgeAttributes>,
    {
        let attributes = graph.get_edge_attributes(edge)?;
        Ok(self.interpreter.extract(&attributes).map(|(frc, _)| frc))
    }
}
